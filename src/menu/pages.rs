//! Page descriptors and their enter/exit hooks.
//!
//! ```text
//!  MAIN ─┬─ Auto Watering ── (toggle, force)
//!        ├─ Manual Water
//!        ├─ Settings ─┬─ Water Interval
//!        │            ├─ Water Amount
//!        │            ├─ Pump Speed
//!        │            ├─ Auto Mode
//!        │            └─ Reset Settings
//!        ├─ Calibration ── Start Calibration (trial wizard)
//!        └─ Debug
//! ```
//!
//! Editor pages copy the setting into `ctx.draft` on entry and drop it on
//! exit; nothing is written to the settings record until the draft is
//! saved.

use log::info;

use super::PageId;
use super::transitions::MenuAction;
use crate::app::context::{ControllerContext, Draft};
use crate::calibration::CalibrationSession;
use crate::pump::RunOwner;

/// Signature for `on_enter` and `on_exit` hooks.
pub type PageHookFn = fn(&mut ControllerContext);

/// One entry of a list page.
#[derive(Debug, Clone, Copy)]
pub struct MenuItem {
    pub label: &'static str,
    pub action: MenuAction,
}

const fn item(label: &'static str, action: MenuAction) -> MenuItem {
    MenuItem { label, action }
}

/// Static descriptor for a single page.
pub struct PageDescriptor {
    pub page: PageId,
    pub name: &'static str,
    pub items: &'static [MenuItem],
    pub parent: Option<PageId>,
    pub on_enter: Option<PageHookFn>,
    pub on_exit: Option<PageHookFn>,
}

// ═══════════════════════════════════════════════════════════════════════════
//  Item lists
// ═══════════════════════════════════════════════════════════════════════════

pub const MAIN_ITEMS: &[MenuItem] = &[
    item("Auto Watering", MenuAction::Open(PageId::AutoWatering)),
    item("Manual Water", MenuAction::Open(PageId::ManualWatering)),
    item("Settings", MenuAction::Open(PageId::Settings)),
    item("Calibration", MenuAction::Open(PageId::Calibration)),
    item("Debug", MenuAction::Open(PageId::Debug)),
];

pub const AUTO_ITEMS: &[MenuItem] = &[
    item("Auto Mode", MenuAction::ToggleAutoMode),
    item("Next Watering", MenuAction::Ignore),
    item("Last Watered", MenuAction::Ignore),
    item("Force Water", MenuAction::ForceWatering),
];

pub const SETTINGS_ITEMS: &[MenuItem] = &[
    item("Water Interval", MenuAction::Open(PageId::EditInterval)),
    item("Water Amount", MenuAction::Open(PageId::EditVolume)),
    item("Pump Speed", MenuAction::Open(PageId::EditSpeed)),
    item("Auto Mode", MenuAction::ToggleAutoMode),
    item("Reset Settings", MenuAction::Open(PageId::ResetSettings)),
];

pub const CALIBRATION_ITEMS: &[MenuItem] = &[
    item("Start Calib.", MenuAction::Open(PageId::CalibrationTrial)),
    item("Reset Calib.", MenuAction::ClearCalibration),
    item("View Current", MenuAction::Ignore),
];

pub const DEBUG_ITEMS: &[MenuItem] = &[
    item("Moisture raw", MenuAction::Ignore),
    item("Water raw", MenuAction::Ignore),
    item("Pump / valve", MenuAction::Ignore),
];

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static page table, indexed by `PageId as usize`.
pub fn build_page_table() -> [PageDescriptor; PageId::COUNT] {
    [
        PageDescriptor {
            page: PageId::Main,
            name: "Main",
            items: MAIN_ITEMS,
            parent: None,
            on_enter: None,
            on_exit: None,
        },
        PageDescriptor {
            page: PageId::AutoWatering,
            name: "AutoWatering",
            items: AUTO_ITEMS,
            parent: Some(PageId::Main),
            on_enter: None,
            on_exit: None,
        },
        PageDescriptor {
            page: PageId::ManualWatering,
            name: "ManualWatering",
            items: &[],
            parent: Some(PageId::Main),
            on_enter: None,
            on_exit: None,
        },
        PageDescriptor {
            page: PageId::Settings,
            name: "Settings",
            items: SETTINGS_ITEMS,
            parent: Some(PageId::Main),
            on_enter: None,
            on_exit: None,
        },
        PageDescriptor {
            page: PageId::Calibration,
            name: "Calibration",
            items: CALIBRATION_ITEMS,
            parent: Some(PageId::Main),
            on_enter: None,
            on_exit: None,
        },
        PageDescriptor {
            page: PageId::Debug,
            name: "Debug",
            items: DEBUG_ITEMS,
            parent: Some(PageId::Main),
            on_enter: None,
            on_exit: None,
        },
        PageDescriptor {
            page: PageId::EditInterval,
            name: "EditInterval",
            items: &[],
            parent: Some(PageId::Settings),
            on_enter: Some(edit_interval_enter),
            on_exit: Some(discard_draft),
        },
        PageDescriptor {
            page: PageId::EditVolume,
            name: "EditVolume",
            items: &[],
            parent: Some(PageId::Settings),
            on_enter: Some(edit_volume_enter),
            on_exit: Some(discard_draft),
        },
        PageDescriptor {
            page: PageId::EditSpeed,
            name: "EditSpeed",
            items: &[],
            parent: Some(PageId::Settings),
            on_enter: Some(edit_speed_enter),
            on_exit: Some(discard_draft),
        },
        PageDescriptor {
            page: PageId::ResetSettings,
            name: "ResetSettings",
            items: &[],
            parent: Some(PageId::Settings),
            on_enter: None,
            on_exit: None,
        },
        PageDescriptor {
            page: PageId::CalibrationTrial,
            name: "CalibrationTrial",
            items: &[],
            parent: Some(PageId::Calibration),
            on_enter: Some(trial_enter),
            on_exit: Some(trial_exit),
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Editor hooks
// ═══════════════════════════════════════════════════════════════════════════

fn edit_interval_enter(ctx: &mut ControllerContext) {
    ctx.draft = Draft::IntervalMins(ctx.settings.watering_interval_mins);
}

fn edit_volume_enter(ctx: &mut ControllerContext) {
    ctx.draft = Draft::VolumeCups(ctx.settings.target_volume_cups);
}

fn edit_speed_enter(ctx: &mut ControllerContext) {
    ctx.draft = Draft::Speed(ctx.settings.pump_speed);
}

fn discard_draft(ctx: &mut ControllerContext) {
    ctx.draft = Draft::None;
}

// ═══════════════════════════════════════════════════════════════════════════
//  Calibration trial hooks
// ═══════════════════════════════════════════════════════════════════════════

fn trial_enter(ctx: &mut ControllerContext) {
    // Start from the current unit so recalibration is a small tweak.
    let initial = if ctx.calibration.is_calibrated() {
        ctx.calibration.unit_ms
    } else {
        ctx.config.default_trial_ms
    };
    ctx.session = Some(CalibrationSession::new(
        initial,
        ctx.config.trial_step_ms,
        ctx.config.max_run_ms,
    ));
    info!("Calibration: wizard opened, trial {} ms", initial);
}

fn trial_exit(ctx: &mut ControllerContext) {
    if ctx.pump.is_owned_by(RunOwner::Calibration) {
        ctx.emergency_stop();
    }
    ctx.session = None;
}
