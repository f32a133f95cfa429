//! Side effects of menu actions.
//!
//! Each action runs against the shared [`ControllerContext`] and tells the
//! engine whether to stay, go back, or open another page.

use log::{info, warn};

use super::PageId;
use super::transitions::MenuAction;
use crate::app::context::{ControllerContext, Draft};
use crate::app::events::AppEvent;
use crate::calibration::CalibrationStep;
use crate::config::{INTERVAL_MINS_RANGE, Settings, VOLUME_CUPS_RANGE};
use crate::clock::Millis;
use crate::error::WateringError;
use crate::pump::RunOwner;

/// Navigation requested by an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Stay,
    Back,
    Open(PageId),
}

pub fn perform(action: MenuAction, ctx: &mut ControllerContext) -> Nav {
    match action {
        MenuAction::Ignore
        | MenuAction::SelectPrevious
        | MenuAction::SelectNext
        | MenuAction::ActivateItem => Nav::Stay,
        MenuAction::GoBack => go_back(ctx),
        MenuAction::Open(page) => Nav::Open(page),
        MenuAction::AdjustDraft(dir) => {
            adjust_draft(ctx, dir);
            Nav::Stay
        }
        MenuAction::AdjustManualDuration(dir) => {
            adjust_manual_duration(ctx, dir);
            Nav::Stay
        }
        MenuAction::SaveDraft => save_draft(ctx),
        MenuAction::StartManualWatering => start_manual(ctx),
        MenuAction::ToggleAutoMode => toggle_auto_mode(ctx),
        MenuAction::ForceWatering => force_watering(ctx),
        MenuAction::ResetSettings => reset_settings(ctx),
        MenuAction::ClearCalibration => clear_calibration(ctx),
        MenuAction::CalibrationStepDown => calibration_step_down(ctx),
        MenuAction::CalibrationStepUp => calibration_step_up(ctx),
        MenuAction::CalibrationConfirm => calibration_confirm(ctx),
    }
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// Leaving a page never leaves the pump running behind it.
fn go_back(ctx: &mut ControllerContext) -> Nav {
    if ctx.pump.is_active() {
        warn!("Menu: back pressed during a run, stopping pump");
        ctx.emergency_stop();
    }
    Nav::Back
}

// ---------------------------------------------------------------------------
// Edits
// ---------------------------------------------------------------------------

fn adjust_draft(ctx: &mut ControllerContext, dir: i8) {
    let up = dir > 0;
    ctx.draft = match ctx.draft {
        Draft::None => Draft::None,
        Draft::IntervalMins(mins) => {
            let step = ctx.config.interval_step_mins;
            let next = if up {
                mins.saturating_add(step)
            } else {
                mins.saturating_sub(step)
            };
            Draft::IntervalMins(next.clamp(*INTERVAL_MINS_RANGE.start(), *INTERVAL_MINS_RANGE.end()))
        }
        Draft::VolumeCups(cups) => {
            let step = ctx.config.volume_step_cups;
            let next = if up { cups + step } else { cups - step };
            Draft::VolumeCups(next.clamp(*VOLUME_CUPS_RANGE.start(), *VOLUME_CUPS_RANGE.end()))
        }
        Draft::Speed(speed) => Draft::Speed(if up { speed.faster() } else { speed.slower() }),
    };
}

fn adjust_manual_duration(ctx: &mut ControllerContext, dir: i8) {
    let step = ctx.config.manual_step_ms;
    let current = ctx.manual_duration_ms;
    let next = if dir > 0 {
        current.saturating_add(step)
    } else {
        current.saturating_sub(step)
    };
    ctx.manual_duration_ms = next.clamp(step.max(1), ctx.config.max_run_ms);
}

fn save_draft(ctx: &mut ControllerContext) -> Nav {
    match ctx.draft {
        Draft::None => return Nav::Back,
        Draft::IntervalMins(mins) => ctx.update_settings(|s| s.watering_interval_mins = mins),
        Draft::VolumeCups(cups) => ctx.update_settings(|s| s.target_volume_cups = cups),
        Draft::Speed(speed) => ctx.update_settings(|s| s.pump_speed = speed),
    }
    ctx.show_message(("Saved", ""));
    Nav::Back
}

fn reset_settings(ctx: &mut ControllerContext) -> Nav {
    let unit = ctx.settings.unit_duration_ms;
    ctx.update_settings(|s| {
        *s = Settings {
            unit_duration_ms: unit,
            ..Settings::default()
        };
    });
    info!("Settings: reset to defaults (calibration kept)");
    ctx.show_message(("Settings reset", "Calib. kept"));
    Nav::Back
}

// ---------------------------------------------------------------------------
// Watering
// ---------------------------------------------------------------------------

fn start_manual(ctx: &mut ControllerContext) -> Nav {
    let duration = Millis::from(ctx.manual_duration_ms);
    // Refusals are reported by `start_run` itself.
    let _ = ctx.start_run(RunOwner::Manual, duration);
    Nav::Stay
}

fn toggle_auto_mode(ctx: &mut ControllerContext) -> Nav {
    if ctx.settings.auto_mode {
        ctx.update_settings(|s| s.auto_mode = false);
        ctx.show_message(("Auto watering", "disabled"));
        return Nav::Stay;
    }
    if !ctx.calibration.is_calibrated() {
        return redirect_to_calibration(ctx, RunOwner::Auto);
    }
    ctx.update_settings(|s| s.auto_mode = true);
    ctx.show_message(("Auto watering", "enabled"));
    Nav::Stay
}

fn force_watering(ctx: &mut ControllerContext) -> Nav {
    match ctx.force_watering() {
        Err(WateringError::CalibrationMissing) => Nav::Open(PageId::CalibrationTrial),
        _ => Nav::Stay,
    }
}

fn redirect_to_calibration(ctx: &mut ControllerContext, owner: RunOwner) -> Nav {
    let reason = WateringError::CalibrationMissing;
    warn!("Menu: {}, opening calibration", reason);
    ctx.show_error(reason);
    ctx.push_event(AppEvent::WateringRefused { owner, reason });
    Nav::Open(PageId::CalibrationTrial)
}

// ---------------------------------------------------------------------------
// Calibration
// ---------------------------------------------------------------------------

fn clear_calibration(ctx: &mut ControllerContext) -> Nav {
    ctx.calibration.clear();
    ctx.update_settings(|s| {
        s.unit_duration_ms = 0;
        s.auto_mode = false;
    });
    ctx.show_message(("Calibration", "cleared"));
    Nav::Stay
}

fn calibration_step_down(ctx: &mut ControllerContext) -> Nav {
    let step_ms = i64::from(ctx.config.trial_step_ms);
    let Some(session) = ctx.session.as_mut() else {
        return Nav::Stay;
    };
    match session.step() {
        CalibrationStep::SelectDuration => session.adjust(-step_ms),
        CalibrationStep::AwaitVerdict => {
            session.reject();
            ctx.show_message(("Not saved", "Adjust & retry"));
        }
        CalibrationStep::Dispensing => {}
    }
    Nav::Stay
}

fn calibration_step_up(ctx: &mut ControllerContext) -> Nav {
    let step_ms = i64::from(ctx.config.trial_step_ms);
    if let Some(session) = ctx.session.as_mut() {
        session.adjust(step_ms);
    }
    Nav::Stay
}

fn calibration_confirm(ctx: &mut ControllerContext) -> Nav {
    let Some(mut session) = ctx.session else {
        return Nav::Stay;
    };
    match session.step() {
        CalibrationStep::SelectDuration => {
            let Some(trial_ms) = session.begin_dispense() else {
                return Nav::Stay;
            };
            if ctx
                .start_run(RunOwner::Calibration, Millis::from(trial_ms))
                .is_err()
            {
                session.dispense_aborted();
            }
            ctx.session = Some(session);
            Nav::Stay
        }
        CalibrationStep::AwaitVerdict => {
            let Some(unit_ms) = session.accept() else {
                return Nav::Stay;
            };
            ctx.session = Some(session);
            ctx.calibration.commit(unit_ms);
            ctx.update_settings(|s| s.unit_duration_ms = unit_ms);
            ctx.push_event(AppEvent::CalibrationCommitted { unit_ms });
            ctx.show_message(("Calibrated", "Saved"));
            Nav::Back
        }
        CalibrationStep::Dispensing => Nav::Stay,
    }
}
