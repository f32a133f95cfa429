//! Screen composition for the 16x2 character display.
//!
//! Each tick the service composes a [`Frame`] from the menu position and
//! the context, and [`Renderer::draw`] pushes it to the
//! [`DisplayPort`] only when it differs from what is already on screen.
//! Lines longer than the display are truncated, never wrapped.

use core::fmt::{self, Write};

use heapless::String;

use crate::app::context::{ControllerContext, Draft};
use crate::app::ports::DisplayPort;
use crate::calibration::CalibrationStep;
use crate::clock::{Compact, MS_PER_SEC};
use crate::error::SafetyFault;
use crate::menu::{MenuStateMachine, PageId};
use crate::pump::RunOwner;

pub const COLS: usize = 16;
pub const ROWS: usize = 2;

pub type Line = String<COLS>;

/// The full display contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub rows: [Line; ROWS],
}

impl Frame {
    fn set(&mut self, row: usize, args: fmt::Arguments<'_>) {
        let line = &mut self.rows[row];
        line.clear();
        // Truncating writer never fails.
        let _ = Truncate(line).write_fmt(args);
    }

    pub fn row(&self, row: usize) -> &str {
        self.rows[row].as_str()
    }
}

/// `fmt::Write` adapter that silently drops what does not fit.
struct Truncate<'a>(&'a mut Line);

impl Write for Truncate<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct Renderer {
    shown: Option<Frame>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw `frame` if it differs from the last one drawn.  Returns whether
    /// the display was touched.
    pub fn draw(&mut self, frame: Frame, display: &mut impl DisplayPort) -> bool {
        if self.shown.as_ref() == Some(&frame) {
            return false;
        }
        display.clear();
        for (row, line) in frame.rows.iter().enumerate() {
            display.set_cursor(0, row as u8);
            display.print(line);
        }
        self.shown = Some(frame);
        true
    }
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// What the screen should show right now.  A status message overrides the
/// page until it expires.
pub fn compose(menu: &MenuStateMachine, ctx: &ControllerContext) -> Frame {
    let mut f = Frame::default();
    if let Some((top, bottom)) = ctx.active_message() {
        f.set(0, format_args!("{top}"));
        f.set(1, format_args!("{bottom}"));
        return f;
    }

    let selection = menu.node().selection;
    match menu.page() {
        PageId::Main => {
            main_status(&mut f, ctx);
            f.set(1, format_args!("> {}", menu.selected_label().unwrap_or("")));
        }
        PageId::AutoWatering
        | PageId::Settings
        | PageId::Calibration
        | PageId::Debug => {
            f.set(0, format_args!("> {}", menu.selected_label().unwrap_or("")));
            item_detail(&mut f, menu.page(), selection, ctx);
        }
        PageId::ManualWatering => manual(&mut f, ctx),
        PageId::EditInterval => {
            f.set(0, format_args!("Water Interval"));
            if let Draft::IntervalMins(mins) = ctx.draft {
                f.set(1, format_args!("< {mins} min >"));
            }
        }
        PageId::EditVolume => {
            f.set(0, format_args!("Water Amount"));
            if let Draft::VolumeCups(cups) = ctx.draft {
                f.set(1, format_args!("< {cups:.2} cups >"));
            }
        }
        PageId::EditSpeed => {
            f.set(0, format_args!("Pump Speed"));
            if let Draft::Speed(speed) = ctx.draft {
                f.set(1, format_args!("< {speed} >"));
            }
        }
        PageId::ResetSettings => {
            f.set(0, format_args!("Reset settings?"));
            f.set(1, format_args!("OK=yes Back=no"));
        }
        PageId::CalibrationTrial => trial(&mut f, ctx),
    }
    f
}

fn main_status(f: &mut Frame, ctx: &ControllerContext) {
    if ctx.pump.is_active() {
        f.set(
            0,
            format_args!("Watering... {}", Compact(ctx.pump.remaining_ms(ctx.now_ms))),
        );
        return;
    }

    let soil: Line = match ctx.sensors {
        _ if !ctx.verdict.sensors_healthy() => line(format_args!("ERR")),
        Some(s) if s.water_detected => line(format_args!("{}% H2O", s.moisture_percent)),
        Some(s) => line(format_args!("{}%", s.moisture_percent)),
        None => line(format_args!("--")),
    };
    match ctx.date_time {
        Some(dt) => f.set(0, format_args!("{dt} {soil}")),
        None => f.set(0, format_args!("Soil: {soil}")),
    }
}

fn item_detail(f: &mut Frame, page: PageId, selection: usize, ctx: &ControllerContext) {
    let now = ctx.now_ms;
    let unit_ms = ctx.calibration.unit_ms;
    match (page, selection) {
        (PageId::AutoWatering, 0) => {
            f.set(1, format_args!("{}", if ctx.settings.auto_mode { "ON" } else { "OFF" }));
        }
        (PageId::AutoWatering, 1) if ctx.settings.auto_mode => {
            f.set(1, format_args!("in {}", Compact(ctx.scheduler.time_until_next(now))));
        }
        (PageId::AutoWatering, 1) => f.set(1, format_args!("Auto is off")),
        (PageId::AutoWatering, 2) => {
            f.set(1, format_args!("{} ago", Compact(ctx.scheduler.time_since_last(now))));
        }
        (PageId::AutoWatering, 3) if ctx.pump.is_owned_by(RunOwner::Auto) => {
            f.set(1, format_args!("Watering..."));
        }
        (PageId::AutoWatering, 3) => {
            f.set(1, format_args!("{:.2} cups", ctx.settings.target_volume_cups));
        }

        (PageId::Settings, 0) => {
            f.set(1, format_args!("{} min", ctx.settings.watering_interval_mins));
        }
        (PageId::Settings, 1) => {
            f.set(1, format_args!("{:.2} cups", ctx.settings.target_volume_cups));
        }
        (PageId::Settings, 2) => f.set(1, format_args!("{}", ctx.settings.pump_speed)),
        (PageId::Settings, 3) => {
            f.set(1, format_args!("{}", if ctx.settings.auto_mode { "ON" } else { "OFF" }));
        }
        (PageId::Settings, 4) => f.set(1, format_args!("Calib. is kept")),

        (PageId::Calibration, _) if unit_ms == 0 => f.set(1, format_args!("Not calibrated")),
        (PageId::Calibration, 1) => f.set(1, format_args!("OK to clear")),
        (PageId::Calibration, _) => {
            let secs = unit_ms as f32 / MS_PER_SEC as f32;
            f.set(1, format_args!("1 cup = {secs:.1}s"));
        }

        (PageId::Debug, 0) if ctx.verdict.has(SafetyFault::SensorOutOfRange) => match ctx.sensors {
            Some(s) => f.set(1, format_args!("{} RANGE", s.moisture_raw)),
            None => f.set(1, format_args!("no sample")),
        },
        (PageId::Debug, 0) => match ctx.sensors {
            Some(s) => f.set(1, format_args!("{} ({}%)", s.moisture_raw, s.moisture_percent)),
            None => f.set(1, format_args!("no sample")),
        },
        (PageId::Debug, 1) => match ctx.sensors {
            Some(s) => f.set(
                1,
                format_args!("{}{}", s.water_raw, if s.water_detected { " WATER" } else { "" }),
            ),
            None => f.set(1, format_args!("no sample")),
        },
        (PageId::Debug, _) => {
            let cmds = ctx.pump.commands();
            f.set(
                1,
                format_args!(
                    "P:{} V:{}",
                    if cmds.pump_duty > 0 { "ON" } else { "OFF" },
                    if cmds.valve_open { "OPEN" } else { "SHUT" }
                ),
            );
        }

        _ => {}
    }
}

fn manual(f: &mut Frame, ctx: &ControllerContext) {
    f.set(0, format_args!("Manual: {}", Compact(u64::from(ctx.manual_duration_ms))));
    if ctx.pump.is_owned_by(RunOwner::Manual) {
        f.set(
            1,
            format_args!("Run {} Back=stop", Compact(ctx.pump.remaining_ms(ctx.now_ms))),
        );
    } else {
        f.set(1, format_args!("OK=start -/+ adj"));
    }
}

fn trial(f: &mut Frame, ctx: &ControllerContext) {
    let Some(session) = ctx.session else {
        f.set(0, format_args!("Calibration"));
        return;
    };
    match session.step() {
        CalibrationStep::SelectDuration => {
            let secs = session.trial_ms() as f32 / MS_PER_SEC as f32;
            f.set(0, format_args!("Trial: {secs:.1}s"));
            f.set(1, format_args!("OK=run -/+ adj"));
        }
        CalibrationStep::Dispensing => {
            f.set(0, format_args!("Dispensing..."));
            f.set(
                1,
                format_args!("{} Back=stop", Compact(ctx.pump.remaining_ms(ctx.now_ms))),
            );
        }
        CalibrationStep::AwaitVerdict => {
            f.set(0, format_args!("1 cup dispensed?"));
            f.set(1, format_args!("OK=yes -=retry"));
        }
    }
}

fn line(args: fmt::Arguments<'_>) -> Line {
    let mut l = Line::new();
    let _ = Truncate(&mut l).write_fmt(args);
    l
}
