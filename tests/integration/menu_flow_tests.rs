//! End-to-end menu flows: calibration wizard and settings editors.

use crate::mock_hw::Rig;

use plantwater::app::events::AppEvent;
use plantwater::calibration::CalibrationStep;
use plantwater::config::{PumpSpeed, Settings};
use plantwater::drivers::button::ButtonRole::{Back, Confirm, Decrement, Increment};
use plantwater::menu::PageId;
use plantwater::pump::RunOwner;

const SETTLE_MS: u64 = 2_000;
const MESSAGE_MS: u64 = 3_000;

/// Main → Calibration → Start Calib.
fn open_wizard(rig: &mut Rig) {
    rig.press_all(&[Increment, Increment, Increment]);
    assert_eq!(rig.app.menu().selected_label(), Some("Calibration"));
    rig.press(Confirm);
    assert_eq!(rig.app.page(), PageId::Calibration);
    assert_eq!(rig.row(0), "> Start Calib.");
    rig.press(Confirm);
    assert_eq!(rig.app.page(), PageId::CalibrationTrial);
}

fn step(rig: &Rig) -> Option<CalibrationStep> {
    rig.app.context().session.map(|s| s.step())
}

/// Run the trial to completion from `SelectDuration`.
fn dispense(rig: &mut Rig, trial_ms: u64) {
    rig.press(Confirm);
    assert_eq!(step(rig), Some(CalibrationStep::Dispensing));
    assert_eq!(rig.app.context().pump.owner(), Some(RunOwner::Calibration));
    assert_eq!(rig.row(0), "Dispensing...");
    rig.wait(SETTLE_MS);
    assert!(rig.hw.pump_duty() > 0);
    rig.wait(trial_ms);
    assert_eq!(rig.hw.pump_duty(), 0);
    rig.wait(SETTLE_MS);
    assert!(!rig.app.is_watering());
}

// ── Calibration wizard ────────────────────────────────────────

#[test]
fn calibration_wizard_commits_confirmed_trial() {
    let mut rig = Rig::new(Settings::default(), 1_000);
    open_wizard(&mut rig);
    assert_eq!(rig.row(0), "Trial: 20.0s");
    assert_eq!(rig.row(1), "OK=run -/+ adj");

    rig.press(Decrement);
    assert_eq!(rig.row(0), "Trial: 19.5s");

    dispense(&mut rig, 19_500);
    assert_eq!(step(&rig), Some(CalibrationStep::AwaitVerdict));
    assert_eq!(rig.row(0), "1 cup dispensed?");

    rig.press(Confirm);
    assert_eq!(rig.app.page(), PageId::Calibration);
    assert_eq!(rig.app.settings().unit_duration_ms, 19_500);
    assert!(rig.app.context().calibration.is_calibrated());
    assert!(rig.app.context().session.is_none());
    assert!(rig.app.is_save_pending());
    assert_eq!(rig.row(0), "Calibrated");
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::CalibrationCommitted { unit_ms: 19_500 })),
        1
    );

    rig.wait(MESSAGE_MS);
    assert_eq!(rig.row(1), "1 cup = 19.5s");
}

#[test]
fn rejected_trial_loops_back_without_saving() {
    let mut rig = Rig::new(Settings::default(), 1_000);
    open_wizard(&mut rig);
    dispense(&mut rig, 20_000);

    rig.press(Decrement);
    assert_eq!(step(&rig), Some(CalibrationStep::SelectDuration));
    assert_eq!(rig.row(0), "Not saved");
    assert_eq!(rig.app.settings().unit_duration_ms, 0);
    assert!(!rig.app.is_save_pending());

    rig.wait(MESSAGE_MS);
    rig.press(Increment);
    assert_eq!(rig.row(0), "Trial: 20.5s");
}

#[test]
fn back_during_trial_aborts_dispense() {
    let mut rig = Rig::new(Settings::default(), 1_000);
    open_wizard(&mut rig);
    rig.press(Confirm);
    rig.wait(SETTLE_MS);
    assert!(rig.hw.pump_duty() > 0);

    rig.press(Back);

    assert_eq!(rig.app.page(), PageId::Calibration);
    assert_eq!(rig.hw.pump_duty(), 0);
    assert!(!rig.hw.valve_open());
    assert!(rig.app.context().session.is_none());
    assert_eq!(rig.app.settings().unit_duration_ms, 0);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::EmergencyStop { owner: RunOwner::Calibration })),
        1
    );
}

#[test]
fn recalibration_starts_from_current_unit() {
    let mut rig = Rig::calibrated(12_000);
    open_wizard(&mut rig);
    assert_eq!(rig.row(0), "Trial: 12.0s");
}

#[test]
fn clearing_calibration_disables_auto() {
    let settings = Settings {
        auto_mode: true,
        unit_duration_ms: 12_000,
        ..Settings::default()
    };
    let mut rig = Rig::new(settings, 1_000);
    rig.press_all(&[Increment, Increment, Increment, Confirm, Increment]);
    assert_eq!(rig.app.menu().selected_label(), Some("Reset Calib."));

    rig.press(Confirm);

    assert!(!rig.app.context().calibration.is_calibrated());
    assert_eq!(rig.app.settings().unit_duration_ms, 0);
    assert!(!rig.app.settings().auto_mode);
}

// ── Settings editors ──────────────────────────────────────────

/// Main → Settings.
fn open_settings(rig: &mut Rig) {
    rig.press_all(&[Increment, Increment, Confirm]);
    assert_eq!(rig.app.page(), PageId::Settings);
}

#[test]
fn interval_edit_saves_on_confirm() {
    let mut rig = Rig::calibrated(10_000);
    open_settings(&mut rig);
    rig.press(Confirm);
    assert_eq!(rig.app.page(), PageId::EditInterval);
    assert_eq!(rig.row(0), "Water Interval");
    assert_eq!(rig.row(1), "< 60 min >");

    rig.press_all(&[Increment, Increment]);
    assert_eq!(rig.row(1), "< 180 min >");
    assert_eq!(rig.app.settings().watering_interval_mins, 60, "draft only");

    rig.press(Confirm);
    assert_eq!(rig.app.page(), PageId::Settings);
    assert_eq!(rig.app.settings().watering_interval_mins, 180);
    assert_eq!(rig.app.context().scheduler.state().interval_ms, 180 * 60_000);
    assert!(rig.app.is_save_pending());
    assert_eq!(rig.row(0), "Saved");

    rig.wait(MESSAGE_MS);
    assert_eq!(rig.row(0), "> Water Interval");
    assert_eq!(rig.row(1), "180 min");
}

#[test]
fn back_discards_draft() {
    let mut rig = Rig::calibrated(10_000);
    open_settings(&mut rig);
    rig.press_all(&[Increment, Confirm]);
    assert_eq!(rig.row(1), "< 1.00 cups >");

    rig.press(Increment);
    assert_eq!(rig.row(1), "< 1.25 cups >");
    rig.press(Back);

    assert_eq!(rig.app.page(), PageId::Settings);
    assert_eq!(rig.app.menu().selected_label(), Some("Water Amount"));
    assert!((rig.app.settings().target_volume_cups - 1.0).abs() < f32::EPSILON);
    assert!(!rig.app.is_save_pending());
}

#[test]
fn speed_edit_saturates_at_high() {
    let mut rig = Rig::calibrated(10_000);
    open_settings(&mut rig);
    rig.press_all(&[Increment, Increment, Confirm]);
    assert_eq!(rig.row(1), "< MID >");

    rig.press_all(&[Increment, Increment, Increment]);
    assert_eq!(rig.row(1), "< HIGH >");
    rig.press(Confirm);
    assert_eq!(rig.app.settings().pump_speed, PumpSpeed::High);
}

#[test]
fn reset_settings_keeps_calibration() {
    let settings = Settings {
        watering_interval_mins: 240,
        target_volume_cups: 3.0,
        pump_speed: PumpSpeed::Low,
        auto_mode: true,
        unit_duration_ms: 8_000,
    };
    let mut rig = Rig::new(settings, 1_000);
    open_settings(&mut rig);
    rig.press(Decrement);
    assert_eq!(rig.app.menu().selected_label(), Some("Reset Settings"));
    rig.press(Confirm);
    assert_eq!(rig.row(0), "Reset settings?");

    rig.press(Confirm);

    assert_eq!(rig.app.page(), PageId::Settings);
    let expected = Settings {
        unit_duration_ms: 8_000,
        ..Settings::default()
    };
    assert_eq!(rig.app.settings(), &expected);
    assert!(rig.app.is_save_pending());
}

#[test]
fn auto_mode_toggles_from_settings() {
    let mut rig = Rig::calibrated(10_000);
    open_settings(&mut rig);
    rig.press_all(&[Increment, Increment, Increment]);
    assert_eq!(rig.app.menu().selected_label(), Some("Auto Mode"));
    assert_eq!(rig.row(1), "OFF");

    rig.press(Confirm);
    assert_eq!(rig.app.page(), PageId::Settings);
    assert!(rig.app.settings().auto_mode);
    assert!(rig.app.context().scheduler.state().auto_enabled);
    assert!(rig.app.is_save_pending());
    assert_eq!(rig.row(0), "Auto watering");

    rig.wait(MESSAGE_MS);
    assert_eq!(rig.row(0), "> Auto Mode");
    assert_eq!(rig.row(1), "ON");
}

#[test]
fn auto_mode_in_settings_needs_calibration() {
    let mut rig = Rig::new(Settings::default(), 1_000);
    open_settings(&mut rig);
    rig.press_all(&[Decrement, Decrement, Confirm]);

    assert_eq!(rig.app.page(), PageId::CalibrationTrial);
    assert!(!rig.app.settings().auto_mode);
}

#[test]
fn manual_duration_adjusts_in_steps() {
    let mut rig = Rig::calibrated(10_000);
    rig.press_all(&[Increment, Confirm]);
    assert_eq!(rig.row(0), "Manual: 20s");
    assert_eq!(rig.row(1), "OK=start -/+ adj");

    rig.press(Increment);
    assert_eq!(rig.row(0), "Manual: 25s");
    for _ in 0..10 {
        rig.press(Decrement);
    }
    assert_eq!(rig.row(0), "Manual: 5s");
}
