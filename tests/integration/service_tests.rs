//! Integration tests for the AppService → pump sequencer → actuators
//! pipeline.
//!
//! These run on the host (x86_64) and drive the service tick by tick
//! against mock adapters, checking the actuator call history, emitted
//! events, and what ends up on the display.

use crate::mock_hw::{ActuatorCall, MemoryConfig, Rig};

use plantwater::app::commands::AppCommand;
use plantwater::app::events::AppEvent;
use plantwater::config::{ControllerConfig, PumpSpeed, Settings};
use plantwater::drivers::button::ButtonRole::{Back, Confirm, Decrement, Increment};
use plantwater::error::{SafetyFault, SensorError, WateringError};
use plantwater::menu::PageId;
use plantwater::pump::RunOwner;
use plantwater::scheduler::{Deferral, should_trigger};

const HOUR_MS: u64 = 3_600_000;

fn auto_settings() -> Settings {
    Settings {
        watering_interval_mins: 60,
        target_volume_cups: 1.0,
        pump_speed: PumpSpeed::Mid,
        auto_mode: true,
        unit_duration_ms: 10_000,
    }
}

// ── Scheduled watering ────────────────────────────────────────

#[test]
fn due_and_dry_starts_auto_run() {
    assert!(should_trigger(HOUR_MS + 1, HOUR_MS, 40, 80, false));

    let mut rig = Rig::new(auto_settings(), 0);
    assert!(!rig.app.is_watering());

    rig.clock.set(HOUR_MS + 1);
    rig.step(None);

    assert!(rig.app.is_watering());
    assert_eq!(rig.app.context().pump.owner(), Some(RunOwner::Auto));
    assert_eq!(
        &rig.hw.calls[rig.hw.calls.len() - 2..],
        &[ActuatorCall::Valve(true), ActuatorCall::Pump(0)],
        "valve opens before the pump"
    );
    assert_eq!(rig.row(0), "Watering... 14s");
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::WateringStarted { owner: RunOwner::Auto, duration_ms: 10_000 }
        )),
        1
    );
}

#[test]
fn wet_soil_defers_auto_run() {
    assert!(!should_trigger(HOUR_MS + 1, HOUR_MS, 85, 80, false));

    let mut rig = Rig::new(auto_settings(), 0);
    rig.hw.moisture_percent = 85;
    rig.clock.set(HOUR_MS + 1);
    rig.step(None);

    assert!(!rig.app.is_watering());
    assert!(!rig.hw.valve_open());
    assert_eq!(
        rig.app.context().scheduler.last_deferral(),
        Some(Deferral::SoilWet)
    );
    assert_ne!(rig.app.fault_flags() & SafetyFault::SoilWet.mask(), 0);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::FaultDetected(m) if *m == SafetyFault::SoilWet.mask())),
        1
    );

    // Soil dries out: the overdue run starts on the next tick.
    rig.hw.moisture_percent = 30;
    rig.wait(10);
    assert!(rig.app.is_watering());
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::FaultCleared)), 1);
}

#[test]
fn auto_run_completes_full_sequence() {
    let mut rig = Rig::new(auto_settings(), 0);
    let start = HOUR_MS + 1;
    rig.clock.set(start);
    rig.step(None);

    rig.wait(2_000);
    assert_eq!(rig.hw.pump_duty(), PumpSpeed::Mid.duty());
    assert!(rig.hw.valve_open());

    rig.wait(10_000);
    assert_eq!(rig.hw.pump_duty(), 0);
    assert!(rig.hw.valve_open(), "valve stays open while the line drains");

    rig.wait(2_000);
    assert!(!rig.app.is_watering());
    assert_eq!(rig.hw.calls.last(), Some(&ActuatorCall::AllOff));
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::WateringCompleted { owner: RunOwner::Auto, pumped_ms: 10_000 }
        )),
        1
    );

    let sched = rig.app.context().scheduler.state();
    assert_eq!(sched.last_watered_ms, start + 14_000);
    assert_eq!(sched.next_due_ms, start + 14_000 + HOUR_MS);
}

#[test]
fn disabled_auto_never_runs() {
    let settings = Settings {
        auto_mode: false,
        ..auto_settings()
    };
    let mut rig = Rig::new(settings, 0);
    rig.clock.set(5 * HOUR_MS);
    rig.step(None);
    assert!(!rig.app.is_watering());
    assert_eq!(
        rig.app.context().scheduler.last_deferral(),
        Some(Deferral::Disabled)
    );
}

// ── Emergency stop ────────────────────────────────────────────

fn rig_with_manual_run() -> Rig {
    let mut rig = Rig::calibrated(10_000);
    rig.press_all(&[Increment, Confirm]);
    assert_eq!(rig.app.page(), PageId::ManualWatering);
    rig.press(Confirm);
    assert!(rig.app.is_watering());
    rig.wait(2_000);
    assert_eq!(rig.hw.pump_duty(), PumpSpeed::Mid.duty());
    rig
}

#[test]
fn emergency_stop_mid_run_shuts_everything_off() {
    let mut rig = rig_with_manual_run();

    rig.app
        .handle_command(AppCommand::EmergencyStop, &mut rig.hw, &mut rig.sink);

    assert_eq!(rig.hw.calls.last(), Some(&ActuatorCall::AllOff));
    assert_eq!(rig.hw.pump_duty(), 0);
    assert!(!rig.hw.valve_open());
    assert!(!rig.app.is_watering(), "run-lock released");
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::EmergencyStop { owner: RunOwner::Manual })),
        1
    );

    // The lock is free again.
    rig.wait(3_000);
    rig.press(Confirm);
    assert!(rig.app.is_watering());
}

#[test]
fn back_during_run_stops_pump_in_same_tick() {
    let mut rig = rig_with_manual_run();

    rig.press(Back);

    assert_eq!(rig.app.page(), PageId::Main);
    assert_eq!(rig.hw.pump_duty(), 0);
    assert!(!rig.hw.valve_open());
    assert!(!rig.app.is_watering());
    assert_eq!(rig.row(0), "Watering");
    assert_eq!(rig.row(1), "stopped");
}

/// A scheduled run that has reached the pumping phase.
fn rig_with_auto_run() -> Rig {
    let mut rig = Rig::new(auto_settings(), 0);
    rig.clock.set(HOUR_MS + 1);
    rig.step(None);
    rig.wait(2_000);
    assert_eq!(rig.app.context().pump.owner(), Some(RunOwner::Auto));
    assert_eq!(rig.hw.pump_duty(), PumpSpeed::Mid.duty());
    rig
}

fn auto_starts(rig: &Rig) -> usize {
    rig.sink.count(|e| matches!(e, AppEvent::WateringStarted { owner: RunOwner::Auto, .. }))
}

#[test]
fn back_stops_auto_run_until_next_interval() {
    let mut rig = rig_with_auto_run();
    let stopped_at = HOUR_MS + 1 + 2_000 + 10;

    rig.press(Back);

    assert_eq!(rig.app.page(), PageId::Main);
    assert_eq!(rig.hw.calls.last(), Some(&ActuatorCall::AllOff));
    assert!(!rig.app.is_watering());
    assert_eq!(
        rig.app.context().scheduler.state().next_due_ms,
        stopped_at + HOUR_MS
    );

    rig.wait(10);
    rig.wait(60_000);
    assert!(!rig.app.is_watering());
    assert!(!rig.hw.valve_open());
    assert_eq!(
        rig.app.context().scheduler.last_deferral(),
        Some(Deferral::NotDue)
    );
    assert_eq!(auto_starts(&rig), 1);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::EmergencyStop { owner: RunOwner::Auto })),
        1
    );
}

#[test]
fn stop_command_holds_for_auto_run() {
    let mut rig = rig_with_auto_run();

    rig.app
        .handle_command(AppCommand::EmergencyStop, &mut rig.hw, &mut rig.sink);
    assert_eq!(rig.hw.calls.last(), Some(&ActuatorCall::AllOff));

    rig.wait(10);
    assert!(!rig.app.is_watering());
    assert_eq!(rig.hw.calls.last(), Some(&ActuatorCall::AllOff));
    assert_eq!(auto_starts(&rig), 1);

    // One full interval after the stop the schedule resumes.
    rig.wait(HOUR_MS);
    assert!(rig.app.is_watering());
    assert_eq!(auto_starts(&rig), 2);
}

// ── Faults raised mid-run ─────────────────────────────────────

#[test]
fn water_appearing_mid_run_stops_pump() {
    let mut rig = rig_with_manual_run();
    rig.hw.water_detected = true;

    rig.wait(10);

    assert!(!rig.app.is_watering());
    assert_eq!(rig.hw.calls.last(), Some(&ActuatorCall::AllOff));
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::EmergencyStop { owner: RunOwner::Manual })),
        1
    );
    assert_eq!(rig.row(0), "Water detected");
    assert_eq!(rig.row(1), "Not watering");
}

#[test]
fn sensor_loss_mid_auto_run_stops_and_holds() {
    let mut rig = rig_with_auto_run();
    rig.hw.online = false;

    rig.wait(10);

    assert!(!rig.app.is_watering());
    assert_eq!(rig.hw.calls.last(), Some(&ActuatorCall::AllOff));
    assert_eq!(rig.row(0), "Sensor error");
    assert_eq!(rig.row(1), "No reading");

    rig.hw.online = true;
    rig.wait(10);
    assert!(!rig.app.is_watering(), "recovery does not restart the aborted run");
    assert_eq!(auto_starts(&rig), 1);
}

#[test]
fn soil_turning_wet_mid_run_keeps_watering() {
    let mut rig = rig_with_manual_run();
    rig.hw.moisture_percent = 90;

    rig.wait(10);

    assert!(rig.app.is_watering());
    assert_eq!(rig.hw.pump_duty(), PumpSpeed::Mid.duty());
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::FaultDetected(m) if *m == SafetyFault::SoilWet.mask())),
        1
    );
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::EmergencyStop { .. })), 0);
}

#[test]
fn second_run_is_refused_while_locked() {
    let mut rig = rig_with_manual_run();

    rig.app
        .handle_command(AppCommand::ForceWatering, &mut rig.hw, &mut rig.sink);

    assert_eq!(rig.app.context().pump.owner(), Some(RunOwner::Manual));
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::WateringRefused {
                owner: RunOwner::Auto,
                reason: WateringError::RunLockConflict { holder: RunOwner::Manual },
            }
        )),
        1
    );
}

// ── Gates on manual runs ──────────────────────────────────────

#[test]
fn water_in_saucer_refuses_manual_run() {
    let mut rig = Rig::calibrated(10_000);
    rig.hw.water_detected = true;
    rig.press_all(&[Increment, Confirm, Confirm]);

    assert!(!rig.app.is_watering());
    assert_eq!(rig.row(0), "Water detected");
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::WateringRefused {
                owner: RunOwner::Manual,
                reason: WateringError::SafetyViolation(SafetyFault::WaterDetected),
            }
        )),
        1
    );
}

#[test]
fn missing_sensor_shows_error_and_blocks() {
    let mut rig = Rig::calibrated(10_000);
    rig.hw.online = false;
    rig.wait(10);

    assert_eq!(rig.row(0), "Soil: ERR");
    assert_ne!(rig.app.fault_flags() & SafetyFault::SensorStale.mask(), 0);

    rig.press_all(&[Increment, Confirm, Confirm]);
    assert!(!rig.app.is_watering());
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::WateringRefused {
                reason: WateringError::SensorFault(SensorError::Stale),
                ..
            }
        )),
        1
    );
}

// ── Calibration gating ────────────────────────────────────────

#[test]
fn enabling_auto_without_calibration_enters_wizard() {
    let mut rig = Rig::new(Settings::default(), 1_000);
    rig.press(Confirm);
    assert_eq!(rig.app.page(), PageId::AutoWatering);

    rig.press(Confirm);

    assert_eq!(rig.app.page(), PageId::CalibrationTrial);
    assert!(!rig.app.settings().auto_mode);
    assert!(!rig.app.is_save_pending());
    assert_eq!(rig.row(0), "Calibrate first");
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::WateringRefused {
                owner: RunOwner::Auto,
                reason: WateringError::CalibrationMissing,
            }
        )),
        1
    );
}

#[test]
fn force_without_calibration_enters_wizard() {
    let mut rig = Rig::new(Settings::default(), 1_000);
    rig.press_all(&[Confirm, Decrement]);
    assert_eq!(rig.app.menu().selected_label(), Some("Force Water"));

    rig.press(Confirm);

    assert_eq!(rig.app.page(), PageId::CalibrationTrial);
    assert!(!rig.app.is_watering());
}

#[test]
fn uncalibrated_auto_is_never_loaded() {
    let settings = Settings {
        auto_mode: true,
        unit_duration_ms: 0,
        ..Settings::default()
    };
    let rig = Rig::new(settings, 0);
    assert!(!rig.app.settings().auto_mode);
}

// ── Commands and persistence ──────────────────────────────────

#[test]
fn update_settings_command_rejects_invalid_record() {
    let mut rig = Rig::calibrated(10_000);
    let bad = Settings {
        watering_interval_mins: 5,
        ..rig.app.settings().clone()
    };
    rig.app
        .handle_command(AppCommand::UpdateSettings(bad), &mut rig.hw, &mut rig.sink);
    assert_eq!(rig.app.settings().watering_interval_mins, 60);
    assert!(!rig.app.is_save_pending());
}

#[test]
fn menu_changes_are_flushed_once() {
    let mut rig = Rig::calibrated(10_000);
    let storage = MemoryConfig::default();
    assert!(!rig.app.save_settings_if_requested(&storage, &mut rig.sink));

    rig.press_all(&[Confirm, Confirm]);
    assert!(rig.app.settings().auto_mode);
    assert!(rig.app.is_save_pending());

    assert!(rig.app.save_settings_if_requested(&storage, &mut rig.sink));
    assert_eq!(storage.stored.borrow().as_ref().map(|s| s.auto_mode), Some(true));
    assert!(!rig.app.save_settings_if_requested(&storage, &mut rig.sink));
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::SettingsSaved(_))), 1);
}

#[test]
fn failed_save_is_retried() {
    let mut rig = Rig::calibrated(10_000);
    let storage = MemoryConfig::default();
    storage.fail_writes.set(true);

    rig.press_all(&[Confirm, Confirm]);
    assert!(!rig.app.save_settings_if_requested(&storage, &mut rig.sink));
    assert!(rig.app.is_save_pending());

    storage.fail_writes.set(false);
    assert!(rig.app.save_settings_if_requested(&storage, &mut rig.sink));
    assert!(!rig.app.is_save_pending());
}

// ── Display ───────────────────────────────────────────────────

#[test]
fn idle_screen_is_not_redrawn() {
    let mut rig = Rig::calibrated(10_000);
    assert_eq!(rig.row(0), "Soil: 40%");
    assert_eq!(rig.row(1), "> Auto Watering");
    let redraws = rig.display.redraws;

    rig.wait(10);
    rig.wait(10);
    assert_eq!(rig.display.redraws, redraws);

    rig.hw.moisture_percent = 41;
    rig.wait(10);
    assert_eq!(rig.display.redraws, redraws + 1);
    assert_eq!(rig.row(0), "Soil: 41%");
}

#[test]
fn idle_menu_returns_to_main() {
    let mut rig = Rig::calibrated(10_000);
    rig.press_all(&[Increment, Increment, Confirm]);
    assert_eq!(rig.app.page(), PageId::Settings);

    let timeout = u64::from(ControllerConfig::default().menu_idle_timeout_ms);
    rig.wait(timeout - 1);
    assert_eq!(rig.app.page(), PageId::Settings);
    rig.wait(1);
    assert_eq!(rig.app.page(), PageId::Main);
}

#[test]
fn tick_count_advances() {
    let mut rig = Rig::calibrated(10_000);
    let before = rig.app.tick_count();
    rig.wait(10);
    rig.wait(10);
    assert_eq!(rig.app.tick_count(), before + 2);
}
