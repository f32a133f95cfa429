//! Automatic watering scheduler.
//!
//! Re-evaluated every control tick, whatever page the menu is showing.
//! A run is triggered by the conjunction of three conditions:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Trigger sources                         │
//! │                                                              │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐      │
//! │  │ TimeTrigger  │   │ MoistureGate │   │ SafetyGate   │      │
//! │  │ now - last   │   │ moisture %   │   │ no water     │      │
//! │  │  >= interval │   │  < wet thr.  │   │  detected    │      │
//! │  └──────┬───────┘   └──────┬───────┘   └──────┬───────┘      │
//! │         └────────── AND ───┴────────── AND ───┘              │
//! │                            │                                 │
//! │          auto on · sensors healthy · calibrated · lock free  │
//! │                            ▼                                 │
//! │              PumpActuator::try_start(Auto, derive(volume))   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Failed conditions defer silently until the next tick.  There is no
//! backoff and no retry budget; the deferral reason is logged once each
//! time it changes.

use log::{debug, info, warn};

use crate::calibration::CalibrationRecord;
use crate::clock::{Millis, elapsed};
use crate::config::{PumpSpeed, Settings};
use crate::error::{SafetyFault, WateringError};
use crate::pump::{PumpActuator, RunOwner};
use crate::safety::SafetyVerdict;

// ═══════════════════════════════════════════════════════════════
//  Trigger predicate
// ═══════════════════════════════════════════════════════════════

/// The raw trigger conjunction: `E >= I && M < wet && !W`.
pub fn should_trigger(
    elapsed_ms: Millis,
    interval_ms: Millis,
    moisture_percent: u8,
    wet_threshold_percent: u8,
    water_detected: bool,
) -> bool {
    elapsed_ms >= interval_ms && moisture_percent < wet_threshold_percent && !water_detected
}

// ═══════════════════════════════════════════════════════════════
//  Schedule state
// ═══════════════════════════════════════════════════════════════

/// Live schedule.  `next_due_ms == last_watered_ms + interval_ms` always.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleState {
    pub interval_ms: Millis,
    pub last_watered_ms: Millis,
    pub next_due_ms: Millis,
    pub target_volume_cups: f32,
    pub auto_enabled: bool,
}

/// Why the scheduler did not start a run this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferral {
    Disabled,
    NotDue,
    SensorFault,
    SoilWet,
    WaterDetected,
    Uncalibrated,
    PumpBusy,
}

impl core::fmt::Display for Deferral {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Disabled => write!(f, "auto mode off"),
            Self::NotDue => write!(f, "not due"),
            Self::SensorFault => write!(f, "sensor fault"),
            Self::SoilWet => write!(f, "soil already wet"),
            Self::WaterDetected => write!(f, "water detected"),
            Self::Uncalibrated => write!(f, "not calibrated"),
            Self::PumpBusy => write!(f, "pump busy"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

pub struct WateringScheduler {
    state: ScheduleState,
    last_deferral: Option<Deferral>,
}

impl WateringScheduler {
    /// The interval starts counting at power-on.
    pub fn new(settings: &Settings, now: Millis) -> Self {
        let interval_ms = settings.interval_ms();
        Self {
            state: ScheduleState {
                interval_ms,
                last_watered_ms: now,
                next_due_ms: now + interval_ms,
                target_volume_cups: settings.target_volume_cups,
                auto_enabled: settings.auto_mode,
            },
            last_deferral: None,
        }
    }

    /// Apply edited settings.  Turning auto mode on restarts the interval.
    pub fn configure(&mut self, settings: &Settings, now: Millis) {
        let s = &mut self.state;
        if settings.auto_mode && !s.auto_enabled {
            s.last_watered_ms = now;
        }
        s.interval_ms = settings.interval_ms();
        s.target_volume_cups = settings.target_volume_cups;
        s.auto_enabled = settings.auto_mode;
        s.next_due_ms = s.last_watered_ms + s.interval_ms;
        info!(
            "Scheduler: auto={} every {} min, {} cups",
            s.auto_enabled, settings.watering_interval_mins, s.target_volume_cups
        );
    }

    /// Decide without side effects.  `Ok` carries the derived run duration.
    pub fn evaluate(
        &self,
        now: Millis,
        verdict: SafetyVerdict,
        calibration: &CalibrationRecord,
        pump_busy: bool,
    ) -> Result<Millis, Deferral> {
        let s = &self.state;
        if !s.auto_enabled {
            return Err(Deferral::Disabled);
        }
        if elapsed(now, s.last_watered_ms) < s.interval_ms {
            return Err(Deferral::NotDue);
        }
        if !verdict.sensors_healthy() {
            return Err(Deferral::SensorFault);
        }
        if verdict.has(SafetyFault::SoilWet) {
            return Err(Deferral::SoilWet);
        }
        if verdict.has(SafetyFault::WaterDetected) {
            return Err(Deferral::WaterDetected);
        }
        let duration = calibration
            .derive(s.target_volume_cups)
            .map_err(|_| Deferral::Uncalibrated)?;
        if pump_busy {
            return Err(Deferral::PumpBusy);
        }
        Ok(duration)
    }

    /// Evaluate and, if everything holds, start an `Auto` run.
    /// Returns the started run's duration.
    pub fn tick(
        &mut self,
        now: Millis,
        verdict: SafetyVerdict,
        calibration: &CalibrationRecord,
        pump: &mut PumpActuator,
        speed: PumpSpeed,
    ) -> Option<Millis> {
        match self.evaluate(now, verdict, calibration, pump.is_active()) {
            Ok(duration) => match pump.try_start(RunOwner::Auto, speed, duration, verdict, now) {
                Ok(()) => {
                    info!(
                        "Scheduler: watering due, {} cups for {} ms",
                        self.state.target_volume_cups, duration
                    );
                    self.last_deferral = None;
                    Some(duration)
                }
                Err(e) => {
                    warn!("Scheduler: run refused by actuator ({})", e);
                    self.note_deferral(Deferral::PumpBusy);
                    None
                }
            },
            Err(reason) => {
                self.note_deferral(reason);
                None
            }
        }
    }

    /// Immediate volume-based run, bypassing only the time trigger.
    pub fn force(
        &mut self,
        now: Millis,
        verdict: SafetyVerdict,
        calibration: &CalibrationRecord,
        pump: &mut PumpActuator,
        speed: PumpSpeed,
    ) -> Result<Millis, WateringError> {
        let duration = calibration.derive(self.state.target_volume_cups)?;
        pump.try_start(RunOwner::Auto, speed, duration, verdict, now)?;
        info!("Scheduler: forced watering for {} ms", duration);
        Ok(duration)
    }

    /// Record a completed volume-based run.
    pub fn mark_watered(&mut self, now: Millis) {
        self.state.last_watered_ms = now;
        self.state.next_due_ms = now + self.state.interval_ms;
        info!(
            "Scheduler: watered at {} ms, next due at {} ms",
            now, self.state.next_due_ms
        );
    }

    /// An `Auto` run was stopped before completion.  The interval restarts
    /// from `now`, so a stop holds until the next due time.
    pub fn run_aborted(&mut self, now: Millis) {
        self.state.last_watered_ms = now;
        self.state.next_due_ms = now + self.state.interval_ms;
        self.last_deferral = None;
        warn!(
            "Scheduler: auto run aborted at {} ms, next check at {} ms",
            now, self.state.next_due_ms
        );
    }

    pub fn time_until_next(&self, now: Millis) -> Millis {
        self.state.next_due_ms.saturating_sub(now)
    }

    pub fn time_since_last(&self, now: Millis) -> Millis {
        elapsed(now, self.state.last_watered_ms)
    }

    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    pub fn last_deferral(&self) -> Option<Deferral> {
        self.last_deferral
    }

    fn note_deferral(&mut self, reason: Deferral) {
        if self.last_deferral != Some(reason) {
            debug!("Scheduler: deferred ({})", reason);
            self.last_deferral = Some(reason);
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
