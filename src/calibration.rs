//! Volume-to-duration calibration.
//!
//! The pump has no flow sensor.  Instead the user measures how long the
//! pump needs to dispense exactly one reference volume (one cup) and that
//! duration becomes the *unit constant*.  Every volume-based run derives
//! its duration from it:
//!
//! ```text
//! duration_ms = floor(volume_cups × unit_ms)
//! ```
//!
//! ## Interactive flow
//!
//! ```text
//!  SelectDuration ──[confirm]──▶ Dispensing ──[run done]──▶ AwaitVerdict
//!        ▲                                                   │      │
//!        └────────────────────[reject]───────────────────────┘   [accept]
//!                                                                   ▼
//!                                                         unit constant saved
//! ```

use log::info;

use crate::clock::Millis;
use crate::error::WateringError;

// ═══════════════════════════════════════════════════════════════
//  Record
// ═══════════════════════════════════════════════════════════════

/// Calibration data.  `unit_ms == 0` means uncalibrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalibrationRecord {
    /// Duration of the most recent trial run.
    pub last_trial_ms: u32,
    /// Confirmed pump time for one reference volume.
    pub unit_ms: u32,
}

impl CalibrationRecord {
    pub fn new(unit_ms: u32) -> Self {
        Self {
            last_trial_ms: unit_ms,
            unit_ms,
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.unit_ms > 0
    }

    /// Pump duration for `volume_cups`, rounded down to the millisecond.
    pub fn derive(&self, volume_cups: f32) -> Result<Millis, WateringError> {
        if !self.is_calibrated() {
            return Err(WateringError::CalibrationMissing);
        }
        let ms = (f64::from(volume_cups) * f64::from(self.unit_ms)).floor();
        Ok(if ms <= 0.0 { 0 } else { ms as Millis })
    }

    /// Commit a confirmed trial as the new unit constant.
    pub fn commit(&mut self, trial_ms: u32) {
        info!(
            "Calibration: unit constant {} ms -> {} ms per cup",
            self.unit_ms, trial_ms
        );
        self.last_trial_ms = trial_ms;
        self.unit_ms = trial_ms;
    }

    /// Forget the unit constant.
    pub fn clear(&mut self) {
        info!("Calibration: cleared");
        self.unit_ms = 0;
    }
}

// ═══════════════════════════════════════════════════════════════
//  Wizard session
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStep {
    /// User adjusts the trial duration.
    SelectDuration,
    /// Pump is running the trial.
    Dispensing,
    /// Trial finished; waiting for the user to accept or reject it.
    AwaitVerdict,
}

/// One pass through the calibration wizard.
#[derive(Debug, Clone, Copy)]
pub struct CalibrationSession {
    step: CalibrationStep,
    trial_ms: u32,
    min_ms: u32,
    max_ms: u32,
}

impl CalibrationSession {
    pub fn new(initial_trial_ms: u32, step_ms: u32, max_ms: u32) -> Self {
        let min_ms = step_ms.max(1);
        Self {
            step: CalibrationStep::SelectDuration,
            trial_ms: initial_trial_ms.clamp(min_ms, max_ms),
            min_ms,
            max_ms,
        }
    }

    pub fn step(&self) -> CalibrationStep {
        self.step
    }

    pub fn trial_ms(&self) -> u32 {
        self.trial_ms
    }

    /// Adjust the trial duration.  Only valid while selecting.
    pub fn adjust(&mut self, delta_ms: i64) {
        if self.step != CalibrationStep::SelectDuration {
            return;
        }
        let next = (i64::from(self.trial_ms) + delta_ms)
            .clamp(i64::from(self.min_ms), i64::from(self.max_ms));
        self.trial_ms = next as u32;
    }

    /// Move to `Dispensing`.  Returns the trial duration to run, or `None`
    /// if the session is not waiting for a duration.
    pub fn begin_dispense(&mut self) -> Option<u32> {
        if self.step != CalibrationStep::SelectDuration {
            return None;
        }
        self.step = CalibrationStep::Dispensing;
        Some(self.trial_ms)
    }

    /// The trial run finished normally.
    pub fn dispense_finished(&mut self) {
        if self.step == CalibrationStep::Dispensing {
            self.step = CalibrationStep::AwaitVerdict;
        }
    }

    /// The trial run never started or was aborted; back to selection.
    pub fn dispense_aborted(&mut self) {
        if self.step == CalibrationStep::Dispensing {
            self.step = CalibrationStep::SelectDuration;
        }
    }

    /// User confirmed the trial dispensed one reference volume.
    /// Returns the duration to commit.
    pub fn accept(&mut self) -> Option<u32> {
        if self.step != CalibrationStep::AwaitVerdict {
            return None;
        }
        self.step = CalibrationStep::SelectDuration;
        Some(self.trial_ms)
    }

    /// User rejected the trial; loop back without committing.
    pub fn reject(&mut self) {
        if self.step == CalibrationStep::AwaitVerdict {
            info!("Calibration: trial of {} ms rejected", self.trial_ms);
            self.step = CalibrationStep::SelectDuration;
        }
    }
}
