//! Safety supervisor.
//!
//! Runs **every tick before the menu and scheduler** and produces a
//! [`SafetyVerdict`]: a fault bitmask covering sensor health and the two
//! watering gates.
//!
//! | Fault              | Condition                                      |
//! |--------------------|------------------------------------------------|
//! | `SensorStale`      | no snapshot, or older than the stale window    |
//! | `SensorOutOfRange` | raw moisture above the ADC range               |
//! | `SoilWet`          | moisture % >= wet threshold (MoistureGate)     |
//! | `WaterDetected`    | water-presence flag set (SafetyGate)           |
//!
//! [`SafetySupervisor::check`] is a pure function of its inputs, so asking
//! twice with no state change yields the same verdict.  The latched mask
//! kept by [`SafetySupervisor::evaluate`] exists only to log fault edges.

use log::{error, info};

use crate::app::context::SensorSnapshot;
use crate::clock::{Millis, elapsed};
use crate::config::ControllerConfig;
use crate::error::{SafetyFault, WateringError};

/// Result of one safety evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SafetyVerdict {
    faults: u8,
}

impl SafetyVerdict {
    pub const fn from_mask(faults: u8) -> Self {
        Self { faults }
    }

    pub const fn mask(self) -> u8 {
        self.faults
    }

    pub const fn has(self, fault: SafetyFault) -> bool {
        self.faults & fault.mask() != 0
    }

    /// Sensors fresh and in range.
    pub fn sensors_healthy(self) -> bool {
        !self.has(SafetyFault::SensorOutOfRange) && !self.has(SafetyFault::SensorStale)
    }

    /// All gates pass: healthy sensors, dry soil, no water detected.
    pub const fn is_safe(self) -> bool {
        self.faults == 0
    }

    /// The most significant reason this verdict refuses an operation.
    /// Sensor health outranks the gates.
    pub fn blocker(self) -> Option<WateringError> {
        SafetyFault::ALL
            .into_iter()
            .find(|f| self.has(*f))
            .map(WateringError::from)
    }
}

/// Safety supervisor.
pub struct SafetySupervisor {
    wet_threshold_percent: u8,
    raw_max: u16,
    stale_after_ms: Millis,
    /// Latched fault bitmask (for edge logging).
    faults: u8,
}

impl SafetySupervisor {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            wet_threshold_percent: config.wet_threshold_percent,
            raw_max: config.moisture_raw_max,
            stale_after_ms: Millis::from(config.sensor_stale_after_ms),
            faults: 0,
        }
    }

    /// Pure gate evaluation.  No side effects.
    pub fn check(&self, snapshot: Option<&SensorSnapshot>, now: Millis) -> SafetyVerdict {
        let Some(snap) = snapshot else {
            return SafetyVerdict::from_mask(SafetyFault::SensorStale.mask());
        };

        let mut faults = 0u8;
        if elapsed(now, snap.read_at_ms) > self.stale_after_ms {
            faults |= SafetyFault::SensorStale.mask();
        }
        if snap.moisture_raw > self.raw_max {
            // Percentage of an out-of-range reading is meaningless; skip the
            // moisture gate and report only the health fault.
            faults |= SafetyFault::SensorOutOfRange.mask();
        } else if snap.moisture_percent >= self.wet_threshold_percent {
            faults |= SafetyFault::SoilWet.mask();
        }
        if snap.water_detected {
            faults |= SafetyFault::WaterDetected.mask();
        }
        SafetyVerdict::from_mask(faults)
    }

    /// Evaluate and log fault edges.  Returns the fresh verdict.
    pub fn evaluate(&mut self, snapshot: Option<&SensorSnapshot>, now: Millis) -> SafetyVerdict {
        let verdict = self.check(snapshot, now);
        for fault in SafetyFault::ALL {
            self.latch(fault, verdict.has(fault));
        }
        verdict
    }

    /// Whether a new run may be granted the run-lock.
    pub fn is_safe_to_operate(verdict: SafetyVerdict) -> Result<(), WateringError> {
        match verdict.blocker() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Current latched bitmask.
    pub fn faults(&self) -> u8 {
        self.faults
    }

    // ── Internal ──────────────────────────────────────────────────

    fn latch(&mut self, fault: SafetyFault, condition: bool) {
        if condition {
            if self.faults & fault.mask() == 0 {
                // Gate faults are routine (wet soil); only health faults are errors.
                if fault.is_sensor_fault() {
                    error!("SAFETY FAULT SET: {fault}");
                } else {
                    info!("SAFETY GATE CLOSED: {fault}");
                }
            }
            self.faults |= fault.mask();
        } else {
            if self.faults & fault.mask() != 0 {
                info!("SAFETY FAULT CLEARED: {fault}");
            }
            self.faults &= !fault.mask();
        }
    }
}
