//! Status types for refused or failed watering operations.
//!
//! Nothing in the control loop panics or unwinds: every failure is one of
//! the small `Copy` enums below, checked by the caller before it acts.
//! User-visible failures map to a short status message via
//! [`WateringError::message`].

use core::fmt;

use crate::pump::RunOwner;

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Reading is outside the valid raw ADC range.
    OutOfRange,
    /// No reading within the expected refresh window.
    Stale,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange => write!(f, "reading out of range"),
            Self::Stale => write!(f, "reading stale"),
        }
    }
}

// ---------------------------------------------------------------------------
// Safety faults
// ---------------------------------------------------------------------------

/// Gate failures tracked as a bitmask by the
/// [`SafetySupervisor`](crate::safety::SafetySupervisor), so that several
/// can be active at once and each clears independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SafetyFault {
    /// Moisture reading outside its valid range.
    SensorOutOfRange = 0b0000_0001,
    /// No fresh sensor snapshot.
    SensorStale = 0b0000_0010,
    /// MoistureGate: soil already at or above the wet threshold.
    SoilWet = 0b0000_0100,
    /// SafetyGate: water-presence probe reports water.
    WaterDetected = 0b0000_1000,
}

impl SafetyFault {
    pub const ALL: [Self; 4] = [
        Self::SensorOutOfRange,
        Self::SensorStale,
        Self::SoilWet,
        Self::WaterDetected,
    ];

    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }

    /// Health faults block scheduling until the sensor recovers.
    pub const fn is_sensor_fault(self) -> bool {
        matches!(self, Self::SensorOutOfRange | Self::SensorStale)
    }

    /// Whether this fault, raised mid-run, stops the pump.
    pub const fn aborts_run(self) -> bool {
        !matches!(self, Self::SoilWet)
    }
}

impl fmt::Display for SafetyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorOutOfRange => write!(f, "moisture sensor out of range"),
            Self::SensorStale => write!(f, "sensor data stale"),
            Self::SoilWet => write!(f, "soil already wet"),
            Self::WaterDetected => write!(f, "water detected"),
        }
    }
}

// ---------------------------------------------------------------------------
// Watering errors
// ---------------------------------------------------------------------------

/// Why a watering, calibration, or configuration request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WateringError {
    /// Sensor unhealthy; scheduling is suppressed until it recovers.
    SensorFault(SensorError),
    /// MoistureGate or SafetyGate failed when the request was made.
    SafetyViolation(SafetyFault),
    /// Volume-based request while the unit constant is zero.
    CalibrationMissing,
    /// Another operation holds the pump run-lock.
    RunLockConflict { holder: RunOwner },
}

impl WateringError {
    /// Two short lines for the 16x2 display.
    pub fn message(self) -> (&'static str, &'static str) {
        match self {
            Self::SensorFault(SensorError::OutOfRange) => ("Sensor error", "Check wiring"),
            Self::SensorFault(SensorError::Stale) => ("Sensor error", "No reading"),
            Self::SafetyViolation(SafetyFault::SoilWet) => ("Soil too wet", "Not watering"),
            Self::SafetyViolation(SafetyFault::WaterDetected) => ("Water detected", "Not watering"),
            Self::SafetyViolation(_) => ("Sensor error", "Not watering"),
            Self::CalibrationMissing => ("Calibrate first", "Starting wizard"),
            Self::RunLockConflict { .. } => ("Pump busy", "Try again later"),
        }
    }
}

impl fmt::Display for WateringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorFault(e) => write!(f, "sensor fault: {e}"),
            Self::SafetyViolation(fault) => write!(f, "safety violation: {fault}"),
            Self::CalibrationMissing => write!(f, "calibration missing"),
            Self::RunLockConflict { holder } => write!(f, "pump held by {holder:?} run"),
        }
    }
}

impl From<SensorError> for WateringError {
    fn from(e: SensorError) -> Self {
        Self::SensorFault(e)
    }
}

impl From<SafetyFault> for WateringError {
    fn from(fault: SafetyFault) -> Self {
        match fault {
            SafetyFault::SensorOutOfRange => Self::SensorFault(SensorError::OutOfRange),
            SafetyFault::SensorStale => Self::SensorFault(SensorError::Stale),
            other => Self::SafetyViolation(other),
        }
    }
}
