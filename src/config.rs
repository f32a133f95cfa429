//! System configuration parameters
//!
//! Two layers:
//!
//! - [`ControllerConfig`]: compile-time tunables (timings, thresholds,
//!   edit steps).  Not user-editable.
//! - [`Settings`]: the flat record the user edits through the menu and
//!   that survives power cycles via the [`ConfigPort`](crate::app::ports::ConfigPort).
//!
//! The watering interval is persisted in minutes and converted to
//! milliseconds in exactly one place, [`Settings::interval_ms`].

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::clock::{MS_PER_MIN, Millis};

// ---------------------------------------------------------------------------
// Pump speed
// ---------------------------------------------------------------------------

/// Discrete pump speed levels.  Each maps to a fixed 8-bit PWM duty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PumpSpeed {
    Low,
    #[default]
    Mid,
    High,
}

impl PumpSpeed {
    /// PWM duty (0–255) for this speed level.
    pub const fn duty(self) -> u8 {
        match self {
            Self::Low => 90,
            Self::Mid => 150,
            Self::High => 255,
        }
    }

    /// Next level up, saturating at `High`.
    pub const fn faster(self) -> Self {
        match self {
            Self::Low => Self::Mid,
            Self::Mid | Self::High => Self::High,
        }
    }

    /// Next level down, saturating at `Low`.
    pub const fn slower(self) -> Self {
        match self {
            Self::High => Self::Mid,
            Self::Mid | Self::Low => Self::Low,
        }
    }
}

impl fmt::Display for PumpSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Mid => write!(f, "MID"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

// ---------------------------------------------------------------------------
// Controller tunables
// ---------------------------------------------------------------------------

/// Fixed controller parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    // --- Timing ---
    /// Control loop period (milliseconds).
    pub loop_interval_ms: u32,
    /// Minimum stable time before a button transition is accepted.
    pub debounce_ms: u32,
    /// Blind wait after moving the valve, before/after pumping.
    pub valve_settle_ms: u32,
    /// How long user-facing status messages stay on screen.
    pub message_duration_ms: u32,
    /// Revert to the main menu after this long without input (0 = never).
    pub menu_idle_timeout_ms: u32,

    // --- Sensors ---
    /// Period between sensor samples.
    pub sensor_sample_interval_ms: u32,
    /// Sensor power-on warm-up before the ADC is read.
    pub sensor_warmup_ms: u32,
    /// A snapshot older than this is treated as a sensor fault.
    pub sensor_stale_after_ms: u32,
    /// Highest valid raw ADC value (12-bit ADC).
    pub moisture_raw_max: u16,
    /// Raw reading in bone-dry soil (maps to 0 %).
    pub moisture_dry_raw: u16,
    /// Raw reading in saturated soil (maps to 100 %).
    pub moisture_wet_raw: u16,
    /// Water-presence probe reads above this when water is detected.
    pub water_detect_threshold_raw: u16,

    // --- Watering gates ---
    /// Soil at or above this moisture percentage is "already wet".
    pub wet_threshold_percent: u8,

    // --- Manual watering ---
    /// Initial manual watering duration.
    pub manual_duration_ms: u32,
    /// Step for manual duration edits.
    pub manual_step_ms: u32,
    /// Upper bound for manual and calibration runs.
    pub max_run_ms: u32,

    // --- Edit steps ---
    pub interval_step_mins: u32,
    pub volume_step_cups: f32,
    pub trial_step_ms: u32,
    /// Initial calibration trial duration when uncalibrated.
    pub default_trial_ms: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            // Timing
            loop_interval_ms: 10,
            debounce_ms: 50,
            valve_settle_ms: 2_000,
            message_duration_ms: 3_000,
            menu_idle_timeout_ms: 30_000,

            // Sensors
            sensor_sample_interval_ms: 1_000,
            sensor_warmup_ms: 200,
            sensor_stale_after_ms: 5_000,
            moisture_raw_max: 4_095,
            moisture_dry_raw: 1_200,
            moisture_wet_raw: 3_520,
            water_detect_threshold_raw: 1_400,

            // Gates
            wet_threshold_percent: 80,

            // Manual
            manual_duration_ms: 20_000,
            manual_step_ms: 5_000,
            max_run_ms: 120_000,

            // Edit steps
            interval_step_mins: 60,
            volume_step_cups: 0.25,
            trial_step_ms: 500,
            default_trial_ms: 20_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Persisted settings
// ---------------------------------------------------------------------------

pub const INTERVAL_MINS_RANGE: core::ops::RangeInclusive<u32> = 60..=10_080;
pub const VOLUME_CUPS_RANGE: core::ops::RangeInclusive<f32> = 0.25..=10.0;
pub const UNIT_MS_MAX: u32 = 120_000;

/// The flat record persisted across power cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Time between automatic waterings (minutes).
    pub watering_interval_mins: u32,
    /// Volume dispensed per automatic watering (cups).
    pub target_volume_cups: f32,
    /// Pump speed used for every run.
    pub pump_speed: PumpSpeed,
    /// Automatic (scheduled) watering enabled.
    pub auto_mode: bool,
    /// Pump time that dispenses one cup (0 = uncalibrated).
    pub unit_duration_ms: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            watering_interval_mins: 60,
            target_volume_cups: 1.0,
            pump_speed: PumpSpeed::Mid,
            auto_mode: false,
            unit_duration_ms: 0,
        }
    }
}

impl Settings {
    /// The watering interval in canonical milliseconds.
    pub fn interval_ms(&self) -> Millis {
        Millis::from(self.watering_interval_mins) * MS_PER_MIN
    }

    /// Reject records that must not be persisted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !INTERVAL_MINS_RANGE.contains(&self.watering_interval_mins) {
            return Err(ConfigError::ValidationFailed(
                "watering_interval_mins must be 60–10080",
            ));
        }
        if !VOLUME_CUPS_RANGE.contains(&self.target_volume_cups) {
            return Err(ConfigError::ValidationFailed(
                "target_volume_cups must be 0.25–10.0",
            ));
        }
        if self.unit_duration_ms > UNIT_MS_MAX {
            return Err(ConfigError::ValidationFailed(
                "unit_duration_ms must be 0–120000",
            ));
        }
        if self.auto_mode && self.unit_duration_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "auto_mode requires a calibrated unit duration",
            ));
        }
        Ok(())
    }

    /// Replace every invalid field with its default.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !INTERVAL_MINS_RANGE.contains(&self.watering_interval_mins) {
            self.watering_interval_mins = defaults.watering_interval_mins;
        }
        if !VOLUME_CUPS_RANGE.contains(&self.target_volume_cups) {
            self.target_volume_cups = defaults.target_volume_cups;
        }
        if self.unit_duration_ms > UNIT_MS_MAX {
            self.unit_duration_ms = defaults.unit_duration_ms;
        }
        if self.unit_duration_ms == 0 {
            self.auto_mode = false;
        }
        self
    }
}
