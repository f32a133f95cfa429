//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, actuators, clock, display, storage, event
//! sinks) implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! - **ConfigPort** implementations MUST validate before persisting.
//! - All port errors are typed; callers handle every variant explicitly.

use crate::app::context::SensorSnapshot;
use crate::clock::{DateTime, Millis};
use crate::config::Settings;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this every tick.
pub trait SensorPort {
    /// Advance sampling and return the most recent complete snapshot, or
    /// `None` if no sample has completed yet.  Staleness and range checks
    /// are the caller's job.
    fn sample(&mut self, now: Millis) -> Option<SensorSnapshot>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command the pump and valve.
pub trait ActuatorPort {
    /// Open or close the solenoid valve.
    fn set_valve(&mut self, open: bool);

    /// Set pump PWM duty (0 = off, 255 = full speed).
    fn set_pump(&mut self, duty: u8);

    /// Pump off, valve closed.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

pub trait ClockPort {
    /// Monotonic milliseconds since boot.
    fn now_ms(&self) -> Millis;

    /// Wall-clock time for display, if the clock has been set.
    fn date_time(&self) -> Option<DateTime>;
}

// ───────────────────────────────────────────────────────────────
// Display port (write-only character display)
// ───────────────────────────────────────────────────────────────

pub trait DisplayPort {
    fn clear(&mut self);
    fn set_cursor(&mut self, col: u8, row: u8);
    fn print(&mut self, text: &str);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent settings)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the user [`Settings`] record.
///
/// Implementations MUST call [`Settings::validate`] before persisting and
/// reject invalid records with [`ConfigError::ValidationFailed`].  On load,
/// invalid fields are replaced with defaults ([`Settings::sanitized`]).
pub trait ConfigPort {
    /// Load settings.  Returns [`Settings::default()`] if nothing is stored.
    fn load(&self) -> Result<Settings, ConfigError>;

    /// Validate and persist settings.
    fn save(&self, settings: &Settings) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// Stored record failed deserialization.
    Corrupted,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "settings corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
