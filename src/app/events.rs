//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::clock::Millis;
use crate::config::Settings;
use crate::error::WateringError;
use crate::menu::PageId;
use crate::pump::RunOwner;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The application service has started (carries the loaded settings).
    Started(Settings),

    /// The menu moved to another page.
    PageChanged { from: PageId, to: PageId },

    /// A run acquired the pump lock.
    WateringStarted { owner: RunOwner, duration_ms: Millis },

    /// A run finished its full valve/pump sequence.
    WateringCompleted { owner: RunOwner, pumped_ms: Millis },

    /// A run request was refused.
    WateringRefused { owner: RunOwner, reason: WateringError },

    /// A run was aborted by an emergency stop.
    EmergencyStop { owner: RunOwner },

    /// One or more safety faults were raised (bitmask of new faults).
    FaultDetected(u8),

    /// All safety faults have been cleared.
    FaultCleared,

    /// Settings were written to persistent storage.
    SettingsSaved(Settings),

    /// A new calibration unit constant was committed.
    CalibrationCommitted { unit_ms: u32 },
}
