//! Inbound commands to the application service.
//!
//! Button edges arrive through [`AppService::tick`](super::service::AppService::tick);
//! these cover requests from anywhere else (serial console, a future
//! remote adapter, tests) that the service interprets and acts upon.

use crate::config::Settings;
use crate::drivers::button::ButtonRole;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Inject a button press as if it came from the panel.
    Press(ButtonRole),

    /// Stop any run immediately.
    EmergencyStop,

    /// Start a volume-based watering now (still gated).
    ForceWatering,

    /// Replace the user settings (validated, then persisted).
    UpdateSettings(Settings),
}
