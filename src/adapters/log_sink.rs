//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! Settings records are rendered as JSON so they can be scraped from the
//! console.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::config::Settings;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn settings_json(s: &Settings) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| String::from("<unserializable>"))
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(s) => {
                info!("START | settings={}", settings_json(s));
            }
            AppEvent::PageChanged { from, to } => {
                info!("MENU  | {:?} -> {:?}", from, to);
            }
            AppEvent::WateringStarted { owner, duration_ms } => {
                info!("WATER | {:?} run started, {} ms", owner, duration_ms);
            }
            AppEvent::WateringCompleted { owner, pumped_ms } => {
                info!("WATER | {:?} run complete, pumped {} ms", owner, pumped_ms);
            }
            AppEvent::WateringRefused { owner, reason } => {
                warn!("WATER | {:?} run refused: {}", owner, reason);
            }
            AppEvent::EmergencyStop { owner } => {
                warn!("WATER | {:?} run emergency-stopped", owner);
            }
            AppEvent::FaultDetected(flags) => {
                info!("FAULT | detected, flags=0b{:08b}", flags);
            }
            AppEvent::FaultCleared => {
                info!("FAULT | all cleared");
            }
            AppEvent::SettingsSaved(s) => {
                info!("CONF  | saved {}", settings_json(s));
            }
            AppEvent::CalibrationCommitted { unit_ms } => {
                info!("CALIB | {} ms per cup", unit_ms);
            }
        }
    }
}
