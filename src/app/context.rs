//! Shared mutable context threaded through every menu handler.
//!
//! `ControllerContext` is the single struct that page hooks and menu
//! actions read from and write to.  It owns the pump sequencer, the
//! scheduler, calibration data, the latest sensor snapshot and safety
//! verdict, the user settings, and the outbound event queue.  Think of it
//! as the "blackboard" in a blackboard architecture: there is no other
//! mutable control state anywhere in the firmware.

use heapless::Deque;
use log::warn;

use crate::app::events::AppEvent;
use crate::calibration::{CalibrationRecord, CalibrationSession};
use crate::clock::{DateTime, Millis};
use crate::config::{ControllerConfig, PumpSpeed, Settings};
use crate::error::{SafetyFault, WateringError};
use crate::pump::{PumpActuator, RunCompletion, RunOwner};
use crate::safety::SafetyVerdict;
use crate::scheduler::WateringScheduler;

// ---------------------------------------------------------------------------
// Sensor snapshot (written by the sensor port, read by everything else)
// ---------------------------------------------------------------------------

/// A point-in-time reading of both probes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorSnapshot {
    /// Raw moisture ADC value (0 – 4095 when healthy).
    pub moisture_raw: u16,
    /// Moisture mapped to 0–100 %.
    pub moisture_percent: u8,
    /// Raw water-presence ADC value.
    pub water_raw: u16,
    /// True if the water-presence probe reads above its threshold.
    pub water_detected: bool,
    /// Monotonic time the ADC was read.
    pub read_at_ms: Millis,
}

// ---------------------------------------------------------------------------
// Edit drafts and status messages
// ---------------------------------------------------------------------------

/// Value being edited on a settings page.  Discarded unless saved.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Draft {
    #[default]
    None,
    IntervalMins(u32),
    VolumeCups(f32),
    Speed(PumpSpeed),
}

/// Two-line message that temporarily replaces the page on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMessage {
    pub lines: (&'static str, &'static str),
    pub until_ms: Millis,
}

/// Capacity of the outbound event queue drained once per tick.
pub const EVENT_QUEUE_LEN: usize = 16;

// ---------------------------------------------------------------------------
// ControllerContext
// ---------------------------------------------------------------------------

pub struct ControllerContext {
    // -- Timing --
    /// Monotonic time of the current tick.
    pub now_ms: Millis,
    /// Wall-clock time, if set.
    pub date_time: Option<DateTime>,

    // -- Configuration --
    pub config: ControllerConfig,
    /// User settings; persisted when `save_requested` is set.
    pub settings: Settings,
    pub save_requested: bool,

    // -- Sensor data --
    pub sensors: Option<SensorSnapshot>,
    /// Safety verdict for this tick.  Set before the menu runs.
    pub verdict: SafetyVerdict,

    // -- Watering --
    pub pump: PumpActuator,
    pub scheduler: WateringScheduler,
    pub calibration: CalibrationRecord,
    /// Live calibration wizard, if the trial page is open.
    pub session: Option<CalibrationSession>,

    // -- Menu scratch --
    pub draft: Draft,
    pub manual_duration_ms: u32,
    pub message: Option<StatusMessage>,

    // -- Outbound --
    pub events: Deque<AppEvent, EVENT_QUEUE_LEN>,
}

impl ControllerContext {
    pub fn new(config: ControllerConfig, settings: Settings, now: Millis) -> Self {
        let settings = settings.sanitized();
        Self {
            now_ms: now,
            date_time: None,
            pump: PumpActuator::new(config.valve_settle_ms),
            scheduler: WateringScheduler::new(&settings, now),
            calibration: CalibrationRecord::new(settings.unit_duration_ms),
            session: None,
            draft: Draft::None,
            manual_duration_ms: config.manual_duration_ms,
            message: None,
            sensors: None,
            verdict: SafetyVerdict::from_mask(SafetyFault::SensorStale.mask()),
            events: Deque::new(),
            save_requested: false,
            config,
            settings,
        }
    }

    // ── Events and messages ───────────────────────────────────

    /// Queue an event.  The oldest is dropped if the queue is full.
    pub fn push_event(&mut self, event: AppEvent) {
        if self.events.is_full() {
            warn!("Event queue full, dropping oldest");
            self.events.pop_front();
        }
        // Cannot fail after the pop above.
        let _ = self.events.push_back(event);
    }

    pub fn show_message(&mut self, lines: (&'static str, &'static str)) {
        self.message = Some(StatusMessage {
            lines,
            until_ms: self.now_ms + Millis::from(self.config.message_duration_ms),
        });
    }

    pub fn show_error(&mut self, e: WateringError) {
        self.show_message(e.message());
    }

    /// The message on screen right now, if any.
    pub fn active_message(&self) -> Option<(&'static str, &'static str)> {
        self.message
            .filter(|m| self.now_ms < m.until_ms)
            .map(|m| m.lines)
    }

    // ── Settings ──────────────────────────────────────────────

    /// Edit the settings record, re-derive dependent state, and request a save.
    pub fn update_settings(&mut self, edit: impl FnOnce(&mut Settings)) {
        let mut next = self.settings.clone();
        edit(&mut next);
        self.settings = next.sanitized();
        self.calibration.unit_ms = self.settings.unit_duration_ms;
        self.scheduler.configure(&self.settings, self.now_ms);
        self.save_requested = true;
    }

    // ── Runs ──────────────────────────────────────────────────

    /// Request a fixed-duration run at the configured pump speed.
    pub fn start_run(&mut self, owner: RunOwner, duration_ms: Millis) -> Result<(), WateringError> {
        let result = self.pump.try_start(
            owner,
            self.settings.pump_speed,
            duration_ms,
            self.verdict,
            self.now_ms,
        );
        self.record_start(owner, result.map(|()| duration_ms))
            .map(|_| ())
    }

    /// Immediate volume-based run from the auto page.
    pub fn force_watering(&mut self) -> Result<Millis, WateringError> {
        let result = self.scheduler.force(
            self.now_ms,
            self.verdict,
            &self.calibration,
            &mut self.pump,
            self.settings.pump_speed,
        );
        self.record_start(RunOwner::Auto, result)
    }

    /// Queue the start event, or the refusal event plus a status message.
    pub fn record_start(
        &mut self,
        owner: RunOwner,
        result: Result<Millis, WateringError>,
    ) -> Result<Millis, WateringError> {
        match result {
            Ok(duration_ms) => self.push_event(AppEvent::WateringStarted { owner, duration_ms }),
            Err(reason) => {
                self.show_error(reason);
                self.push_event(AppEvent::WateringRefused { owner, reason });
            }
        }
        result
    }

    /// Route a finished run back to whoever owned it.
    pub fn complete_run(&mut self, done: RunCompletion) {
        match done.owner {
            RunOwner::Auto => self.scheduler.mark_watered(done.completed_ms),
            RunOwner::Calibration => {
                if let Some(session) = self.session.as_mut() {
                    session.dispense_finished();
                }
            }
            RunOwner::Manual => self.show_message(("Watering", "complete")),
        }
        self.push_event(AppEvent::WateringCompleted {
            owner: done.owner,
            pumped_ms: done.pumped_ms,
        });
    }

    /// Abort any run in flight.  Outputs are off by the end of this tick.
    pub fn emergency_stop(&mut self) -> Option<RunOwner> {
        let aborted = self.pump.emergency_stop();
        if let Some(owner) = aborted {
            match owner {
                RunOwner::Calibration => {
                    if let Some(session) = self.session.as_mut() {
                        session.dispense_aborted();
                    }
                }
                // Otherwise the still-due schedule restarts the run next tick.
                RunOwner::Auto => self.scheduler.run_aborted(self.now_ms),
                RunOwner::Manual => {}
            }
            self.show_message(("Watering", "stopped"));
            self.push_event(AppEvent::EmergencyStop { owner });
        }
        aborted
    }

    /// Abort the run in flight because `fault` was just raised.
    /// Soil turning wet mid-run is the expected result of watering, so it
    /// never aborts.
    pub fn fault_stop(&mut self, fault: SafetyFault) -> Option<RunOwner> {
        if !fault.aborts_run() || !self.pump.is_active() {
            return None;
        }
        let aborted = self.emergency_stop();
        if let Some(owner) = aborted {
            warn!("{owner:?} run aborted: {fault}");
            self.show_error(WateringError::from(fault));
        }
        aborted
    }
}
