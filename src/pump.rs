//! Pump/valve actuation sequencer.
//!
//! Every watering, manual, or calibration run goes through the same fixed
//! sequence under an exclusive run-lock:
//!
//! ```text
//!  start ──▶ ValveSettling ──▶ Pumping ──▶ Draining ──▶ done
//!            valve open       valve open   valve open    valve closed
//!            pump off         pump on      pump off      lock released
//!            (settle ms)      (target ms)  (settle ms)
//! ```
//!
//! The valve-settle delay is a blind wait; nothing confirms the valve has
//! actually moved.  Each phase is a `{phase, started_at}` pair checked by
//! [`PumpActuator::tick`], so the control loop never blocks.
//!
//! The sequencer only computes [`ActuatorCommands`]; the service applies
//! them to the [`ActuatorPort`](crate::app::ports::ActuatorPort) at the end
//! of every tick.  An emergency stop therefore reaches the hardware in the
//! same tick it was requested.

use log::{info, warn};

use crate::clock::{Millis, elapsed};
use crate::config::PumpSpeed;
use crate::error::WateringError;
use crate::safety::{SafetySupervisor, SafetyVerdict};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Who holds the run-lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOwner {
    Manual,
    Auto,
    Calibration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Valve commanded open; waiting for it to settle.
    ValveSettling,
    /// Pump running for the target duration.
    Pumping,
    /// Pump stopped; letting the line drain before closing the valve.
    Draining,
}

/// State of the run in flight.  Its existence *is* the run-lock.
#[derive(Debug, Clone, Copy)]
pub struct PumpRunState {
    pub owner: RunOwner,
    pub phase: RunPhase,
    pub speed: PumpSpeed,
    pub started_ms: Millis,
    pub phase_started_ms: Millis,
    pub target_duration_ms: Millis,
}

/// Output levels requested by the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActuatorCommands {
    pub valve_open: bool,
    /// PWM duty, 0 = off.
    pub pump_duty: u8,
}

impl ActuatorCommands {
    /// Valve closed, pump off.
    pub const fn all_off() -> Self {
        Self {
            valve_open: false,
            pump_duty: 0,
        }
    }
}

/// Reported once when a run finishes its full sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunCompletion {
    pub owner: RunOwner,
    pub pumped_ms: Millis,
    pub completed_ms: Millis,
}

// ---------------------------------------------------------------------------
// Actuator
// ---------------------------------------------------------------------------

pub struct PumpActuator {
    run: Option<PumpRunState>,
    settle_ms: Millis,
    commands: ActuatorCommands,
}

impl PumpActuator {
    pub fn new(valve_settle_ms: u32) -> Self {
        Self {
            run: None,
            settle_ms: Millis::from(valve_settle_ms),
            commands: ActuatorCommands::all_off(),
        }
    }

    /// Whether a new run may be granted the lock given this verdict.
    pub fn is_safe_to_operate(&self, verdict: SafetyVerdict) -> Result<(), WateringError> {
        if let Some(run) = &self.run {
            return Err(WateringError::RunLockConflict { holder: run.owner });
        }
        SafetySupervisor::is_safe_to_operate(verdict)
    }

    /// Acquire the run-lock and open the valve.
    ///
    /// Refused with `RunLockConflict` if any run is in flight, or with the
    /// verdict's blocker if a gate or sensor check fails.  Nothing is queued.
    pub fn try_start(
        &mut self,
        owner: RunOwner,
        speed: PumpSpeed,
        duration_ms: Millis,
        verdict: SafetyVerdict,
        now: Millis,
    ) -> Result<(), WateringError> {
        if let Err(e) = self.is_safe_to_operate(verdict) {
            warn!("Pump: {:?} run refused ({})", owner, e);
            return Err(e);
        }

        info!(
            "Pump: {:?} run started ({} ms at {}), opening valve",
            owner, duration_ms, speed
        );
        self.run = Some(PumpRunState {
            owner,
            phase: RunPhase::ValveSettling,
            speed,
            started_ms: now,
            phase_started_ms: now,
            target_duration_ms: duration_ms,
        });
        self.commands = ActuatorCommands {
            valve_open: true,
            pump_duty: 0,
        };
        Ok(())
    }

    /// Advance the sequence.  Call once per control tick.
    /// Returns a completion exactly once, on the tick the valve closes.
    pub fn tick(&mut self, now: Millis) -> Option<RunCompletion> {
        let run = self.run.as_mut()?;
        let in_phase = elapsed(now, run.phase_started_ms);

        match run.phase {
            RunPhase::ValveSettling => {
                if in_phase >= self.settle_ms {
                    run.phase = RunPhase::Pumping;
                    run.phase_started_ms = now;
                    self.commands.pump_duty = run.speed.duty();
                    info!("Pump: valve settled, pumping at duty {}", run.speed.duty());
                }
                None
            }

            RunPhase::Pumping => {
                if in_phase >= run.target_duration_ms {
                    run.phase = RunPhase::Draining;
                    run.phase_started_ms = now;
                    self.commands.pump_duty = 0;
                    info!("Pump: dispense complete after {} ms, draining", in_phase);
                }
                None
            }

            RunPhase::Draining => {
                if in_phase < self.settle_ms {
                    return None;
                }
                let done = RunCompletion {
                    owner: run.owner,
                    pumped_ms: run.target_duration_ms,
                    completed_ms: now,
                };
                self.commands = ActuatorCommands::all_off();
                self.run = None;
                info!("Pump: valve closed, {:?} run complete", done.owner);
                Some(done)
            }
        }
    }

    /// Stop everything now, whoever holds the lock.
    /// Returns the owner of the aborted run, if there was one.
    pub fn emergency_stop(&mut self) -> Option<RunOwner> {
        self.commands = ActuatorCommands::all_off();
        let aborted = self.run.take().map(|run| run.owner);
        match aborted {
            Some(owner) => warn!("Pump: EMERGENCY STOP, {:?} run aborted", owner),
            None => info!("Pump: emergency stop with no run in flight"),
        }
        aborted
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn commands(&self) -> ActuatorCommands {
        self.commands
    }

    pub fn run(&self) -> Option<&PumpRunState> {
        self.run.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.run.is_some()
    }

    pub fn owner(&self) -> Option<RunOwner> {
        self.run.as_ref().map(|r| r.owner)
    }

    pub fn is_owned_by(&self, owner: RunOwner) -> bool {
        self.owner() == Some(owner)
    }

    pub fn is_valve_open(&self) -> bool {
        self.commands.valve_open
    }

    pub fn is_pumping(&self) -> bool {
        self.commands.pump_duty > 0
    }

    /// Time left in the whole sequence (settle + pump + settle).
    pub fn remaining_ms(&self, now: Millis) -> Millis {
        let Some(run) = &self.run else {
            return 0;
        };
        let in_phase = elapsed(now, run.phase_started_ms);
        match run.phase {
            RunPhase::ValveSettling => {
                self.settle_ms.saturating_sub(in_phase) + run.target_duration_ms + self.settle_ms
            }
            RunPhase::Pumping => run.target_duration_ms.saturating_sub(in_phase) + self.settle_ms,
            RunPhase::Draining => self.settle_ms.saturating_sub(in_phase),
        }
    }
}
