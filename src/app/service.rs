//! Application service, the hexagonal core.
//!
//! [`AppService`] owns the menu, the safety supervisor, the renderer and
//! the shared [`ControllerContext`].  All I/O flows through port traits
//! injected at call sites, so the whole service runs unchanged against
//! mock adapters in tests.
//!
//! ```text
//!  ButtonRole ──▶ ┌───────────────────────────┐ ──▶ DisplayPort
//!  ClockPort  ──▶ │        AppService         │ ──▶ EventSink
//!  SensorPort ──▶ │ Menu · Safety · Scheduler │
//! ActuatorPort ◀──│   Pump sequencer          │
//!                 └───────────────────────────┘
//! ```

use log::{info, warn};

use crate::clock::Millis;
use crate::config::{ControllerConfig, Settings};
use crate::drivers::button::ButtonRole;
use crate::error::SafetyFault;
use crate::menu::{MenuStateMachine, PageId};
use crate::pump::{ActuatorCommands, RunOwner};
use crate::safety::{SafetySupervisor, SafetyVerdict};

use super::commands::AppCommand;
use super::context::ControllerContext;
use super::events::AppEvent;
use super::ports::{ActuatorPort, ClockPort, ConfigPort, DisplayPort, EventSink, SensorPort};
use super::render::{self, Renderer};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    menu: MenuStateMachine,
    ctx: ControllerContext,
    safety: SafetySupervisor,
    renderer: Renderer,
    /// Commands last written to the actuator port.
    applied: Option<ActuatorCommands>,
    tick_count: u64,
}

impl AppService {
    /// Construct the service.  `settings` are sanitized on the way in.
    ///
    /// Does **not** start the menu; call [`start`](Self::start) next.
    pub fn new(config: ControllerConfig, settings: Settings, now: Millis) -> Self {
        let safety = SafetySupervisor::new(&config);
        let ctx = ControllerContext::new(config, settings, now);
        Self {
            menu: MenuStateMachine::new(now),
            ctx,
            safety,
            renderer: Renderer::new(),
            applied: None,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.menu.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.ctx.settings.clone()));
        info!(
            "AppService started on {:?} (auto={}, unit={} ms)",
            self.menu.page(),
            self.ctx.settings.auto_mode,
            self.ctx.settings.unit_duration_ms
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle:
    /// clock → sensors → safety → pump → menu → scheduler → actuators → display.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`], which avoids a double mutable borrow while keeping
    /// the port boundary explicit.
    pub fn tick(
        &mut self,
        input: Option<ButtonRole>,
        clock: &impl ClockPort,
        hw: &mut (impl SensorPort + ActuatorPort),
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;

        // 1. Time
        let now = clock.now_ms();
        self.ctx.now_ms = now;
        self.ctx.date_time = clock.date_time();

        // 2. Sensors
        self.ctx.sensors = hw.sample(now);

        // 3. Safety evaluation (edge-reported)
        self.evaluate_safety(now);

        // 4. Advance any run in flight
        if let Some(done) = self.ctx.pump.tick(now) {
            self.ctx.complete_run(done);
        }

        // 5. Menu: idle timeout, then the press (if any)
        self.menu.tick(&mut self.ctx);
        if let Some(role) = input {
            self.menu.handle(role, &mut self.ctx);
        }

        // 6. Scheduler, independent of the menu
        let speed = self.ctx.settings.pump_speed;
        if let Some(duration_ms) = self.ctx.scheduler.tick(
            now,
            self.ctx.verdict,
            &self.ctx.calibration,
            &mut self.ctx.pump,
            speed,
        ) {
            self.ctx.push_event(AppEvent::WateringStarted {
                owner: RunOwner::Auto,
                duration_ms,
            });
        }

        // 7. Outputs
        self.apply_actuators(hw);
        let frame = render::compose(&self.menu, &self.ctx);
        self.renderer.draw(frame, display);
        self.drain_events(sink);
    }

    // ── Command handling ──────────────────────────────────────

    /// Process a command from outside the button panel.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::Press(role) => self.menu.handle(role, &mut self.ctx),
            AppCommand::EmergencyStop => {
                self.ctx.emergency_stop();
            }
            AppCommand::ForceWatering => {
                if let Err(e) = self.ctx.force_watering() {
                    warn!("Forced watering refused: {}", e);
                }
            }
            AppCommand::UpdateSettings(settings) => {
                if let Err(e) = settings.validate() {
                    warn!("Settings update rejected: {}", e);
                } else {
                    self.ctx.update_settings(|s| *s = settings);
                    info!("Settings updated at runtime");
                }
            }
        }
        self.apply_actuators(hw);
        self.drain_events(sink);
    }

    /// Stop any run now and push the all-off command to the hardware.
    pub fn emergency_stop(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        self.handle_command(AppCommand::EmergencyStop, hw, sink);
    }

    // ── Persistence ───────────────────────────────────────────

    /// Flush settings changed through the menu.  Returns `true` if a save
    /// happened.  A failed save is retried on the next call.
    pub fn save_settings_if_requested(
        &mut self,
        storage: &impl ConfigPort,
        sink: &mut impl EventSink,
    ) -> bool {
        if !self.ctx.save_requested {
            return false;
        }
        match storage.save(&self.ctx.settings) {
            Ok(()) => {
                self.ctx.save_requested = false;
                info!("Settings saved");
                sink.emit(&AppEvent::SettingsSaved(self.ctx.settings.clone()));
                true
            }
            Err(e) => {
                warn!("Settings save failed: {}", e);
                false
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn page(&self) -> PageId {
        self.menu.page()
    }

    pub fn menu(&self) -> &MenuStateMachine {
        &self.menu
    }

    pub fn context(&self) -> &ControllerContext {
        &self.ctx
    }

    pub fn settings(&self) -> &Settings {
        &self.ctx.settings
    }

    pub fn verdict(&self) -> SafetyVerdict {
        self.ctx.verdict
    }

    pub fn is_watering(&self) -> bool {
        self.ctx.pump.is_active()
    }

    pub fn is_save_pending(&self) -> bool {
        self.ctx.save_requested
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Current active fault bitmask (0 = no faults).
    pub fn fault_flags(&self) -> u8 {
        self.safety.faults()
    }

    /// The current screen, as it was last composed.
    pub fn frame(&self) -> render::Frame {
        render::compose(&self.menu, &self.ctx)
    }

    // ── Internal ──────────────────────────────────────────────

    fn evaluate_safety(&mut self, now: Millis) {
        let before = self.safety.faults();
        let verdict = self.safety.evaluate(self.ctx.sensors.as_ref(), now);
        self.ctx.verdict = verdict;

        // The supervisor logs each edge; here they only become events.
        let raised = verdict.mask() & !before;
        if raised != 0 {
            self.ctx.push_event(AppEvent::FaultDetected(raised));
            // A run in flight stops on the first fault that warrants it.
            if let Some(fault) = SafetyFault::ALL
                .into_iter()
                .find(|f| f.aborts_run() && raised & f.mask() != 0)
            {
                self.ctx.fault_stop(fault);
            }
        } else if before != 0 && verdict.mask() == 0 {
            self.ctx.push_event(AppEvent::FaultCleared);
        }
    }

    /// Push the sequencer's commands to the hardware when they change.
    fn apply_actuators(&mut self, hw: &mut impl ActuatorPort) {
        let cmds = self.ctx.pump.commands();
        if self.applied == Some(cmds) {
            return;
        }
        if cmds == ActuatorCommands::all_off() {
            hw.all_off();
        } else {
            // Valve first: the pump never runs against a closed valve.
            hw.set_valve(cmds.valve_open);
            hw.set_pump(cmds.pump_duty);
        }
        self.applied = Some(cmds);
    }

    fn drain_events(&mut self, sink: &mut impl EventSink) {
        while let Some(event) = self.ctx.events.pop_front() {
            sink.emit(&event);
        }
    }
}
