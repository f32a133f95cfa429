//! Mock adapters for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history without touching real GPIO/PWM registers.

use std::cell::{Cell, RefCell};

use plantwater::app::context::SensorSnapshot;
use plantwater::app::events::AppEvent;
use plantwater::app::ports::{
    ActuatorPort, ClockPort, ConfigError, ConfigPort, DisplayPort, EventSink, SensorPort,
};
use plantwater::app::service::AppService;
use plantwater::clock::{DateTime, Millis};
use plantwater::config::{ControllerConfig, Settings};
use plantwater::drivers::button::ButtonRole;

// ── Clock ─────────────────────────────────────────────────────

pub struct MockClock {
    now: Cell<Millis>,
    pub date_time: Option<DateTime>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn at(now: Millis) -> Self {
        Self {
            now: Cell::new(now),
            date_time: None,
        }
    }

    pub fn set(&self, now: Millis) {
        self.now.set(now);
    }

    pub fn advance(&self, ms: Millis) {
        self.now.set(self.now.get() + ms);
    }
}

impl ClockPort for MockClock {
    fn now_ms(&self) -> Millis {
        self.now.get()
    }

    fn date_time(&self) -> Option<DateTime> {
        self.date_time
    }
}

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Valve(bool),
    Pump(u8),
    AllOff,
}

// ── MockHardware ──────────────────────────────────────────────

/// Sensors report a fresh reading every tick unless `online` is false.
pub struct MockHardware {
    pub moisture_raw: u16,
    pub moisture_percent: u8,
    pub water_detected: bool,
    pub online: bool,
    pub calls: Vec<ActuatorCall>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            moisture_raw: 2_000,
            moisture_percent: 40,
            water_detected: false,
            online: true,
            calls: Vec::new(),
        }
    }

    pub fn valve_open(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::Valve(open) => Some(*open),
                ActuatorCall::AllOff => Some(false),
                ActuatorCall::Pump(_) => None,
            })
            .unwrap_or(false)
    }

    pub fn pump_duty(&self) -> u8 {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::Pump(duty) => Some(*duty),
                ActuatorCall::AllOff => Some(0),
                ActuatorCall::Valve(_) => None,
            })
            .unwrap_or(0)
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn sample(&mut self, now: Millis) -> Option<SensorSnapshot> {
        self.online.then(|| SensorSnapshot {
            moisture_raw: self.moisture_raw,
            moisture_percent: self.moisture_percent,
            water_raw: if self.water_detected { 3_000 } else { 0 },
            water_detected: self.water_detected,
            read_at_ms: now,
        })
    }
}

impl ActuatorPort for MockHardware {
    fn set_valve(&mut self, open: bool) {
        self.calls.push(ActuatorCall::Valve(open));
    }

    fn set_pump(&mut self, duty: u8) {
        self.calls.push(ActuatorCall::Pump(duty));
    }

    fn all_off(&mut self) {
        self.calls.push(ActuatorCall::AllOff);
    }
}

// ── MockDisplay ───────────────────────────────────────────────

#[derive(Default)]
pub struct MockDisplay {
    pub rows: [String; 2],
    row: usize,
    pub redraws: usize,
}

impl DisplayPort for MockDisplay {
    fn clear(&mut self) {
        self.redraws += 1;
        self.rows = Default::default();
    }

    fn set_cursor(&mut self, _col: u8, row: u8) {
        self.row = usize::from(row).min(1);
    }

    fn print(&mut self, text: &str) {
        self.rows[self.row].push_str(text);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── MemoryConfig ──────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryConfig {
    pub stored: RefCell<Option<Settings>>,
    pub fail_writes: Cell<bool>,
}

impl ConfigPort for MemoryConfig {
    fn load(&self) -> Result<Settings, ConfigError> {
        Ok(self.stored.borrow().clone().unwrap_or_default())
    }

    fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        settings.validate()?;
        if self.fail_writes.get() {
            return Err(ConfigError::IoError);
        }
        *self.stored.borrow_mut() = Some(settings.clone());
        Ok(())
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// A started service wired to every mock.
pub struct Rig {
    pub app: AppService,
    pub clock: MockClock,
    pub hw: MockHardware,
    pub display: MockDisplay,
    pub sink: RecordingSink,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(settings: Settings, now: Millis) -> Self {
        let clock = MockClock::at(now);
        let mut sink = RecordingSink::default();
        let mut app = AppService::new(ControllerConfig::default(), settings, now);
        app.start(&mut sink);
        let mut rig = Self {
            app,
            clock,
            hw: MockHardware::new(),
            display: MockDisplay::default(),
            sink,
        };
        rig.step(None);
        rig
    }

    pub fn calibrated(unit_ms: u32) -> Self {
        Self::new(
            Settings {
                unit_duration_ms: unit_ms,
                ..Settings::default()
            },
            1_000,
        )
    }

    pub fn step(&mut self, input: Option<ButtonRole>) {
        self.app.tick(
            input,
            &self.clock,
            &mut self.hw,
            &mut self.display,
            &mut self.sink,
        );
    }

    pub fn press(&mut self, role: ButtonRole) {
        self.clock.advance(10);
        self.step(Some(role));
    }

    pub fn press_all(&mut self, roles: &[ButtonRole]) {
        for role in roles {
            self.press(*role);
        }
    }

    /// Advance the clock and run one idle tick.
    pub fn wait(&mut self, ms: Millis) {
        self.clock.advance(ms);
        self.step(None);
    }

    pub fn row(&self, row: usize) -> &str {
        &self.display.rows[row]
    }
}
