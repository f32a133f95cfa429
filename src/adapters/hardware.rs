//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`] and the pump and valve drivers, exposing them
//! through [`SensorPort`] and [`ActuatorPort`].  This is the only module
//! in the system that touches the watering hardware.  On non-espidf
//! targets the underlying drivers use cfg-gated simulation stubs.

use crate::app::context::SensorSnapshot;
use crate::app::ports::{ActuatorPort, SensorPort};
use crate::clock::Millis;
use crate::drivers::pump::PumpDriver;
use crate::drivers::valve::ValveDriver;
use crate::sensors::SensorHub;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    sensor_hub: SensorHub,
    pump: PumpDriver,
    valve: ValveDriver,
}

impl HardwareAdapter {
    pub fn new(sensor_hub: SensorHub, pump: PumpDriver, valve: ValveDriver) -> Self {
        Self {
            sensor_hub,
            pump,
            valve,
        }
    }

    pub fn is_pump_running(&self) -> bool {
        self.pump.is_running()
    }

    pub fn is_valve_open(&self) -> bool {
        self.valve.is_open()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl SensorPort for HardwareAdapter {
    fn sample(&mut self, now: Millis) -> Option<SensorSnapshot> {
        self.sensor_hub.poll(now)
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for HardwareAdapter {
    fn set_valve(&mut self, open: bool) {
        self.valve.set(open);
    }

    fn set_pump(&mut self, duty: u8) {
        if duty == 0 {
            self.pump.stop();
        } else {
            self.pump.set(duty);
        }
    }

    fn all_off(&mut self) {
        self.pump.stop();
        self.valve.set(false);
    }
}
