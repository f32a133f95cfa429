//! Normally-closed solenoid valve on a relay output.
//!
//! Binary open/close with no position feedback; callers wait a fixed
//! settle time after every move.

use log::debug;

use crate::drivers::hw_init;
use crate::pins;

pub struct ValveDriver {
    open: bool,
}

impl Default for ValveDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ValveDriver {
    pub fn new() -> Self {
        hw_init::gpio_write(pins::VALVE_GPIO, false);
        Self { open: false }
    }

    pub fn set(&mut self, open: bool) {
        if open != self.open {
            debug!("Valve: {}", if open { "open" } else { "closed" });
        }
        hw_init::gpio_write(pins::VALVE_GPIO, open);
        self.open = open;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}
