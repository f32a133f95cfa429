//! Resistive/capacitive soil-moisture probe on an ADC1 channel.
//!
//! The probe is powered only while sampling (see [`super::SensorHub`]).
//! Raw readings are mapped linearly between the dry and wet calibration
//! points and clamped to 0–100 %.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the oneshot ADC channel initialised by `hw_init`.
//! On host/test: reads from a static `AtomicU16` for injection.

use core::sync::atomic::{AtomicU16, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

static SIM_MOISTURE_ADC: AtomicU16 = AtomicU16::new(2_000);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_moisture_raw(raw: u16) {
    SIM_MOISTURE_ADC.store(raw, Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoistureReading {
    pub raw: u16,
    pub percent: u8,
}

pub struct MoistureSensor {
    dry_raw: u16,
    wet_raw: u16,
}

impl MoistureSensor {
    pub fn new(dry_raw: u16, wet_raw: u16) -> Self {
        Self { dry_raw, wet_raw }
    }

    pub fn read(&self) -> MoistureReading {
        let raw = self.read_adc();
        MoistureReading {
            raw,
            percent: self.to_percent(raw),
        }
    }

    /// Linear map of `raw` from `[dry, wet]` onto `[0, 100]`, clamped.
    pub fn to_percent(&self, raw: u16) -> u8 {
        let dry = i32::from(self.dry_raw);
        let wet = i32::from(self.wet_raw);
        if dry == wet {
            return 0;
        }
        let pct = (i32::from(raw) - dry) * 100 / (wet - dry);
        pct.clamp(0, 100) as u8
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> u16 {
        // A failed conversion reports as out of range; the safety
        // supervisor turns that into a sensor fault.
        hw_init::adc1_read(pins::ADC1_CH_MOISTURE).unwrap_or(u16::MAX)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> u16 {
        SIM_MOISTURE_ADC.load(Ordering::Relaxed)
    }
}
