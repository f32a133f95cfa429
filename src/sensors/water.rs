//! Water-presence probe in the plant saucer.
//!
//! Analog probe: the reading rises when the electrodes are bridged by
//! standing water.  Water is reported when the raw value exceeds the
//! configured threshold.
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

static SIM_WATER_ADC: AtomicU16 = AtomicU16::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_water_raw(raw: u16) {
    SIM_WATER_ADC.store(raw, Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaterReading {
    pub raw: u16,
    pub detected: bool,
}

pub struct WaterSensor {
    threshold_raw: u16,
}

impl WaterSensor {
    pub fn new(threshold_raw: u16) -> Self {
        Self { threshold_raw }
    }

    pub fn read(&self) -> WaterReading {
        let raw = self.read_adc();
        WaterReading {
            raw,
            detected: self.is_detected(raw),
        }
    }

    pub fn is_detected(&self, raw: u16) -> bool {
        raw > self.threshold_raw
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> u16 {
        // Treat a failed conversion as water present: the run is refused.
        hw_init::adc1_read(pins::ADC1_CH_WATER).unwrap_or(u16::MAX)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> u16 {
        SIM_WATER_ADC.load(Ordering::Relaxed)
    }
}
