//! Sensor subsystem: individual probes and the aggregating [`SensorHub`].
//!
//! Both probes share one power rail that is switched on only while a
//! sample is taken, to slow electrode corrosion.  The hub runs the
//! power → warm-up → read → power-off sequence as a non-blocking phase
//! machine and caches the last complete [`SensorSnapshot`].

pub mod moisture;
pub mod water;

use log::{debug, info};

use crate::app::context::SensorSnapshot;
use crate::clock::{Millis, elapsed};
use crate::config::ControllerConfig;
use crate::drivers::hw_init;
use crate::pins;
use moisture::MoistureSensor;
use water::WaterSensor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplePhase {
    /// Probes unpowered until `next_at`.
    Idle { next_at: Millis },
    /// Probes powered since `since`; read once the warm-up has passed.
    WarmingUp { since: Millis },
}

/// Aggregates both probes and produces a unified snapshot.
pub struct SensorHub {
    pub moisture: MoistureSensor,
    pub water: WaterSensor,
    phase: SamplePhase,
    warmup_ms: Millis,
    interval_ms: Millis,
    last: Option<SensorSnapshot>,
    samples: u32,
}

impl SensorHub {
    pub fn new(config: &ControllerConfig) -> Self {
        hw_init::gpio_write(pins::SENSOR_POWER_GPIO, false);
        Self {
            moisture: MoistureSensor::new(config.moisture_dry_raw, config.moisture_wet_raw),
            water: WaterSensor::new(config.water_detect_threshold_raw),
            phase: SamplePhase::Idle { next_at: 0 },
            warmup_ms: Millis::from(config.sensor_warmup_ms),
            interval_ms: Millis::from(config.sensor_sample_interval_ms),
            last: None,
            samples: 0,
        }
    }

    /// Advance the sampling sequence and return the latest snapshot.
    ///
    /// Returns the cached snapshot between samples, `None` until the
    /// first sample completes.
    pub fn poll(&mut self, now: Millis) -> Option<SensorSnapshot> {
        match self.phase {
            SamplePhase::Idle { next_at } if now >= next_at => {
                hw_init::gpio_write(pins::SENSOR_POWER_GPIO, true);
                self.phase = SamplePhase::WarmingUp { since: now };
            }
            SamplePhase::WarmingUp { since } if elapsed(now, since) >= self.warmup_ms => {
                let snapshot = self.read_now(now);
                hw_init::gpio_write(pins::SENSOR_POWER_GPIO, false);
                self.phase = SamplePhase::Idle {
                    next_at: since + self.interval_ms,
                };
                if self.samples == 0 {
                    info!(
                        "Sensors: first sample moisture={}% (raw {}), water raw {}",
                        snapshot.moisture_percent, snapshot.moisture_raw, snapshot.water_raw
                    );
                } else {
                    debug!(
                        "Sensors: moisture={}% (raw {}), water raw {}{}",
                        snapshot.moisture_percent,
                        snapshot.moisture_raw,
                        snapshot.water_raw,
                        if snapshot.water_detected { " DETECTED" } else { "" }
                    );
                }
                self.samples = self.samples.saturating_add(1);
                self.last = Some(snapshot);
            }
            _ => {}
        }
        self.last
    }

    fn read_now(&self, now: Millis) -> SensorSnapshot {
        let m = self.moisture.read();
        let w = self.water.read();
        SensorSnapshot {
            moisture_raw: m.raw,
            moisture_percent: m.percent,
            water_raw: w.raw,
            water_detected: w.detected,
            read_at_ms: now,
        }
    }

    pub fn is_powered(&self) -> bool {
        matches!(self.phase, SamplePhase::WarmingUp { .. })
    }
}
