//! Sampling through the real `SensorHub` and `HardwareAdapter`, fed by the
//! host-side ADC injection points.
//!
//! The injected ADC values are process-wide, so this binary keeps a single
//! test that touches them.

use crate::mock_hw::{MockClock, MockDisplay, RecordingSink};

use plantwater::adapters::hardware::HardwareAdapter;
use plantwater::app::context::SensorSnapshot;
use plantwater::app::events::AppEvent;
use plantwater::app::service::AppService;
use plantwater::clock::Millis;
use plantwater::config::{ControllerConfig, Settings};
use plantwater::drivers::pump::PumpDriver;
use plantwater::drivers::valve::ValveDriver;
use plantwater::error::SafetyFault;
use plantwater::sensors::SensorHub;
use plantwater::sensors::moisture::sim_set_moisture_raw;
use plantwater::sensors::water::sim_set_water_raw;

struct Bench {
    app: AppService,
    clock: MockClock,
    hw: HardwareAdapter,
    display: MockDisplay,
    sink: RecordingSink,
}

impl Bench {
    fn new() -> Self {
        let config = ControllerConfig::default();
        let hw = HardwareAdapter::new(SensorHub::new(&config), PumpDriver::new(), ValveDriver::new());
        let mut sink = RecordingSink::default();
        let mut app = AppService::new(config, Settings::default(), 0);
        app.start(&mut sink);
        Self {
            app,
            clock: MockClock::at(0),
            hw,
            display: MockDisplay::default(),
            sink,
        }
    }

    fn tick_at(&mut self, now: Millis) {
        self.clock.set(now);
        self.app.tick(
            None,
            &self.clock,
            &mut self.hw,
            &mut self.display,
            &mut self.sink,
        );
    }

    fn faults_raised(&self, mask: u8) -> usize {
        self.sink
            .count(|e| matches!(e, AppEvent::FaultDetected(m) if *m == mask))
    }
}

#[test]
fn simulated_adc_drives_snapshot_and_fault_edges() {
    // Halfway between the dry (1200) and wet (3520) calibration points.
    sim_set_moisture_raw(2_360);
    sim_set_water_raw(0);
    let mut bench = Bench::new();

    // Sensors power up; nothing read yet.
    bench.tick_at(0);
    assert_eq!(bench.app.context().sensors, None);
    assert_eq!(bench.display.rows[0], "Soil: ERR");

    bench.tick_at(200);
    assert_eq!(
        bench.app.context().sensors,
        Some(SensorSnapshot {
            moisture_raw: 2_360,
            moisture_percent: 50,
            water_raw: 0,
            water_detected: false,
            read_at_ms: 200,
        })
    );
    assert_eq!(bench.app.fault_flags(), 0);
    assert_eq!(bench.display.rows[0], "Soil: 50%");
    assert_eq!(bench.sink.count(|e| matches!(e, AppEvent::FaultCleared)), 1);

    // Saturated soil and a flooded saucer arrive on the next cycle.
    sim_set_moisture_raw(3_520);
    sim_set_water_raw(2_000);
    bench.tick_at(1_000);
    assert_eq!(bench.app.context().sensors.map(|s| s.read_at_ms), Some(200));
    bench.tick_at(1_200);

    let snap = bench.app.context().sensors;
    assert_eq!(snap.map(|s| s.moisture_percent), Some(100));
    assert_eq!(snap.map(|s| s.water_detected), Some(true));
    let gates = SafetyFault::SoilWet.mask() | SafetyFault::WaterDetected.mask();
    assert_eq!(bench.app.fault_flags(), gates);
    assert_eq!(bench.faults_raised(gates), 1);
    assert_eq!(bench.display.rows[0], "Soil: 100% H2O");

    // A reading past the ADC range is a health fault, not wet soil.
    sim_set_moisture_raw(4_096);
    bench.tick_at(2_000);
    bench.tick_at(2_200);
    assert_eq!(
        bench.app.fault_flags(),
        SafetyFault::SensorOutOfRange.mask() | SafetyFault::WaterDetected.mask()
    );
    assert_eq!(bench.faults_raised(SafetyFault::SensorOutOfRange.mask()), 1);
    assert_eq!(bench.display.rows[0], "Soil: ERR");
    assert!(!bench.hw.is_pump_running());
    assert!(!bench.hw.is_valve_open());

    sim_set_moisture_raw(2_000);
    sim_set_water_raw(0);
}
