//! Plantwater firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter   SystemClock     │
//! │  (Sensor+Actuator) (EventSink)    (ConfigPort) (ClockPort)     │
//! │  ButtonPanel       Lcd1602                                     │
//! │  (button edges)    (DisplayPort)                               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Menu · Safety · Scheduler · Pump sequencer            │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::{AnyIOPin, Input, PinDriver, Pull};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use log::{error, info, warn};

use plantwater::adapters::hardware::HardwareAdapter;
use plantwater::adapters::log_sink::LogEventSink;
use plantwater::adapters::nvs::NvsAdapter;
use plantwater::adapters::time::SystemClock;
use plantwater::app::ports::ClockPort;
use plantwater::app::service::AppService;
use plantwater::config::ControllerConfig;
use plantwater::drivers::button::ButtonPanel;
use plantwater::drivers::lcd::Lcd1602;
use plantwater::drivers::pump::PumpDriver;
use plantwater::drivers::valve::ValveDriver;
use plantwater::pins;
use plantwater::sensors::SensorHub;

/// Claim a GPIO by its number in [`pins`].
fn gpio(num: i32) -> AnyIOPin {
    // SAFETY: each pin number in `pins` is claimed exactly once, here in
    // main, and `peripherals.pins` is never used.
    unsafe { AnyIOPin::new(num) }
}

fn input_pin<'d>(num: i32) -> Result<PinDriver<'d, AnyIOPin, Input>> {
    let mut driver = PinDriver::input(gpio(num))?;
    driver.set_pull(Pull::Up)?;
    Ok(driver)
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Plantwater v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Raw peripherals (ADC, LEDC, GPIO outputs) ──────────
    if let Err(e) = plantwater::drivers::hw_init::init_peripherals() {
        // Without the actuator outputs in a known state nothing is safe.
        error!("HAL init failed: {}, halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }

    let config = ControllerConfig::default();
    let peripherals = Peripherals::take()?;

    // ── 3. Button panel ───────────────────────────────────────
    let mut panel = ButtonPanel::new(
        [
            input_pin(pins::BUTTON_DEC_GPIO)?,
            input_pin(pins::BUTTON_INC_GPIO)?,
            input_pin(pins::BUTTON_OK_GPIO)?,
            input_pin(pins::BUTTON_BACK_GPIO)?,
        ],
        config.debounce_ms,
    );

    // ── 4. Display ────────────────────────────────────────────
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        gpio(pins::I2C_SDA_GPIO),
        gpio(pins::I2C_SCL_GPIO),
        &I2cConfig::new().baudrate(Hertz(100_000)),
    )?;
    let mut display = match Lcd1602::new(i2c, Ets, pins::LCD_I2C_ADDRESS) {
        Ok(lcd) => lcd,
        Err(e) => {
            error!("LCD init failed: {}", e);
            return Err(anyhow::anyhow!("display unavailable"));
        }
    };

    // ── 5. Adapters ───────────────────────────────────────────
    let mut hw = HardwareAdapter::new(SensorHub::new(&config), PumpDriver::new(), ValveDriver::new());
    let storage = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            NvsAdapter::default()
        }
    };
    let settings = storage.load_or_default();
    let clock = SystemClock::new();
    let mut sink = LogEventSink::new();

    // ── 6. Application service ────────────────────────────────
    let loop_interval_ms = config.loop_interval_ms;
    let mut service = AppService::new(config, settings, clock.now_ms());
    service.start(&mut sink);

    info!("Entering control loop ({} ms tick)", loop_interval_ms);

    // ── 7. Control loop ───────────────────────────────────────
    loop {
        let input = panel.poll(clock.now_ms());
        service.tick(input, &clock, &mut hw, &mut display, &mut sink);
        service.save_settings_if_requested(&storage, &mut sink);
        FreeRtos::delay_ms(loop_interval_ms);
    }
}
