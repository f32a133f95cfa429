//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                    |
//! |------------|--------------|--------------------------------|
//! | `hardware` | SensorPort   | ESP32 ADC, sensor power GPIO   |
//! |            | ActuatorPort | ESP32 PWM (pump), GPIO (valve) |
//! | `log_sink` | EventSink    | Serial log output              |
//! | `nvs`      | ConfigPort   | NVS / in-memory store          |
//! | `time`     | ClockPort    | ESP32 system timer, libc clock |
//!
//! The display port is implemented directly by
//! [`Lcd1602`](crate::drivers::lcd::Lcd1602).

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
