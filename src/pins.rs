//! GPIO / peripheral pin assignments for the ESP32-S3 watering controller
//! board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Buttons (active-low, internal pull-up), in scan order
// ---------------------------------------------------------------------------

pub const BUTTON_DEC_GPIO: i32 = 16;
pub const BUTTON_INC_GPIO: i32 = 17;
pub const BUTTON_OK_GPIO: i32 = 18;
pub const BUTTON_BACK_GPIO: i32 = 21;

// ---------------------------------------------------------------------------
// Pump and valve
// ---------------------------------------------------------------------------

/// LEDC PWM output to the pump MOSFET gate.
pub const PUMP_PWM_GPIO: i32 = 10;
/// Digital output to the valve relay.  HIGH = open.
pub const VALVE_GPIO: i32 = 9;

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// Powers both probes only while sampling (limits electrode corrosion).
pub const SENSOR_POWER_GPIO: i32 = 11;
/// Capacitive soil-moisture probe on GPIO3.
pub const ADC1_CH_MOISTURE: u32 = 2;
/// Water-presence probe in the saucer, on GPIO4.
pub const ADC1_CH_WATER: u32 = 3;

// ---------------------------------------------------------------------------
// I²C bus (character display)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 14;
pub const I2C_SCL_GPIO: i32 = 15;
pub const LCD_I2C_ADDRESS: u8 = 0x27;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC base frequency for the pump motor (25 kHz, inaudible).
pub const PUMP_PWM_FREQ_HZ: u32 = 25_000;
