//! 16x2 character LCD behind a PCF8574 I²C backpack, as a [`DisplayPort`].
//!
//! The controller protocol lives in `i2c-character-display`; this adapter
//! only maps text onto the character ROM and keeps bus errors out of the
//! control loop.  The display is write-only.  Bus errors are logged once
//! and otherwise ignored, so a loose cable never stalls a tick.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use heapless::String;
use i2c_character_display::{CharacterDisplayPCF8574T, LcdDisplayType};
use log::warn;

use crate::app::ports::DisplayPort;

pub const COLS: u8 = 16;
pub const ROWS: u8 = 2;

/// Error raised while bringing up the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LcdInitError {
    pub address: u8,
}

impl core::fmt::Display for LcdInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "no LCD answering at 0x{:02x}", self.address)
    }
}

/// Map `text` onto ROM A00, which covers printable ASCII only, and cut it
/// to one display row.
pub fn rom_text(text: &str) -> String<{ COLS as usize }> {
    let mut out = String::new();
    for c in text.chars() {
        let c = if c.is_ascii() && !c.is_ascii_control() { c } else { '?' };
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

pub struct Lcd1602<I: I2c, D: DelayNs> {
    lcd: CharacterDisplayPCF8574T<I, D>,
    bus_fault_logged: bool,
}

impl<I: I2c, D: DelayNs> Lcd1602<I, D> {
    /// Initialise the controller and switch the backlight on.
    pub fn new(i2c: I, delay: D, address: u8) -> Result<Self, LcdInitError> {
        let mut lcd =
            CharacterDisplayPCF8574T::new_with_address(i2c, address, LcdDisplayType::Lcd16x2, delay);
        lcd.init().map_err(|_| LcdInitError { address })?;
        lcd.backlight(true).map_err(|_| LcdInitError { address })?;
        Ok(Self {
            lcd,
            bus_fault_logged: false,
        })
    }

    fn check<T, E>(&mut self, result: Result<T, E>) {
        if result.is_err() && !self.bus_fault_logged {
            warn!("LCD: I2C write failed, display output degraded");
            self.bus_fault_logged = true;
        }
    }
}

impl<I: I2c, D: DelayNs> DisplayPort for Lcd1602<I, D> {
    fn clear(&mut self) {
        let result = self.lcd.clear().map(|_| ());
        self.check(result);
    }

    fn set_cursor(&mut self, col: u8, row: u8) {
        let result = self
            .lcd
            .set_cursor(col.min(COLS - 1), row.min(ROWS - 1))
            .map(|_| ());
        self.check(result);
    }

    fn print(&mut self, text: &str) {
        let text = rom_text(text);
        let result = self.lcd.print(&text).map(|_| ());
        self.check(result);
    }
}
