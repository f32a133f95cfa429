//! Time primitives shared by every control-loop component.
//!
//! All interval arithmetic in the firmware is done in one canonical unit:
//! milliseconds on a 64-bit monotonic counter.  A `u64` millisecond counter
//! does not wrap within the lifetime of the device, so elapsed time is a
//! plain saturating subtraction.  Values persisted in coarser units
//! (minutes) are converted exactly once at the configuration boundary.

use core::fmt;

/// Milliseconds since boot (monotonic).
pub type Millis = u64;

pub const MS_PER_SEC: Millis = 1_000;
pub const MS_PER_MIN: Millis = 60 * MS_PER_SEC;
pub const MS_PER_HOUR: Millis = 60 * MS_PER_MIN;

/// Time elapsed from `since` to `now`.
///
/// Saturates at zero if `since` lies in the future (e.g. a timestamp taken
/// after `now` was sampled within the same tick).
#[inline]
pub fn elapsed(now: Millis, since: Millis) -> Millis {
    now.saturating_sub(since)
}

/// Wall-clock date and time, used purely for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

impl fmt::Display for DateTime {
    /// `HH:MM DD/MM`, fits the left half of a 16-column line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02} {:02}/{:02}",
            self.hour, self.minute, self.day, self.month
        )
    }
}

/// Compact human duration: `45s`, `12m`, `3h20m`, `2d4h`.
pub struct Compact(pub Millis);

impl fmt::Display for Compact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0 / MS_PER_SEC;
        let mins = secs / 60;
        let hours = mins / 60;
        let days = hours / 24;
        if days > 0 {
            write!(f, "{}d{}h", days, hours % 24)
        } else if hours > 0 {
            write!(f, "{}h{}m", hours, mins % 60)
        } else if mins > 0 {
            write!(f, "{}m", mins)
        } else {
            write!(f, "{}s", secs)
        }
    }
}
