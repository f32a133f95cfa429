//! Polled, debounced four-button panel.
//!
//! ## Hardware
//!
//! Four active-low momentary switches with pull-ups, read through
//! [`embedded_hal::digital::InputPin`].  No interrupts: the control loop
//! polls every channel once per tick.
//!
//! ## Debounce rule
//!
//! A level change is accepted only when **both** hold:
//!
//! 1. the raw level has been continuously stable for `debounce_ms`, and
//! 2. at least `debounce_ms` has passed since the previous accepted change.
//!
//! Only released → pressed transitions produce an [`Edge::Pressed`]; a held
//! button never repeats.  A pin read error counts as released.

use embedded_hal::digital::InputPin;
use log::debug;

use crate::clock::{Millis, elapsed};

/// Fixed function of each button, in scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonRole {
    Decrement,
    Increment,
    Confirm,
    Back,
}

impl ButtonRole {
    pub const ALL: [Self; 4] = [Self::Decrement, Self::Increment, Self::Confirm, Self::Back];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    None,
    Pressed,
}

// ── Single channel ────────────────────────────────────────────

pub struct ButtonChannel<P> {
    pin: P,
    role: ButtonRole,
    debounce_ms: Millis,
    /// Last accepted level.
    pressed: bool,
    last_change_ms: Millis,
    /// Raw level waiting to become stable.
    candidate: bool,
    candidate_since_ms: Millis,
}

impl<P: InputPin> ButtonChannel<P> {
    pub fn new(pin: P, role: ButtonRole, debounce_ms: u32) -> Self {
        Self {
            pin,
            role,
            debounce_ms: Millis::from(debounce_ms),
            pressed: false,
            last_change_ms: 0,
            candidate: false,
            candidate_since_ms: 0,
        }
    }

    pub fn role(&self) -> ButtonRole {
        self.role
    }

    /// Accepted (debounced) level.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn poll(&mut self, now: Millis) -> Edge {
        let raw = self.pin.is_low().unwrap_or(false);
        if raw != self.candidate {
            self.candidate = raw;
            self.candidate_since_ms = now;
        }

        let stable = elapsed(now, self.candidate_since_ms) >= self.debounce_ms;
        let spaced = elapsed(now, self.last_change_ms) >= self.debounce_ms;
        if self.candidate == self.pressed || !stable || !spaced {
            return Edge::None;
        }

        self.pressed = self.candidate;
        self.last_change_ms = now;
        if self.pressed {
            Edge::Pressed
        } else {
            Edge::None
        }
    }
}

// ── Panel ─────────────────────────────────────────────────────

/// The four channels, scanned in [`ButtonRole::ALL`] order.
pub struct ButtonPanel<P> {
    channels: [ButtonChannel<P>; 4],
}

impl<P: InputPin> ButtonPanel<P> {
    /// Pins in scan order: decrement, increment, confirm, back.
    pub fn new(pins: [P; 4], debounce_ms: u32) -> Self {
        let [dec, inc, ok, back] = pins;
        Self {
            channels: [
                ButtonChannel::new(dec, ButtonRole::Decrement, debounce_ms),
                ButtonChannel::new(inc, ButtonRole::Increment, debounce_ms),
                ButtonChannel::new(ok, ButtonRole::Confirm, debounce_ms),
                ButtonChannel::new(back, ButtonRole::Back, debounce_ms),
            ],
        }
    }

    /// Poll every channel and report the first press in scan order.
    /// Simultaneous presses on later channels are dropped.
    pub fn poll(&mut self, now: Millis) -> Option<ButtonRole> {
        let mut first = None;
        for channel in &mut self.channels {
            if channel.poll(now) == Edge::Pressed {
                match first {
                    None => first = Some(channel.role()),
                    Some(kept) => debug!("Buttons: {:?} dropped, {:?} pressed first", channel.role(), kept),
                }
            }
        }
        first
    }
}
