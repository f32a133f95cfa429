//! Plantwater controller library.
//!
//! Exposes the pure-logic modules for integration testing and host-side
//! simulation. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod calibration;
pub mod clock;
pub mod config;
pub mod error;
pub mod menu;
pub mod pump;
pub mod safety;
pub mod scheduler;

pub mod pins;

// Hardware-facing modules. The ESP-IDF implementations are guarded by cfg
// attributes inside; the host build gets simulation stand-ins.
pub mod adapters;
pub mod drivers;
pub mod sensors;
