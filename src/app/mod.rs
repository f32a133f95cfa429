//! Application core: pure domain logic, zero I/O.
//!
//! Everything that decides what the controller does lives here or in the
//! domain modules it orchestrates (menu, scheduler, pump sequencer,
//! calibration, safety).  All interaction with hardware happens through
//! the **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod commands;
pub mod context;
pub mod events;
pub mod ports;
pub mod render;
pub mod service;
