//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters, or against the host simulation of the sensor
//! hub.  All tests run on the host (x86_64) with no real hardware
//! required.

mod menu_flow_tests;
mod mock_hw;
mod sensor_pipeline_tests;
mod service_tests;
