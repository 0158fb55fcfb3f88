//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! through the command engine, using the host simulation adapters and
//! the recording doubles in `mock_hw`. All tests run on the host
//! (x86_64) with no real hardware required.

mod alarm_tests;
mod light_tests;
mod mock_hw;
mod protocol_tests;
