//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host (x86_64) with no
//! real hardware required.

mod control_tests;
mod irrigation_scenarios;
mod mock_hw;
mod network_tests;
mod scheduler_tests;
mod service_tests;
mod store_tests;
