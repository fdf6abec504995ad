//! Fuzz target: forecast response decoding
//!
//! Arbitrary bodies must either decode or fail with `Decode`; nothing
//! panics.
//!
//! cargo fuzz run fuzz_forecast_body

#![no_main]

use agronode::adapters::forecast::parse_forecast;
use agronode::error::NetworkError;
use agronode::state::ForecastUpdate;
use libfuzzer_sys::fuzz_target;

use critical_section as _;

fuzz_target!(|data: &[u8]| {
    match parse_forecast(data, &ForecastUpdate::default()) {
        Ok(_) => {}
        Err(e) => assert_eq!(e, NetworkError::Decode),
    }
});
