//! Fuzz target: `POST /api/control` bodies
//!
//! Feeds arbitrary bytes to the control boundary and verifies:
//! - No panics under arbitrary input
//! - A rejected body leaves the shared state untouched
//! - An accepted body never arms an expiry without a pump command
//!
//! cargo fuzz run fuzz_control_command

#![no_main]

use agronode::app::commands::parse_control;
use agronode::state::StateStore;
use libfuzzer_sys::fuzz_target;

// Link the host critical-section impl.
use critical_section as _;

fuzz_target!(|data: &[u8]| {
    let store = StateStore::default();
    store.set_pump(true, 9_000);
    let before = store.snapshot();

    match parse_control(data) {
        Ok(cmd) => {
            cmd.apply(&store, 1_000);
            let after = store.snapshot();
            if cmd.pump.is_none() {
                assert_eq!(after.pump_expiry_ms, before.pump_expiry_ms);
                assert_eq!(after.pump_on, before.pump_on);
            }
            assert_eq!(after.soil, before.soil);
            assert_eq!(after.mode, before.mode);
        }
        Err(_) => assert_eq!(store.snapshot(), before),
    }
});
