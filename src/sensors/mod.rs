//! Sensor subsystem: soil probes and the ambient sensor.
//!
//! Both feed the [`StateStore`](crate::state::StateStore) through its
//! field-group writers.  Read failures never touch the store.

pub mod ambient;
pub mod moisture;
