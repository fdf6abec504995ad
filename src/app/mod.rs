//! Application layer: the port boundary, the per-task glue and the
//! operator-facing documents.
//!
//! Nothing in here touches hardware.  Devices arrive through the traits in
//! [`ports`]; [`service`] turns each task activation into store updates and
//! relay writes; [`runtime`] wraps activations with deadline reporting.

pub mod commands;
pub mod ports;
pub mod runtime;
pub mod service;
pub mod status;
