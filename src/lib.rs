//! AgroNode irrigation controller library.
//!
//! Exposes the pure-logic modules for integration testing and host
//! simulation.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod irrigation;
pub mod mode;
pub mod network;
pub mod pins;
pub mod safety;
pub mod scheduler;
pub mod state;

pub mod adapters;
pub mod drivers;
pub mod sensors;
