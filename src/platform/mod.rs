//! Platform layer
//!
//! Drives a [`crate::Simulation`] at a fixed wall-clock cadence on its own thread and
//! feeds it commands from other threads.

pub mod autopilot;
pub mod driver;

pub use driver::{DriverError, DriverOptions, GameHandle, GameLoop};
