//! Domain layer - Port definitions
//!
//! The traits the dataset model depends on instead of concrete process
//! spawning and log sinks.

pub mod ports;

pub use ports::*;
