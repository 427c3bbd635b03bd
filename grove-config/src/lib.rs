//! Configuration generation and loading utilities for Grove.
//!
//! The engine itself only consumes [`grove_core::ScanSettings`]; this crate
//! layers file- and environment-based overrides on top and wires up the
//! tracing subscriber for binaries embedding the engine.

pub mod logging;
pub mod settings;

pub use settings::{ConfigSource, GroveConfig};
