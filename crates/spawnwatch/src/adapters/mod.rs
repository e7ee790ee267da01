//! Adapters
//!
//! Ready-made implementations of the ports that need no external system.

mod memory;
mod tracing_sink;

pub use memory::*;
pub use tracing_sink::*;
