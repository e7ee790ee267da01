//! Ports (Interfaces)
//!
//! Abstract interfaces that define how the core interacts with the systems
//! around it: the resource catalog, preferences, time, sound output and the
//! remote data service.
//!
//! Implementations of these traits live in `adapters` or in the front end.

mod alert_sink;
mod catalog;
mod clock;
mod preferences;
mod reporter;

pub use alert_sink::*;
pub use catalog::*;
pub use clock::*;
pub use preferences::*;
pub use reporter::*;
