//! Value Objects
//!
//! Immutable objects defined by their attributes rather than identity.

mod alert;
mod harvester_type;
mod reconcile_mode;
mod resource_class;
mod stat;

pub use alert::*;
pub use harvester_type::*;
pub use reconcile_mode::*;
pub use resource_class::*;
pub use stat::*;
