//! Domain Entities
//!
//! Pure domain models without infrastructure dependencies.
//! - Resource: A spawned resource as reported by the catalog
//! - Guard: Filter or weights rule that flags spawns
//! - Harvester: Extraction device with upkeep economics
//! - Monitor: Watch on a resource until it depletes
//! - InventoryWrapper: Stock held by one assignee

mod guard;
mod harvester;
mod inventory;
mod monitor;
mod resource;

pub use guard::*;
pub use harvester::*;
pub use inventory::*;
pub use monitor::*;
pub use resource::*;
