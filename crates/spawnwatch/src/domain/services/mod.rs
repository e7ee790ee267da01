//! Domain Services
//!
//! Pure decision logic over domain entities. Time comes in as an argument
//! and the catalog as a port, so every rule can be replayed deterministically.

pub mod guard_engine;
pub mod guard_file;
pub mod harvester_scan;
pub mod inventory_ledger;
pub mod monitor_tracker;

pub use guard_engine::{GuardScanReport, GuardScanWindow};
pub use guard_file::GuardImport;
pub use harvester_scan::{
    HarvesterScanReport, HarvesterScanWindow, HarvesterStatus, IdleReason, WarningReason,
};
pub use inventory_ledger::{AddOutcome, InventoryLedger};
