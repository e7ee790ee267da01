//! Application Layer (Use Cases)
//!
//! Coordinates scans over the domain collections and wires the domain
//! services to the ports.

pub mod alert_gate;
pub mod config;
mod coordinator;
mod scheduler;
pub mod stores;

pub use alert_gate::AlertGate;
pub use config::{keys, MuteWindow, ScanConfig};
pub use coordinator::{
    Collections, CoordinatorPorts, ScanCoordinator, ScanSummary, WeakScanCoordinator,
};
pub use scheduler::{ScanScheduler, SchedulerConfig};
pub use stores::{GuardBook, HarvesterBook, MonitorBook};
