//! Spawnwatch Library
//!
//! Decision core of a resource tracker for an online game: alert guards over
//! spawning resources, harvester simulation, depletion monitors and
//! inventory bookkeeping.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain/`): Pure business entities and logic
//!   - `entities/`: Resource, Guard, Harvester, Monitor, InventoryWrapper
//!   - `value_objects/`: Stat, ResourceClass, HarvesterType, AlertLevel, ReconcileMode
//!   - `services/`: Guard engine, harvester scan, monitor tracker,
//!     inventory ledger, guard file codec
//!   - `errors/`: Domain-specific error types
//!
//! - **Ports** (`ports/`): Catalog, preferences, clock, alert sink, depletion reporter
//!
//! - **Application** (`application/`): `ScanCoordinator` and its scheduler
//!
//! - **Adapters** (`adapters/`): In-memory catalog and preferences, tracing alert sink
//!
//! # Usage
//!
//! ```rust,ignore
//! use spawnwatch::{CoordinatorPorts, Collections, ScanCoordinator};
//!
//! let coordinator = ScanCoordinator::new(ports, Collections::default());
//! coordinator.init();
//! if let Some(scan) = coordinator.check() {
//!     let summary = scan.await?;
//!     println!("{}", summary.level);
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

// Re-export commonly used types
pub use application::{
    Collections, CoordinatorPorts, MuteWindow, ScanConfig, ScanCoordinator, ScanSummary,
};
pub use domain::services::{GuardImport, GuardScanReport, HarvesterScanReport, HarvesterStatus};
pub use domain::{
    AlertKind, AlertLevel, DomainError, Guard, GuardLogic, Harvester, HarvesterBonuses,
    HarvesterOwner, HarvesterType, InventoryWrapper, Monitor, ReconcileMode, RemoteFault,
    Resource, ResourceClass, ResourceKey, Stat, StatValues,
};
pub use ports::{
    AlertSink, Clock, DepletionReporter, ManualClock, PrefValue, PreferenceStore,
    ResourceCatalog, SystemClock,
};
