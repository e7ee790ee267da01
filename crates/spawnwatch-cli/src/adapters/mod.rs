//! File-backed adapters for the CLI

pub mod snapshot;

pub use snapshot::{load_catalog, read_snapshot};
