//! Depletion Reporter Port
//!
//! Abstract interface for telling the remote data service that a resource
//! is gone. Implementations live outside the core and are free to use the
//! network; failures come back as a `RemoteFault`.
//!
//! # Example
//!
//! ```rust,ignore
//! use spawnwatch::ports::DepletionReporter;
//!
//! struct HttpReporter { /* http client */ }
//!
//! #[async_trait]
//! impl DepletionReporter for HttpReporter {
//!     async fn report_depleted(&self, resource: &Resource) -> Result<(), RemoteFault> {
//!         // POST to the data service
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::domain::{RemoteFault, Resource};

#[async_trait]
pub trait DepletionReporter: Send + Sync {
    /// Report a resource as depleted
    async fn report_depleted(&self, resource: &Resource) -> Result<(), RemoteFault>;
}
