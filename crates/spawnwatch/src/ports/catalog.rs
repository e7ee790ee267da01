//! Resource Catalog Port
//!
//! Read access to the resources spawning on each server, plus the one write
//! the core ever makes: marking a resource depleted.

use chrono::{DateTime, Utc};

use crate::domain::{Resource, ResourceClass, ResourceKey};

/// Catalog of spawning resources and the class taxonomy
pub trait ResourceCatalog: Send + Sync {
    /// Resources currently spawning on a server
    fn spawning(&self, server: &str) -> Vec<Resource>;

    /// Look up one resource, spawning or not
    fn resource(&self, key: &ResourceKey) -> Option<Resource>;

    /// Live depletion flag
    fn is_depleted(&self, key: &ResourceKey) -> bool {
        self.resource(key).map(|r| r.depleted).unwrap_or(false)
    }

    /// Resolve a class token, as used in guard files
    fn resource_class(&self, token: &str) -> Option<ResourceClass>;

    /// Flag a resource depleted; returns false when it is unknown
    fn mark_depleted(&self, key: &ResourceKey, when: DateTime<Utc>) -> bool;
}
