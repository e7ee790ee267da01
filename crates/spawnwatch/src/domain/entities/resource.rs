//! Resource - A spawned resource on one server
//!
//! Owned by the catalog; the core only reads it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ResourceClass, StatValues};

/// Identity of a resource: its name on a given server
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    pub server: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(server: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.server)
    }
}

/// Resource instance as reported by the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub key: ResourceKey,
    /// Catalog id; resources without one cannot be monitored
    #[serde(default)]
    pub id: Option<i64>,
    pub class: ResourceClass,
    #[serde(default)]
    pub stats: StatValues,
    /// When the resource was first reported available
    pub first_seen: DateTime<Utc>,
    #[serde(default)]
    pub depleted: bool,
}

impl Resource {
    pub fn new(
        key: ResourceKey,
        class: ResourceClass,
        stats: StatValues,
        first_seen: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            id: None,
            class,
            stats,
            first_seen,
            depleted: false,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn server(&self) -> &str {
        &self.key.server
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Resource {}

impl std::hash::Hash for Resource {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}
