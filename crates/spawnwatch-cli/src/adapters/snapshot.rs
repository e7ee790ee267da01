//! Resource snapshot files
//!
//! JSON with the class taxonomy and the spawning resources; resources name
//! their class by token.
//!
//! ```json
//! {
//!   "classes": [{ "token": "steel", "name": "Steel", "caps": { "OQ": { "min": 1, "max": 1000 } } }],
//!   "resources": [{ "server": "Bria", "name": "Odarium", "class": "steel",
//!                   "stats": { "OQ": 912 }, "first_seen": "2024-06-01T10:00:00Z" }]
//! }
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use spawnwatch::adapters::InMemoryCatalog;
use spawnwatch::{Resource, ResourceClass, ResourceKey, StatValues};

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    classes: Vec<ResourceClass>,
    #[serde(default)]
    resources: Vec<SnapshotResource>,
}

#[derive(Debug, Deserialize)]
struct SnapshotResource {
    server: String,
    name: String,
    class: String,
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    stats: StatValues,
    first_seen: DateTime<Utc>,
    #[serde(default)]
    depleted: bool,
}

/// Classes and resources read from one snapshot file
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub classes: Vec<ResourceClass>,
    /// Resources grouped by server
    pub servers: BTreeMap<String, Vec<Resource>>,
}

impl Snapshot {
    /// Fresh catalog holding this snapshot
    pub fn into_catalog(self) -> InMemoryCatalog {
        let catalog = InMemoryCatalog::new();
        self.apply(&catalog);
        catalog
    }

    /// Replace the listed servers in an existing catalog
    ///
    /// Servers absent from the snapshot keep their resources. Returns the
    /// servers that were replaced.
    pub fn apply(self, catalog: &InMemoryCatalog) -> Vec<String> {
        for class in self.classes {
            catalog.insert_class(class);
        }
        let mut replaced = Vec::with_capacity(self.servers.len());
        for (server, resources) in self.servers {
            catalog.replace_server(&server, resources);
            replaced.push(server);
        }
        replaced
    }
}

/// Read a snapshot file into a catalog
pub fn load_catalog(path: &Path) -> Result<InMemoryCatalog> {
    Ok(read_snapshot(path)?.into_catalog())
}

pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot from {:?}", path))?;
    parse_snapshot(&content).with_context(|| format!("Invalid snapshot {:?}", path))
}

pub fn parse_snapshot(content: &str) -> Result<Snapshot> {
    let file: SnapshotFile = serde_json::from_str(content).context("Failed to parse snapshot JSON")?;

    let classes: BTreeMap<&str, &ResourceClass> =
        file.classes.iter().map(|c| (c.token.as_str(), c)).collect();
    let mut servers: BTreeMap<String, Vec<Resource>> = BTreeMap::new();
    for entry in file.resources {
        let class = classes.get(entry.class.trim()).with_context(|| {
            format!("Resource {} has unknown class '{}'", entry.name, entry.class)
        })?;
        let mut resource = Resource::new(
            ResourceKey::new(entry.server.clone(), entry.name),
            (*class).clone(),
            entry.stats,
            entry.first_seen,
        );
        resource.id = entry.id;
        resource.depleted = entry.depleted;
        servers.entry(entry.server).or_default().push(resource);
    }

    tracing::debug!(
        "Read snapshot with {} classes over {} servers",
        file.classes.len(),
        servers.len()
    );
    Ok(Snapshot {
        classes: file.classes,
        servers,
    })
}
