//! In-memory adapters
//!
//! Catalog and preference store backed by plain maps, used by the CLI and
//! by tests.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::domain::{Resource, ResourceClass, ResourceKey};
use crate::ports::{PrefValue, PreferenceStore, ResourceCatalog};

/// Catalog held in memory
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    classes: RwLock<BTreeMap<String, ResourceClass>>,
    resources: RwLock<BTreeMap<ResourceKey, Resource>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_class(&self, class: ResourceClass) {
        let mut classes = self.classes.write().unwrap_or_else(|e| e.into_inner());
        classes.insert(class.token.clone(), class);
    }

    /// Add or replace a resource; its class becomes resolvable as well
    pub fn insert(&self, resource: Resource) {
        {
            let mut classes = self.classes.write().unwrap_or_else(|e| e.into_inner());
            classes
                .entry(resource.class.token.clone())
                .or_insert_with(|| resource.class.clone());
        }
        let mut resources = self.resources.write().unwrap_or_else(|e| e.into_inner());
        resources.insert(resource.key.clone(), resource);
    }

    /// Replace every resource of one server, depleted ones included
    pub fn replace_server(&self, server: &str, spawning: Vec<Resource>) {
        {
            let mut resources = self.resources.write().unwrap_or_else(|e| e.into_inner());
            resources.retain(|key, _| key.server != server);
        }
        for resource in spawning {
            self.insert(resource);
        }
    }

    pub fn len(&self) -> usize {
        self.resources.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceCatalog for InMemoryCatalog {
    fn spawning(&self, server: &str) -> Vec<Resource> {
        let resources = self.resources.read().unwrap_or_else(|e| e.into_inner());
        resources
            .values()
            .filter(|r| r.key.server == server && !r.depleted)
            .cloned()
            .collect()
    }

    fn resource(&self, key: &ResourceKey) -> Option<Resource> {
        let resources = self.resources.read().unwrap_or_else(|e| e.into_inner());
        resources.get(key).cloned()
    }

    fn resource_class(&self, token: &str) -> Option<ResourceClass> {
        let classes = self.classes.read().unwrap_or_else(|e| e.into_inner());
        classes.get(token.trim()).cloned()
    }

    fn mark_depleted(&self, key: &ResourceKey, when: DateTime<Utc>) -> bool {
        let mut resources = self.resources.write().unwrap_or_else(|e| e.into_inner());
        match resources.get_mut(key) {
            Some(resource) => {
                resource.depleted = true;
                tracing::debug!(resource = %key, at = %when, "Marked depleted");
                true
            }
            None => false,
        }
    }
}

/// Preference store held in memory
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: RwLock<BTreeMap<String, PrefValue>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: BTreeMap<String, PrefValue>) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }

    pub fn with(self, key: &str, value: PrefValue) -> Self {
        self.set(key, value);
        self
    }

    /// Copy of all stored values
    pub fn entries(&self) -> BTreeMap<String, PrefValue> {
        self.values.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<PrefValue> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: PrefValue) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value);
    }
}
