//! Collection Stores
//!
//! Per-server collections owned by the coordinator. Each sits behind one
//! coarse lock there; the types here are plain data with their own
//! uniqueness rules.

use std::collections::{BTreeMap, HashSet};

use crate::domain::{DomainError, Guard, Harvester, HarvesterOwner, Monitor, ResourceKey};

/// Guards per server
#[derive(Debug, Clone, Default)]
pub struct GuardBook {
    servers: BTreeMap<String, Vec<Guard>>,
}

impl GuardBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a guard; a guard with the same name, class and logic is a conflict
    pub fn add(&mut self, server: &str, guard: Guard) -> Result<(), DomainError> {
        let guards = self.servers.entry(server.to_string()).or_default();
        if guards.iter().any(|g| g.same_identity(&guard)) {
            return Err(DomainError::Conflict(format!(
                "Guard {} already exists on {}",
                guard.name, server
            )));
        }
        guards.push(guard);
        Ok(())
    }

    /// Remove every guard with this name; returns how many went
    pub fn remove(&mut self, server: &str, name: &str) -> usize {
        let Some(guards) = self.servers.get_mut(server) else {
            return 0;
        };
        let before = guards.len();
        guards.retain(|g| g.name != name);
        before - guards.len()
    }

    pub fn clear(&mut self, server: &str) -> usize {
        self.servers.remove(server).map(|g| g.len()).unwrap_or(0)
    }

    pub fn guards(&self, server: &str) -> &[Guard] {
        self.servers.get(server).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn guards_mut(&mut self, server: &str) -> &mut [Guard] {
        self.servers
            .get_mut(server)
            .map(Vec::as_mut_slice)
            .unwrap_or(&mut [])
    }
}

#[derive(Debug, Clone, Default)]
struct ServerHarvesters {
    harvesters: Vec<Harvester>,
    owners: Vec<HarvesterOwner>,
}

/// Harvesters and their owners per server
///
/// Names are unique per server, ignoring case.
#[derive(Debug, Clone, Default)]
pub struct HarvesterBook {
    servers: BTreeMap<String, ServerHarvesters>,
}

impl HarvesterBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_harvester(&mut self, server: &str, harvester: Harvester) -> Result<(), DomainError> {
        let entry = self.servers.entry(server.to_string()).or_default();
        if entry
            .harvesters
            .iter()
            .any(|h| h.name().eq_ignore_ascii_case(harvester.name()))
        {
            return Err(DomainError::Conflict(format!(
                "Harvester {} already exists on {}",
                harvester.name(),
                server
            )));
        }
        entry.harvesters.push(harvester);
        Ok(())
    }

    /// Delete an inactive harvester
    pub fn remove_harvester(&mut self, server: &str, name: &str) -> Result<Harvester, DomainError> {
        let entry = self
            .servers
            .get_mut(server)
            .ok_or_else(|| DomainError::not_found("Harvester", name))?;
        let index = entry
            .harvesters
            .iter()
            .position(|h| h.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| DomainError::not_found("Harvester", name))?;
        if entry.harvesters[index].is_active() {
            return Err(DomainError::InvalidState(format!(
                "Harvester {} is active and cannot be deleted",
                name
            )));
        }
        Ok(entry.harvesters.remove(index))
    }

    pub fn harvester_mut(&mut self, server: &str, name: &str) -> Option<&mut Harvester> {
        self.servers
            .get_mut(server)?
            .harvesters
            .iter_mut()
            .find(|h| h.name().eq_ignore_ascii_case(name))
    }

    pub fn harvesters(&self, server: &str) -> &[Harvester] {
        self.servers
            .get(server)
            .map(|s| s.harvesters.as_slice())
            .unwrap_or(&[])
    }

    /// Servers that have at least one active harvester
    pub fn active_servers(&self) -> Vec<String> {
        self.servers
            .iter()
            .filter(|(_, s)| s.harvesters.iter().any(Harvester::is_active))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Resources being harvested on a server
    pub fn claimed(&self, server: &str) -> HashSet<ResourceKey> {
        self.harvesters(server)
            .iter()
            .filter(|h| h.is_active())
            .filter_map(|h| h.resource().map(|r| r.key.clone()))
            .collect()
    }

    /// Add or replace an owner by name
    pub fn upsert_owner(&mut self, server: &str, owner: HarvesterOwner) {
        let owners = &mut self.servers.entry(server.to_string()).or_default().owners;
        match owners.iter_mut().find(|o| o.name == owner.name) {
            Some(existing) => *existing = owner,
            None => owners.push(owner),
        }
    }

    pub fn owner(&self, server: &str, name: &str) -> Option<&HarvesterOwner> {
        self.servers.get(server)?.owners.iter().find(|o| o.name == name)
    }

    pub fn owners(&self, server: &str) -> &[HarvesterOwner] {
        self.servers
            .get(server)
            .map(|s| s.owners.as_slice())
            .unwrap_or(&[])
    }

    pub fn remove_owner(&mut self, server: &str, name: &str) -> bool {
        let Some(entry) = self.servers.get_mut(server) else {
            return false;
        };
        let before = entry.owners.len();
        entry.owners.retain(|o| o.name != name);
        before != entry.owners.len()
    }
}

/// Monitors per server, one per resource
#[derive(Debug, Clone, Default)]
pub struct MonitorBook {
    servers: BTreeMap<String, Vec<Monitor>>,
}

impl MonitorBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, monitor: Monitor) -> Result<(), DomainError> {
        let monitors = self
            .servers
            .entry(monitor.resource.key.server.clone())
            .or_default();
        if monitors.iter().any(|m| m.resource.key == monitor.resource.key) {
            return Err(DomainError::Conflict(format!(
                "{} is already monitored",
                monitor.resource.key
            )));
        }
        monitors.push(monitor);
        Ok(())
    }

    pub fn remove(&mut self, key: &ResourceKey) -> bool {
        let Some(monitors) = self.servers.get_mut(&key.server) else {
            return false;
        };
        let before = monitors.len();
        monitors.retain(|m| m.resource.key != *key);
        before != monitors.len()
    }

    pub fn monitors(&self, server: &str) -> &[Monitor] {
        self.servers.get(server).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Each server's monitors, for the scan
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Vec<Monitor>)> {
        self.servers.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.servers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
