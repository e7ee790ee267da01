//! Inventory Ledger - Stock per server and assignee
//!
//! Layout is server → assignee → entries, with at most one entry per
//! resource in each assignee's list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::entities::{InventoryWrapper, ResourceKey, ASSIGNEE_ALL};
use crate::domain::value_objects::ReconcileMode;

/// What `add` did with an incoming entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// Stored as a new entry
    Inserted,
    /// Merged into the entry held by this assignee
    Merged { assignee: String },
    /// Duplicate dropped in `ReconcileMode::None`
    Ignored,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryLedger {
    servers: BTreeMap<String, BTreeMap<String, Vec<InventoryWrapper>>>,
}

impl InventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, reconciling it with existing stock
    ///
    /// With `None` the entry is inserted only if its assignee has nothing for
    /// that resource yet. The other modes look for a target among all
    /// assignees: the same assignee first, then "All" when several hold the
    /// resource, then the first holder in assignee order. Notes of the
    /// target are kept.
    pub fn add(
        &mut self,
        server: &str,
        mut wrapper: InventoryWrapper,
        mode: ReconcileMode,
    ) -> AddOutcome {
        let assignees = self.servers.entry(server.to_string()).or_default();

        if mode == ReconcileMode::None {
            let list = assignees.entry(wrapper.assignee.clone()).or_default();
            if list.iter().any(|w| w.resource == wrapper.resource) {
                return AddOutcome::Ignored;
            }
            list.push(wrapper);
            return AddOutcome::Inserted;
        }

        let Some(target) = find_target(assignees, &wrapper.assignee, &wrapper.resource) else {
            wrapper.amount = mode.apply(0, wrapper.amount);
            wrapper.mode = ReconcileMode::None;
            assignees
                .entry(wrapper.assignee.clone())
                .or_default()
                .push(wrapper);
            return AddOutcome::Inserted;
        };

        if let Some(existing) = assignees
            .get_mut(&target)
            .and_then(|list| list.iter_mut().find(|w| w.resource == wrapper.resource))
        {
            existing.amount = mode.apply(existing.amount, wrapper.amount);
        }
        AddOutcome::Merged { assignee: target }
    }

    /// Add using the mode tagged on the entry
    pub fn add_tagged(&mut self, server: &str, wrapper: InventoryWrapper) -> AddOutcome {
        let mode = wrapper.mode;
        self.add(server, wrapper, mode)
    }

    /// Sum over all assignees; `None` when no assignee holds the resource
    pub fn total_amount(&self, server: &str, resource: &ResourceKey) -> Option<u64> {
        let assignees = self.servers.get(server)?;
        let mut found = false;
        let mut total = 0u64;
        for wrapper in assignees.values().flatten() {
            if wrapper.resource == *resource {
                found = true;
                total = total.saturating_add(wrapper.amount);
            }
        }
        found.then_some(total)
    }

    pub fn remove(&mut self, server: &str, assignee: &str, resource: &ResourceKey) -> bool {
        let Some(list) = self
            .servers
            .get_mut(server)
            .and_then(|assignees| assignees.get_mut(assignee))
        else {
            return false;
        };
        let before = list.len();
        list.retain(|w| w.resource != *resource);
        before != list.len()
    }

    pub fn remove_assignee(&mut self, server: &str, assignee: &str) -> bool {
        self.servers
            .get_mut(server)
            .and_then(|assignees| assignees.remove(assignee))
            .is_some()
    }

    pub fn assignees(&self, server: &str) -> Vec<String> {
        self.servers
            .get(server)
            .map(|assignees| assignees.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn wrappers(&self, server: &str, assignee: &str) -> &[InventoryWrapper] {
        self.servers
            .get(server)
            .and_then(|assignees| assignees.get(assignee))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All entries of a server across assignees
    pub fn flattened(&self, server: &str) -> Vec<InventoryWrapper> {
        self.servers
            .get(server)
            .map(|assignees| assignees.values().flatten().cloned().collect())
            .unwrap_or_default()
    }

    /// Amount per resource across assignees
    pub fn totals(&self, server: &str) -> BTreeMap<ResourceKey, u64> {
        let mut totals = BTreeMap::new();
        for wrapper in self.servers.get(server).into_iter().flat_map(|a| a.values().flatten()) {
            let entry = totals.entry(wrapper.resource.clone()).or_insert(0u64);
            *entry = entry.saturating_add(wrapper.amount);
        }
        totals
    }
}

fn find_target(
    assignees: &BTreeMap<String, Vec<InventoryWrapper>>,
    assignee: &str,
    resource: &ResourceKey,
) -> Option<String> {
    let holds = |list: &Vec<InventoryWrapper>| list.iter().any(|w| w.resource == *resource);

    if assignees.get(assignee).is_some_and(holds) {
        return Some(assignee.to_string());
    }

    let candidates: Vec<&String> = assignees
        .iter()
        .filter(|(_, list)| holds(list))
        .map(|(name, _)| name)
        .collect();

    match candidates.as_slice() {
        [] => None,
        [only] => Some((*only).clone()),
        several => {
            if let Some(all) = several.iter().find(|name| name.as_str() == ASSIGNEE_ALL) {
                return Some((*all).clone());
            }
            tracing::warn!(
                resource = %resource,
                incoming = assignee,
                picked = %several[0],
                candidates = several.len(),
                "Ambiguous inventory target, using first holder"
            );
            Some(several[0].clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER: &str = "alpha";

    fn x() -> ResourceKey {
        ResourceKey::new(SERVER, "Xenite")
    }

    fn entry(assignee: &str, amount: u64) -> InventoryWrapper {
        InventoryWrapper::new(assignee, x(), amount)
    }

    #[test]
    fn test_add_mode_sums_into_single_entry() {
        let mut ledger = InventoryLedger::new();
        ledger.add(SERVER, entry("Bob", 5), ReconcileMode::None);
        let outcome = ledger.add(SERVER, entry("Bob", 3), ReconcileMode::Add);

        assert_eq!(outcome, AddOutcome::Merged { assignee: "Bob".into() });
        assert_eq!(ledger.wrappers(SERVER, "Bob").len(), 1);
        assert_eq!(ledger.wrappers(SERVER, "Bob")[0].amount, 8);
    }

    #[test]
    fn test_none_mode_ignores_duplicates() {
        let mut ledger = InventoryLedger::new();
        ledger.add(SERVER, entry("Bob", 5), ReconcileMode::None);
        let outcome = ledger.add(SERVER, entry("Bob", 9), ReconcileMode::None);
        assert_eq!(outcome, AddOutcome::Ignored);
        assert_eq!(ledger.total_amount(SERVER, &x()), Some(5));
    }

    #[test]
    fn test_subtract_clamps_at_zero_and_keeps_notes() {
        let mut ledger = InventoryLedger::new();
        ledger.add(SERVER, entry("Bob", 5).with_notes("crate 3"), ReconcileMode::None);
        ledger.add(SERVER, entry("Bob", 50).with_notes("ignored"), ReconcileMode::Subtract);
        let held = &ledger.wrappers(SERVER, "Bob")[0];
        assert_eq!(held.amount, 0);
        assert_eq!(held.notes, "crate 3");
    }

    #[test]
    fn test_replace_targets_other_assignee_when_only_holder() {
        let mut ledger = InventoryLedger::new();
        ledger.add(SERVER, entry("Ann", 5), ReconcileMode::None);
        let outcome = ledger.add(SERVER, entry("Bob", 40), ReconcileMode::Replace);
        assert_eq!(outcome, AddOutcome::Merged { assignee: "Ann".into() });
        assert_eq!(ledger.wrappers(SERVER, "Ann")[0].amount, 40);
        assert!(ledger.wrappers(SERVER, "Bob").is_empty());
    }

    #[test]
    fn test_all_preferred_among_several() {
        let mut ledger = InventoryLedger::new();
        ledger.add(SERVER, entry("Ann", 5), ReconcileMode::None);
        ledger.add(SERVER, entry(ASSIGNEE_ALL, 7), ReconcileMode::None);
        ledger.add(SERVER, entry("Cid", 9), ReconcileMode::None);

        ledger.add(SERVER, entry("Bob", 1), ReconcileMode::Add);
        assert_eq!(ledger.wrappers(SERVER, ASSIGNEE_ALL)[0].amount, 8);
    }

    #[test]
    fn test_first_holder_fallback() {
        let mut ledger = InventoryLedger::new();
        ledger.add(SERVER, entry("Cid", 9), ReconcileMode::None);
        ledger.add(SERVER, entry("Ann", 5), ReconcileMode::None);

        ledger.add(SERVER, entry("Bob", 1), ReconcileMode::Add);
        assert_eq!(ledger.wrappers(SERVER, "Ann")[0].amount, 6);
        assert_eq!(ledger.wrappers(SERVER, "Cid")[0].amount, 9);
    }

    #[test]
    fn test_missing_target_inserts_new() {
        let mut ledger = InventoryLedger::new();
        assert_eq!(
            ledger.add(SERVER, entry("Bob", 4), ReconcileMode::Add),
            AddOutcome::Inserted
        );
        ledger.add(SERVER, InventoryWrapper::new("Bob", ResourceKey::new(SERVER, "Y"), 4), ReconcileMode::Subtract);
        assert_eq!(ledger.total_amount(SERVER, &x()), Some(4));
        assert_eq!(ledger.total_amount(SERVER, &ResourceKey::new(SERVER, "Y")), Some(0));
    }

    #[test]
    fn test_total_amount_absent_vs_zero() {
        let mut ledger = InventoryLedger::new();
        assert_eq!(ledger.total_amount(SERVER, &x()), None);
        ledger.add(SERVER, entry("Bob", 0), ReconcileMode::None);
        assert_eq!(ledger.total_amount(SERVER, &x()), Some(0));
        ledger.add(SERVER, entry("Ann", 12), ReconcileMode::None);
        assert_eq!(ledger.total_amount(SERVER, &x()), Some(12));
        assert!(ledger.remove(SERVER, "Bob", &x()));
        assert!(ledger.remove_assignee(SERVER, "Ann"));
        assert_eq!(ledger.total_amount(SERVER, &x()), None);
    }

    #[test]
    fn test_flattened_and_totals() {
        let mut ledger = InventoryLedger::new();
        ledger.add(SERVER, entry("Ann", 2), ReconcileMode::None);
        ledger.add(SERVER, entry("Bob", 3), ReconcileMode::None);
        ledger.add_tagged(
            SERVER,
            InventoryWrapper::new("Bob", ResourceKey::new(SERVER, "Y"), 1)
                .with_mode(ReconcileMode::Add),
        );

        assert_eq!(ledger.flattened(SERVER).len(), 3);
        assert_eq!(ledger.totals(SERVER).get(&x()), Some(&5));
        assert_eq!(ledger.assignees(SERVER), vec!["Ann".to_string(), "Bob".to_string()]);
    }
}
