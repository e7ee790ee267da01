//! InventoryWrapper - Stock of one resource held by one assignee

use serde::{Deserialize, Serialize};

use crate::domain::entities::ResourceKey;
use crate::domain::value_objects::ReconcileMode;

/// Assignee name that collects stock not tied to one character
pub const ASSIGNEE_ALL: &str = "All";

/// Inventory entry, equal to another entry with the same assignee and resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryWrapper {
    pub assignee: String,
    pub resource: ResourceKey,
    pub amount: u64,
    #[serde(default)]
    pub notes: String,
    /// Reconciliation tag carried by imported entries
    #[serde(skip)]
    pub mode: ReconcileMode,
}

impl InventoryWrapper {
    pub fn new(assignee: impl Into<String>, resource: ResourceKey, amount: u64) -> Self {
        Self {
            assignee: assignee.into(),
            resource,
            amount,
            notes: String::new(),
            mode: ReconcileMode::None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_mode(mut self, mode: ReconcileMode) -> Self {
        self.mode = mode;
        self
    }
}

impl PartialEq for InventoryWrapper {
    fn eq(&self, other: &Self) -> bool {
        self.assignee == other.assignee && self.resource == other.resource
    }
}

impl Eq for InventoryWrapper {}

impl std::hash::Hash for InventoryWrapper {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.assignee.hash(state);
        self.resource.hash(state);
    }
}
