//! ReconcileMode - How an incoming inventory entry meets an existing one

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    /// Overwrite the existing amount
    Replace,
    /// Add to the existing amount
    Add,
    /// Subtract from the existing amount, never below zero
    Subtract,
    /// Insert only when absent, ignore duplicates
    #[default]
    None,
}

impl ReconcileMode {
    /// Apply the mode to an existing amount
    pub fn apply(self, existing: u64, incoming: u64) -> u64 {
        match self {
            ReconcileMode::Replace => incoming,
            ReconcileMode::Add => existing.saturating_add(incoming),
            ReconcileMode::Subtract => existing.saturating_sub(incoming),
            ReconcileMode::None => existing,
        }
    }
}

impl std::fmt::Display for ReconcileMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileMode::Replace => write!(f, "replace"),
            ReconcileMode::Add => write!(f, "add"),
            ReconcileMode::Subtract => write!(f, "subtract"),
            ReconcileMode::None => write!(f, "none"),
        }
    }
}

impl std::str::FromStr for ReconcileMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "replace" => Ok(ReconcileMode::Replace),
            "add" => Ok(ReconcileMode::Add),
            "subtract" => Ok(ReconcileMode::Subtract),
            "none" => Ok(ReconcileMode::None),
            _ => Err(format!("Unknown reconcile mode: {}", s)),
        }
    }
}
