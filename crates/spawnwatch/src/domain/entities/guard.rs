//! Guard - User-defined rule that flags matching spawns

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::value_objects::{ResourceClass, StatValues};

/// How a guard judges a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum GuardLogic {
    /// Per-stat minimums, all of which must be met
    Filter(StatValues),
    /// Per-stat weights for a single 0-1000 rate
    Weights(StatValues),
}

/// Guard bound to a resource class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guard {
    pub name: String,
    pub class: ResourceClass,
    pub logic: GuardLogic,
    /// Minimum rate, 0..=1000; only used by `Weights`
    pub threshold: u16,
    pub use_alarm: bool,
    /// Accept resources that lack a stat the logic looks at
    pub accept_no_stats: bool,
    #[serde(default)]
    pub notes: String,
    /// First-seen time of the newest match found by the last scan
    #[serde(skip)]
    pub recent_spawn: Option<DateTime<Utc>>,
}

impl Guard {
    pub const MAX_THRESHOLD: u16 = 1000;
    /// Guard files read thresholds up to this value on the old 0-100 scale
    pub const LEGACY_THRESHOLD_MAX: u16 = 102;

    /// Create a filter guard; every non-zero value is a minimum
    pub fn filter(
        name: impl Into<String>,
        class: ResourceClass,
        minimums: StatValues,
    ) -> Result<Self, DomainError> {
        Self::build(name.into(), class, GuardLogic::Filter(minimums), 0)
    }

    /// Create a weights guard; at least one weight must be non-zero
    ///
    /// Thresholds up to `LEGACY_THRESHOLD_MAX` must be multiples of ten so a
    /// guard file can carry them.
    pub fn weights(
        name: impl Into<String>,
        class: ResourceClass,
        weights: StatValues,
        threshold: u16,
    ) -> Result<Self, DomainError> {
        if weights.is_empty() {
            return Err(DomainError::validation("Weights guard needs at least one weight"));
        }
        if !Self::is_weights_threshold(threshold) {
            return Err(DomainError::validation(format!(
                "Weights guard threshold {} must be a multiple of 10 up to {}",
                threshold,
                Self::LEGACY_THRESHOLD_MAX
            )));
        }
        Self::build(name.into(), class, GuardLogic::Weights(weights), threshold)
    }

    fn build(
        name: String,
        class: ResourceClass,
        logic: GuardLogic,
        threshold: u16,
    ) -> Result<Self, DomainError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("Guard name must not be empty"));
        }
        if name.starts_with('#') {
            return Err(DomainError::validation(format!(
                "Guard name '{}' must not start with '#'",
                name
            )));
        }
        if threshold > Self::MAX_THRESHOLD {
            return Err(DomainError::validation(format!(
                "Guard threshold {} exceeds {}",
                threshold,
                Self::MAX_THRESHOLD
            )));
        }
        Ok(Self {
            name,
            class,
            logic,
            threshold,
            use_alarm: false,
            accept_no_stats: false,
            notes: String::new(),
            recent_spawn: None,
        })
    }

    /// Whether a weights guard may use this threshold
    pub fn is_weights_threshold(threshold: u16) -> bool {
        threshold > Self::LEGACY_THRESHOLD_MAX || (threshold > 0 && threshold % 10 == 0)
    }

    pub fn with_alarm(mut self, use_alarm: bool) -> Self {
        self.use_alarm = use_alarm;
        self
    }

    pub fn with_accept_no_stats(mut self, accept: bool) -> Self {
        self.accept_no_stats = accept;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Same name, class and logic
    pub fn same_identity(&self, other: &Guard) -> bool {
        self.name == other.name && self.class.token == other.class.token && self.logic == other.logic
    }
}
