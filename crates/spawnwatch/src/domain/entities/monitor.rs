//! Monitor - Watch on one resource until it depletes

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::Resource;
use crate::domain::errors::DomainError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monitor {
    pub resource: Resource,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
}

impl Monitor {
    /// Monitors older than this are dropped
    pub fn max_age() -> Duration {
        Duration::days(28)
    }

    /// Watch a resource; it must be known to the catalog and not yet depleted
    pub fn new(resource: Resource, created: DateTime<Utc>) -> Result<Self, DomainError> {
        if resource.id.is_none() {
            return Err(DomainError::validation(format!(
                "{} has no catalog id and cannot be monitored",
                resource.key
            )));
        }
        if resource.depleted {
            return Err(DomainError::validation(format!(
                "{} is already depleted",
                resource.key
            )));
        }
        Ok(Self {
            resource,
            created,
            notes: String::new(),
        })
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created
    }

    /// Older than the maximum age; exactly 28 days is still fresh
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.age(now) > Self::max_age()
    }
}
