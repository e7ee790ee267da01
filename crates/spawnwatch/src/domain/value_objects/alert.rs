//! AlertLevel and AlertKind - Scan outcomes and sound classes

use serde::{Deserialize, Serialize};

/// Outcome of a scan
///
/// Maps onto the tri-state used by the presentation layer: `Clear` is 0,
/// `Notice` is +1 (show, stay silent) and `Urgent` is -1 (new spawn or idle
/// harvester, worth a sound).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    #[default]
    Clear,
    Notice,
    Urgent,
}

impl AlertLevel {
    /// Fold another scan result into this one; the most severe state wins
    pub fn escalate(self, other: AlertLevel) -> AlertLevel {
        match (self, other) {
            (AlertLevel::Urgent, _) | (_, AlertLevel::Urgent) => AlertLevel::Urgent,
            (AlertLevel::Notice, _) | (_, AlertLevel::Notice) => AlertLevel::Notice,
            _ => AlertLevel::Clear,
        }
    }

    pub fn signum(self) -> i8 {
        match self {
            AlertLevel::Clear => 0,
            AlertLevel::Notice => 1,
            AlertLevel::Urgent => -1,
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertLevel::Clear => write!(f, "clear"),
            AlertLevel::Notice => write!(f, "notice"),
            AlertLevel::Urgent => write!(f, "urgent"),
        }
    }
}

/// Sound class, each rate-limited on its own
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// New match on a guard that asks for an alarm
    Alarm,
    /// Other guard matches, depleted monitors, idling harvesters
    Alert,
    /// Harvester running out soon
    Warning,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::Alarm => write!(f, "alarm"),
            AlertKind::Alert => write!(f, "alert"),
            AlertKind::Warning => write!(f, "warning"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgent_overrides_notice_never_reverse() {
        assert_eq!(AlertLevel::Notice.escalate(AlertLevel::Urgent), AlertLevel::Urgent);
        assert_eq!(AlertLevel::Urgent.escalate(AlertLevel::Notice), AlertLevel::Urgent);
        assert_eq!(AlertLevel::Notice.escalate(AlertLevel::Clear), AlertLevel::Notice);
        assert_eq!(AlertLevel::Clear.escalate(AlertLevel::Clear), AlertLevel::Clear);
    }

    #[test]
    fn test_signum_matches_tri_state() {
        assert_eq!(AlertLevel::Clear.signum(), 0);
        assert_eq!(AlertLevel::Notice.signum(), 1);
        assert_eq!(AlertLevel::Urgent.signum(), -1);
    }
}
