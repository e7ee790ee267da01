//! Monitor Tracker - Aging and depletion checks for monitors

use chrono::{DateTime, Utc};

use crate::domain::entities::Monitor;
use crate::ports::ResourceCatalog;

/// Drop monitors older than the maximum age, depleted or not
///
/// Returns how many were removed.
pub fn purge(monitors: &mut Vec<Monitor>, now: DateTime<Utc>) -> usize {
    let before = monitors.len();
    monitors.retain(|m| !m.is_expired(now));
    before - monitors.len()
}

pub fn is_depleted(monitor: &Monitor, catalog: &dyn ResourceCatalog) -> bool {
    catalog.is_depleted(&monitor.resource.key)
}

/// True when any monitored resource is depleted
pub fn check_any(monitors: &[Monitor], catalog: &dyn ResourceCatalog) -> bool {
    monitors.iter().any(|m| is_depleted(m, catalog))
}

/// Monitors whose resource is depleted
pub fn depleted<'a>(monitors: &'a [Monitor], catalog: &dyn ResourceCatalog) -> Vec<&'a Monitor> {
    monitors.iter().filter(|m| is_depleted(m, catalog)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryCatalog;
    use crate::domain::entities::{Resource, ResourceKey};
    use crate::domain::value_objects::{ResourceClass, StatValues};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
    }

    fn resource(name: &str, id: Option<i64>) -> Resource {
        let mut r = Resource::new(
            ResourceKey::new("alpha", name),
            ResourceClass::new("iron", "Iron"),
            StatValues::new(),
            t0(),
        );
        r.id = id;
        r
    }

    #[test]
    fn test_monitor_needs_catalog_id_and_live_resource() {
        assert!(Monitor::new(resource("A", None), t0()).is_err());
        let mut gone = resource("B", Some(2));
        gone.depleted = true;
        assert!(Monitor::new(gone, t0()).is_err());
        assert!(Monitor::new(resource("C", Some(3)), t0()).is_ok());
    }

    #[test]
    fn test_purge_boundary() {
        let monitor = Monitor::new(resource("A", Some(1)), t0()).unwrap();

        let mut list = vec![monitor.clone()];
        assert_eq!(purge(&mut list, t0() + Duration::days(27)), 0);
        assert_eq!(list.len(), 1);

        assert_eq!(purge(&mut list, t0() + Duration::days(28)), 0);
        assert_eq!(list.len(), 1);

        assert_eq!(purge(&mut list, t0() + Duration::days(29)), 1);
        assert!(list.is_empty());
    }

    #[test]
    fn test_check_any_follows_catalog() {
        let catalog = InMemoryCatalog::new();
        let a = resource("A", Some(1));
        let b = resource("B", Some(2));
        catalog.insert(a.clone());
        catalog.insert(b.clone());
        let monitors = vec![
            Monitor::new(a, t0()).unwrap(),
            Monitor::new(b.clone(), t0()).unwrap(),
        ];

        assert!(!check_any(&monitors, &catalog));
        catalog.mark_depleted(&b.key, t0());
        assert!(check_any(&monitors, &catalog));
        assert_eq!(depleted(&monitors, &catalog).len(), 1);
    }
}
