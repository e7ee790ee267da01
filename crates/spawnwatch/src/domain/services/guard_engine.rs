//! Guard Engine - Filter/weights evaluation and the guard scan

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashSet;

use crate::domain::entities::{Guard, GuardLogic, Resource, ResourceKey};
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{AlertLevel, Stat, StatValues};

/// Weighted rate of a resource, 0..=1000
///
/// Each weighted stat contributes `value / cap max` of the resource's class;
/// stats the class does not carry are left out of both sums.
pub fn rate(guard: &Guard, resource: &Resource) -> Result<f64, DomainError> {
    let weights = match &guard.logic {
        GuardLogic::Weights(weights) => weights,
        GuardLogic::Filter(_) => {
            return Err(DomainError::Evaluation(format!(
                "Guard {} is a filter and has no rate",
                guard.name
            )))
        }
    };
    weighted_rate(weights, resource).ok_or_else(|| {
        DomainError::Evaluation(format!(
            "Guard {}: class {} caps none of the weighted stats",
            guard.name, resource.class.token
        ))
    })
}

fn weighted_rate(weights: &StatValues, resource: &Resource) -> Option<f64> {
    let mut total = 0.0;
    let mut weight_sum = 0.0;
    for (stat, weight) in weights.present() {
        let Some(cap) = resource.class.cap(stat) else {
            continue;
        };
        if cap.max == 0 {
            continue;
        }
        let weight = f64::from(weight);
        total += weight * f64::from(resource.stats.get(stat)) / f64::from(cap.max);
        weight_sum += weight;
    }
    (weight_sum > 0.0).then(|| total / weight_sum * 1000.0)
}

fn passes_filter(minimums: &StatValues, resource: &Resource, accept_no_stats: bool) -> bool {
    minimums.present().all(|(stat, minimum): (Stat, u16)| {
        let value = resource.stats.get(stat);
        if value == 0 {
            accept_no_stats
        } else {
            value >= minimum
        }
    })
}

/// Whether a guard accepts a resource, judged on stats alone
pub fn evaluate(guard: &Guard, resource: &Resource) -> Result<bool, DomainError> {
    match &guard.logic {
        GuardLogic::Filter(minimums) => {
            Ok(passes_filter(minimums, resource, guard.accept_no_stats))
        }
        GuardLogic::Weights(_) => {
            if resource.stats.is_empty() {
                return Ok(guard.accept_no_stats);
            }
            Ok(rate(guard, resource)? >= f64::from(guard.threshold))
        }
    }
}

/// Time windows for a guard scan
#[derive(Debug, Clone, Copy)]
pub struct GuardScanWindow {
    pub now: DateTime<Utc>,
    /// Resources older than this are ignored
    pub age_limit: Duration,
    /// Matches younger than this count as new spawns
    pub new_spawn: Duration,
}

/// Result of scanning a set of guards
#[derive(Debug, Clone, Default, Serialize)]
pub struct GuardScanReport {
    pub level: AlertLevel,
    /// Names of guards with at least one match
    pub triggered: Vec<String>,
    /// Names of guards whose newest match is a new spawn
    pub fresh: Vec<String>,
    /// A fresh match belongs to a guard that asks for an alarm
    pub alarm: bool,
}

/// Scan guards against a snapshot
///
/// Every guard's `recent_spawn` is cleared first and then set to the newest
/// first-seen time among its matches. Resources claimed by an active
/// harvester are skipped.
pub fn scan(
    guards: &mut [Guard],
    snapshot: &[Resource],
    claimed: &HashSet<ResourceKey>,
    window: GuardScanWindow,
) -> GuardScanReport {
    let mut report = GuardScanReport::default();

    for guard in guards.iter_mut() {
        guard.recent_spawn = None;
        let mut failures = 0usize;

        for resource in snapshot {
            if resource.depleted
                || claimed.contains(&resource.key)
                || !resource.class.is_sub_class_of(&guard.class)
                || window.now - resource.first_seen >= window.age_limit
            {
                continue;
            }
            match evaluate(guard, resource) {
                Ok(true) => {
                    if guard.recent_spawn.map_or(true, |seen| resource.first_seen > seen) {
                        guard.recent_spawn = Some(resource.first_seen);
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    failures += 1;
                    tracing::debug!(guard = %guard.name, resource = %resource.key, error = %e, "Guard evaluation failed");
                }
            }
        }

        if failures > 0 {
            tracing::warn!(guard = %guard.name, failures, "Skipped resources the guard could not evaluate");
        }

        let Some(newest) = guard.recent_spawn else {
            continue;
        };
        report.triggered.push(guard.name.clone());
        if window.now - newest < window.new_spawn {
            report.fresh.push(guard.name.clone());
            report.alarm |= guard.use_alarm;
            report.level = report.level.escalate(AlertLevel::Urgent);
        } else {
            report.level = report.level.escalate(AlertLevel::Notice);
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::ResourceClass;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn steel() -> ResourceClass {
        ResourceClass::new("steel", "Steel")
            .with_ancestors(["metal"])
            .with_cap(Stat::Oq, 1, 1000)
            .with_cap(Stat::Ut, 1, 1000)
            .with_cap(Stat::Sr, 1, 500)
    }

    fn metal() -> ResourceClass {
        ResourceClass::new("metal", "Metal")
    }

    fn spawn(name: &str, stats: StatValues, minutes_ago: i64) -> Resource {
        Resource::new(
            ResourceKey::new("alpha", name),
            steel(),
            stats,
            now() - Duration::minutes(minutes_ago),
        )
    }

    fn oq_filter(min: u16) -> Guard {
        Guard::filter("oq", steel(), StatValues::new().with(Stat::Oq, min))
            .unwrap()
            .with_alarm(true)
    }

    fn window(now: DateTime<Utc>) -> GuardScanWindow {
        GuardScanWindow {
            now,
            age_limit: Duration::hours(36),
            new_spawn: Duration::minutes(40),
        }
    }

    #[test]
    fn test_filter_is_all_or_nothing() {
        let guard = Guard::filter(
            "g",
            steel(),
            StatValues::new().with(Stat::Oq, 500).with(Stat::Ut, 500),
        )
        .unwrap();
        let both = spawn("a", StatValues::new().with(Stat::Oq, 600).with(Stat::Ut, 700), 1);
        let one = spawn("b", StatValues::new().with(Stat::Oq, 600).with(Stat::Ut, 400), 1);
        assert!(evaluate(&guard, &both).unwrap());
        assert!(!evaluate(&guard, &one).unwrap());
    }

    #[test]
    fn test_filter_missing_stat_rejected_unless_accept_no_stats() {
        let strict = oq_filter(500);
        let lenient = oq_filter(500).with_accept_no_stats(true);
        for other in [0u16, 200, 1000] {
            let resource = spawn("x", StatValues::new().with(Stat::Ut, other.max(1)), 1);
            assert!(!evaluate(&strict, &resource).unwrap());
            assert!(evaluate(&lenient, &resource).unwrap());
        }
    }

    #[test]
    fn test_weights_rate_normalizes_by_cap() {
        let weights = StatValues::new().with(Stat::Oq, 50).with(Stat::Sr, 50);
        let guard = Guard::weights("w", steel(), weights, 700).unwrap();
        // OQ 800/1000 and SR 400/500 are both 0.8
        let resource = spawn("r", StatValues::new().with(Stat::Oq, 800).with(Stat::Sr, 400), 1);
        let value = rate(&guard, &resource).unwrap();
        assert!((value - 800.0).abs() < 1e-9);
        assert!(evaluate(&guard, &resource).unwrap());
    }

    #[test]
    fn test_weights_rate_is_monotonic() {
        let weights = StatValues::new().with(Stat::Oq, 70).with(Stat::Ut, 30);
        let guard = Guard::weights("w", steel(), weights, 500).unwrap();
        let mut previous = -1.0;
        for oq in (0..=1000).step_by(50) {
            let resource = spawn("r", StatValues::new().with(Stat::Oq, oq).with(Stat::Ut, 300), 1);
            let value = rate(&guard, &resource).unwrap();
            assert!(value >= previous);
            previous = value;
        }
    }

    #[test]
    fn test_weights_without_capped_stat_is_an_error() {
        let weights = StatValues::new().with(Stat::Fl, 100);
        let guard = Guard::weights("w", steel(), weights, 500).unwrap();
        let resource = spawn("r", StatValues::new().with(Stat::Oq, 800), 1);
        assert!(matches!(evaluate(&guard, &resource), Err(DomainError::Evaluation(_))));
    }

    #[test]
    fn test_weights_resource_without_stats() {
        let weights = StatValues::new().with(Stat::Oq, 100);
        let guard = Guard::weights("w", steel(), weights, 500).unwrap();
        let bare = spawn("r", StatValues::new(), 1);
        assert!(!evaluate(&guard, &bare).unwrap());
        assert!(evaluate(&guard.with_accept_no_stats(true), &bare).unwrap());
    }

    #[test]
    fn test_new_spawn_is_urgent() {
        let mut guards = vec![oq_filter(500)];
        let snapshot = vec![spawn("Ferro", StatValues::new().with(Stat::Oq, 600), 10)];
        let report = scan(&mut guards, &snapshot, &HashSet::new(), window(now()));

        assert_eq!(report.level, AlertLevel::Urgent);
        assert_eq!(report.level.signum(), -1);
        assert!(report.alarm);
        assert_eq!(guards[0].recent_spawn, Some(snapshot[0].first_seen));
    }

    #[test]
    fn test_stale_match_is_notice() {
        let mut guards = vec![oq_filter(500)];
        let snapshot = vec![spawn("Ferro", StatValues::new().with(Stat::Oq, 600), 10)];
        scan(&mut guards, &snapshot, &HashSet::new(), window(now()));

        let later = now() + Duration::minutes(50);
        let report = scan(&mut guards, &snapshot, &HashSet::new(), window(later));
        assert_eq!(report.level, AlertLevel::Notice);
        assert_eq!(report.level.signum(), 1);
        assert!(!report.alarm);
        assert_eq!(guards[0].recent_spawn, Some(snapshot[0].first_seen));
    }

    #[test]
    fn test_scan_clears_previous_trigger() {
        let mut guards = vec![oq_filter(500)];
        guards[0].recent_spawn = Some(now());
        let report = scan(&mut guards, &[], &HashSet::new(), window(now()));
        assert_eq!(report.level, AlertLevel::Clear);
        assert!(guards[0].recent_spawn.is_none());
    }

    #[test]
    fn test_newest_match_wins() {
        let mut guards = vec![oq_filter(500)];
        let snapshot = vec![
            spawn("Old", StatValues::new().with(Stat::Oq, 900), 600),
            spawn("New", StatValues::new().with(Stat::Oq, 510), 5),
            spawn("Weak", StatValues::new().with(Stat::Oq, 100), 1),
        ];
        scan(&mut guards, &snapshot, &HashSet::new(), window(now()));
        assert_eq!(guards[0].recent_spawn, Some(now() - Duration::minutes(5)));
    }

    #[test]
    fn test_old_claimed_and_foreign_resources_are_ignored() {
        let mut guards = vec![oq_filter(500)];
        let claimed_spawn = spawn("Claimed", StatValues::new().with(Stat::Oq, 900), 5);
        let mut copper = spawn("Copper", StatValues::new().with(Stat::Oq, 900), 5);
        copper.class = ResourceClass::new("copper", "Copper").with_ancestors(["metal"]);
        let snapshot = vec![
            spawn("Ancient", StatValues::new().with(Stat::Oq, 900), 60 * 40),
            claimed_spawn.clone(),
            copper,
        ];
        let claimed: HashSet<ResourceKey> = [claimed_spawn.key].into_iter().collect();

        let report = scan(&mut guards, &snapshot, &claimed, window(now()));
        assert_eq!(report.level, AlertLevel::Clear);
    }

    #[test]
    fn test_parent_class_guard_sees_sub_classes() {
        let mut guards =
            vec![Guard::filter("any metal", metal(), StatValues::new().with(Stat::Oq, 1)).unwrap()];
        let snapshot = vec![spawn("Ferro", StatValues::new().with(Stat::Oq, 600), 10)];
        let report = scan(&mut guards, &snapshot, &HashSet::new(), window(now()));
        assert_eq!(report.triggered, vec!["any metal".to_string()]);
        assert!(!report.alarm);
    }

    #[test]
    fn test_evaluation_failure_does_not_stop_other_guards() {
        let broken = Guard::weights("broken", steel(), StatValues::new().with(Stat::Fl, 100), 500)
            .unwrap();
        let mut guards = vec![broken, oq_filter(500)];
        let snapshot = vec![spawn("Ferro", StatValues::new().with(Stat::Oq, 600), 10)];
        let report = scan(&mut guards, &snapshot, &HashSet::new(), window(now()));
        assert_eq!(report.triggered, vec!["oq".to_string()]);
        assert!(guards[0].recent_spawn.is_none());
    }
}
