//! Harvester Scan - Idle and warning detection for active harvesters

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::entities::Harvester;
use crate::domain::errors::DomainError;
use crate::domain::value_objects::AlertLevel;
use crate::ports::ResourceCatalog;

/// Why a harvester stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdleReason {
    ResourceDepleted,
    HopperFull,
    PowerDrained,
    MaintenanceDrained,
}

/// What runs out soonest within the warning window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningReason {
    HopperFilling,
    PowerLow,
    MaintenanceLow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum HarvesterStatus {
    Ok,
    Warning(WarningReason),
    Idling(IdleReason),
}

impl HarvesterStatus {
    pub fn level(self) -> AlertLevel {
        match self {
            HarvesterStatus::Ok => AlertLevel::Clear,
            HarvesterStatus::Warning(_) => AlertLevel::Notice,
            HarvesterStatus::Idling(_) => AlertLevel::Urgent,
        }
    }
}

/// Settings for a harvester scan
#[derive(Debug, Clone, Copy)]
pub struct HarvesterScanWindow {
    pub now: DateTime<Utc>,
    /// How far ahead a drain or full hopper counts as a warning
    pub warning: Duration,
    /// Server-wide extraction modifier
    pub base_modifier: f64,
}

/// Per-harvester result plus the aggregate
#[derive(Debug, Clone, Default, Serialize)]
pub struct HarvesterScanReport {
    pub level: AlertLevel,
    pub statuses: Vec<(String, HarvesterStatus)>,
}

/// Status of one active harvester
///
/// Idle conditions are checked first, in priority order, and the first one
/// that holds wins. Only a harvester that is not idle can be in warning.
pub fn status(
    harvester: &Harvester,
    catalog: &dyn ResourceCatalog,
    window: HarvesterScanWindow,
) -> Result<HarvesterStatus, DomainError> {
    let resource = harvester.resource().ok_or_else(|| {
        DomainError::InvalidState(format!(
            "Active harvester {} has no resource",
            harvester.name()
        ))
    })?;

    let now = window.now;
    let hopper_full = harvester.hopper_full_at(window.base_modifier);
    let power_out = harvester.power_drained_at();
    let maintenance_out = harvester.maintenance_drained_at();

    if catalog.is_depleted(&resource.key) {
        return Ok(HarvesterStatus::Idling(IdleReason::ResourceDepleted));
    }
    if hopper_full <= now {
        return Ok(HarvesterStatus::Idling(IdleReason::HopperFull));
    }
    if power_out <= now {
        return Ok(HarvesterStatus::Idling(IdleReason::PowerDrained));
    }
    if maintenance_out <= now {
        return Ok(HarvesterStatus::Idling(IdleReason::MaintenanceDrained));
    }

    let horizon = now
        .checked_add_signed(window.warning)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    let soonest = [
        (hopper_full, WarningReason::HopperFilling),
        (power_out, WarningReason::PowerLow),
        (maintenance_out, WarningReason::MaintenanceLow),
    ]
    .into_iter()
    .filter(|(at, _)| *at != DateTime::<Utc>::MAX_UTC && *at <= horizon)
    .min_by_key(|(at, _)| *at);

    Ok(match soonest {
        Some((_, reason)) => HarvesterStatus::Warning(reason),
        None => HarvesterStatus::Ok,
    })
}

/// Scan all active harvesters of one server
///
/// A harvester that cannot be evaluated is logged and skipped.
pub fn scan(
    harvesters: &[Harvester],
    catalog: &dyn ResourceCatalog,
    window: HarvesterScanWindow,
) -> HarvesterScanReport {
    let mut report = HarvesterScanReport::default();
    for harvester in harvesters.iter().filter(|h| h.is_active()) {
        match status(harvester, catalog, window) {
            Ok(status) => {
                report.level = report.level.escalate(status.level());
                report.statuses.push((harvester.name().to_string(), status));
            }
            Err(e) => {
                tracing::warn!(harvester = %harvester.name(), error = %e, "Skipping harvester");
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryCatalog;
    use crate::domain::entities::{HarvesterBonuses, HarvesterOwner, Resource, ResourceKey};
    use crate::domain::value_objects::{ResourceClass, StatValues};
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn ore(name: &str) -> Resource {
        Resource::new(
            ResourceKey::new("alpha", name),
            ResourceClass::new("iron", "Iron"),
            StatValues::new(),
            t0(),
        )
    }

    fn window(now: DateTime<Utc>) -> HarvesterScanWindow {
        HarvesterScanWindow {
            now,
            warning: Duration::hours(24),
            base_modifier: 1.0,
        }
    }

    /// Heavy mineral: 75 power/h, 48 credits/h; 10 units/min into 100_000
    fn running(catalog: &InMemoryCatalog, name: &str, power_h: f64, maint_h: f64) -> Harvester {
        let resource = ore(name);
        catalog.insert(resource.clone());
        let mut h = Harvester::new(name, "mineral-heavy".parse().unwrap(), 10.0, 100_000, t0())
            .unwrap();
        let owner = HarvesterOwner::new("Bob", HarvesterBonuses::default()).unwrap();
        h.activate(&owner, resource, 100.0, t0()).unwrap();
        h.record_reading(48.0 * maint_h, 75.0 * power_h, t0()).unwrap();
        h
    }

    #[test]
    fn test_healthy_harvester_is_ok() {
        let catalog = InMemoryCatalog::new();
        // hopper fills after 10_000 minutes, about 6.9 days
        let h = running(&catalog, "A", 100.0, 100.0);
        let s = status(&h, &catalog, window(t0() + Duration::hours(1))).unwrap();
        assert_eq!(s, HarvesterStatus::Ok);
    }

    #[test]
    fn test_warning_inside_window() {
        let catalog = InMemoryCatalog::new();
        let h = running(&catalog, "A", 30.0, 100.0);
        let s = status(&h, &catalog, window(t0() + Duration::hours(10))).unwrap();
        assert_eq!(s, HarvesterStatus::Warning(WarningReason::PowerLow));
    }

    #[test]
    fn test_idle_priority_order() {
        let catalog = InMemoryCatalog::new();
        // everything has run out ten days later
        let h = running(&catalog, "A", 1.0, 1.0);
        let late = window(t0() + Duration::days(10));
        assert_eq!(
            status(&h, &catalog, late).unwrap(),
            HarvesterStatus::Idling(IdleReason::HopperFull)
        );

        catalog.mark_depleted(&ResourceKey::new("alpha", "A"), t0());
        assert_eq!(
            status(&h, &catalog, late).unwrap(),
            HarvesterStatus::Idling(IdleReason::ResourceDepleted)
        );
    }

    #[test]
    fn test_power_before_maintenance() {
        let catalog = InMemoryCatalog::new();
        let h = running(&catalog, "A", 1.0, 2.0);
        let s = status(&h, &catalog, window(t0() + Duration::hours(3))).unwrap();
        assert_eq!(s, HarvesterStatus::Idling(IdleReason::PowerDrained));
    }

    #[test]
    fn test_idle_outranks_warning_in_aggregate() {
        let catalog = InMemoryCatalog::new();
        let warning = running(&catalog, "W", 30.0, 100.0);
        let idle = running(&catalog, "I", 1.0, 100.0);
        let mut parked =
            Harvester::of_kind("P", "gas-medium".parse().unwrap(), t0()).unwrap();
        parked.notes = "spare".to_string();

        let report = scan(
            &[warning, idle, parked],
            &catalog,
            window(t0() + Duration::hours(10)),
        );
        assert_eq!(report.level, AlertLevel::Urgent);
        assert_eq!(report.statuses.len(), 2);
    }

    #[test]
    fn test_self_powered_never_warns_on_power() {
        let catalog = InMemoryCatalog::new();
        let resource = ore("S");
        catalog.insert(resource.clone());
        let mut h = Harvester::new("S", "solar-heavy".parse().unwrap(), 10.0, 100_000, t0())
            .unwrap();
        let owner = HarvesterOwner::new("Bob", HarvesterBonuses::default()).unwrap();
        h.activate(&owner, resource, 100.0, t0()).unwrap();
        h.record_reading(48.0 * 1000.0, 0.0, t0()).unwrap();

        let s = status(&h, &catalog, window(t0() + Duration::hours(1))).unwrap();
        assert_eq!(s, HarvesterStatus::Ok);
    }
}
