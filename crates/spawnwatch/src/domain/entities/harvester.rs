//! Harvester - Simulated extraction device
//!
//! A harvester runs through three states:
//! - inactive and deeded: no owner, zero bonuses
//! - inactive but stayed put: owner and bonuses kept, no resource
//! - active: owner, bonuses, resource and a running clock
//!
//! Bonuses are copied from the owner only when a deeded harvester is
//! activated. After that they stay fixed until the harvester is re-deeded,
//! even if ownership changes hands.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::Resource;
use crate::domain::errors::DomainError;
use crate::domain::value_objects::HarvesterType;

const MILLIS_PER_MINUTE: f64 = 60_000.0;
const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Expertise and buff levels that modify a harvester
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvesterBonuses {
    /// 0..=4, -5% power use per level
    pub energy_efficiency: u8,
    /// 0..=4, -4% maintenance use per level
    pub maintenance_efficiency: u8,
    /// 0..=4, +3% hopper size per level
    pub storage_efficiency: u8,
    /// 0..=2, extraction step function
    pub harvesting_technology: u8,
    /// 0..=5, +1% extraction per level
    pub buff: u8,
}

impl HarvesterBonuses {
    pub const MAX_EFFICIENCY: u8 = 4;
    pub const MAX_TECHNOLOGY: u8 = 2;
    pub const MAX_BUFF: u8 = 5;

    pub fn new(
        energy_efficiency: u8,
        maintenance_efficiency: u8,
        storage_efficiency: u8,
        harvesting_technology: u8,
        buff: u8,
    ) -> Result<Self, DomainError> {
        let bonuses = Self {
            energy_efficiency,
            maintenance_efficiency,
            storage_efficiency,
            harvesting_technology,
            buff,
        };
        bonuses.validate()?;
        Ok(bonuses)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let checks = [
            ("energy efficiency", self.energy_efficiency, Self::MAX_EFFICIENCY),
            ("maintenance efficiency", self.maintenance_efficiency, Self::MAX_EFFICIENCY),
            ("storage efficiency", self.storage_efficiency, Self::MAX_EFFICIENCY),
            ("harvesting technology", self.harvesting_technology, Self::MAX_TECHNOLOGY),
            ("buff", self.buff, Self::MAX_BUFF),
        ];
        for (label, value, max) in checks {
            if value > max {
                return Err(DomainError::validation(format!(
                    "{} level {} out of range 0..={}",
                    label, value, max
                )));
            }
        }
        Ok(())
    }

    /// Extraction multiplier from harvesting technology
    pub fn technology_modifier(&self) -> f64 {
        match self.harvesting_technology {
            0 => 1.0,
            1 => 1.2,
            _ => 1.3,
        }
    }
}

/// Character that places harvesters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvesterOwner {
    pub name: String,
    pub bonuses: HarvesterBonuses,
}

impl HarvesterOwner {
    pub fn new(name: impl Into<String>, bonuses: HarvesterBonuses) -> Result<Self, DomainError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("Owner name must not be empty"));
        }
        bonuses.validate()?;
        Ok(Self { name, bonuses })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvesterState {
    InactiveDeeded,
    InactiveStayedPut,
    Active,
}

/// Harvester with its economics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Harvester {
    name: String,
    kind: HarvesterType,
    ber: f64,
    hopper_size: u32,
    active: bool,
    resource: Option<Resource>,
    concentration: f64,
    last_updated: DateTime<Utc>,
    maintenance: f64,
    power: f64,
    several: u32,
    owner: Option<String>,
    bonuses: HarvesterBonuses,
    self_powered_override: bool,
    pub notes: String,
    pub add_to_inventory: bool,
}

impl Harvester {
    /// Define a harvester; kind, BER and hopper size never change afterwards
    pub fn new(
        name: impl Into<String>,
        kind: HarvesterType,
        ber: f64,
        hopper_size: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("Harvester name must not be empty"));
        }
        if !ber.is_finite() || ber < 0.0 {
            return Err(DomainError::validation(format!("Invalid BER: {}", ber)));
        }
        if hopper_size == 0 {
            return Err(DomainError::validation("Hopper size must be positive"));
        }
        Ok(Self {
            name,
            kind,
            ber,
            hopper_size,
            active: false,
            resource: None,
            concentration: 0.0,
            last_updated: now,
            maintenance: 0.0,
            power: 0.0,
            several: 1,
            owner: None,
            bonuses: HarvesterBonuses::default(),
            self_powered_override: false,
            notes: String::new(),
            add_to_inventory: false,
        })
    }

    /// Define a harvester with the kind's default BER and hopper size
    pub fn of_kind(
        name: impl Into<String>,
        kind: HarvesterType,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        Self::new(name, kind, kind.default_ber(), kind.default_hopper(), now)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> HarvesterType {
        self.kind
    }

    pub fn ber(&self) -> f64 {
        self.ber
    }

    pub fn hopper_size(&self) -> u32 {
        self.hopper_size
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn resource(&self) -> Option<&Resource> {
        self.resource.as_ref()
    }

    pub fn concentration(&self) -> f64 {
        self.concentration
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn maintenance(&self) -> f64 {
        self.maintenance
    }

    pub fn power(&self) -> f64 {
        self.power
    }

    pub fn several(&self) -> u32 {
        self.several
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn bonuses(&self) -> HarvesterBonuses {
        self.bonuses
    }

    pub fn state(&self) -> HarvesterState {
        match (self.active, self.owner.is_some()) {
            (true, _) => HarvesterState::Active,
            (false, true) => HarvesterState::InactiveStayedPut,
            (false, false) => HarvesterState::InactiveDeeded,
        }
    }

    /// Put the harvester to work
    ///
    /// From the deeded state the owner's bonuses are captured; from the
    /// stayed-put state only the owner name changes.
    pub fn activate(
        &mut self,
        owner: &HarvesterOwner,
        resource: Resource,
        concentration: f64,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.active {
            return Err(DomainError::InvalidState(format!(
                "Harvester {} is already active",
                self.name
            )));
        }
        validate_concentration(concentration)?;

        if self.state() == HarvesterState::InactiveDeeded {
            self.bonuses = owner.bonuses;
        }
        self.owner = Some(owner.name.clone());
        self.resource = Some(resource);
        self.concentration = concentration;
        self.last_updated = now;
        self.active = true;
        Ok(())
    }

    /// Stop the harvester
    ///
    /// `re_deed` resets everything tied to placement; otherwise owner and
    /// bonuses survive for the next activation.
    pub fn deactivate(&mut self, re_deed: bool) {
        self.active = false;
        self.resource = None;
        self.concentration = 0.0;
        self.notes.clear();
        self.several = 1;
        if re_deed {
            self.owner = None;
            self.bonuses = HarvesterBonuses::default();
            self.self_powered_override = false;
        }
    }

    /// Record freshly read maintenance and power deposits
    pub fn record_reading(
        &mut self,
        maintenance: f64,
        power: f64,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        for (label, value) in [("maintenance", maintenance), ("power", power)] {
            if !value.is_finite() || value < 0.0 {
                return Err(DomainError::validation(format!("Invalid {}: {}", label, value)));
            }
        }
        self.maintenance = maintenance;
        self.power = power;
        self.last_updated = now;
        Ok(())
    }

    pub fn set_concentration(&mut self, concentration: f64) -> Result<(), DomainError> {
        validate_concentration(concentration)?;
        self.concentration = concentration;
        Ok(())
    }

    pub fn set_several(&mut self, several: u32) -> Result<(), DomainError> {
        if several == 0 {
            return Err(DomainError::validation("Several count must be at least 1"));
        }
        self.several = several;
        Ok(())
    }

    pub fn set_self_powered(&mut self, self_powered: bool) {
        self.self_powered_override = self_powered;
    }

    pub fn is_self_powered(&self) -> bool {
        self.kind.is_self_powered() || self.self_powered_override
    }

    pub fn power_rate(&self) -> f64 {
        self.kind.power_rate()
    }

    pub fn maintenance_rate(&self) -> f64 {
        self.kind.maintenance_rate()
    }

    pub fn extraction_modifier(&self, base_modifier: f64) -> f64 {
        base_modifier
            * (self.bonuses.technology_modifier() + f64::from(self.bonuses.buff) * 0.01)
    }

    /// Actual extraction rate, units per minute
    pub fn aer(&self, base_modifier: f64) -> f64 {
        (self.ber * self.concentration / 100.0 * self.extraction_modifier(base_modifier)).max(0.0)
    }

    /// Hopper size after storage efficiency
    pub fn hopper_capacity(&self) -> f64 {
        f64::from(self.hopper_size) * (1.0 + f64::from(self.bonuses.storage_efficiency) * 0.03)
    }

    /// Units extracted since the last reading
    pub fn hopper_units(&self, now: DateTime<Utc>, base_modifier: f64) -> u64 {
        let elapsed = (now - self.last_updated).num_milliseconds().max(0) as f64;
        let units = elapsed / MILLIS_PER_MINUTE * self.aer(base_modifier);
        units.min(self.hopper_capacity()) as u64
    }

    pub fn hopper_full_at(&self, base_modifier: f64) -> DateTime<Utc> {
        let aer = self.aer(base_modifier);
        if aer <= 0.0 {
            return DateTime::<Utc>::MAX_UTC;
        }
        offset(self.last_updated, self.hopper_capacity() / aer * MILLIS_PER_MINUTE)
    }

    /// When the deposited power runs out; `MAX_UTC` when it never does
    pub fn power_drained_at(&self) -> DateTime<Utc> {
        let rate = self.power_rate();
        if self.is_self_powered() || rate <= 0.0 {
            return DateTime::<Utc>::MAX_UTC;
        }
        let effective = rate * (1.0 - f64::from(self.bonuses.energy_efficiency) * 0.05);
        offset(self.last_updated, MILLIS_PER_HOUR * self.power / effective)
    }

    /// When the deposited maintenance runs out; `MAX_UTC` when it never does
    pub fn maintenance_drained_at(&self) -> DateTime<Utc> {
        let rate = self.maintenance_rate();
        if rate <= 0.0 {
            return DateTime::<Utc>::MAX_UTC;
        }
        let effective = rate * (1.0 - f64::from(self.bonuses.maintenance_efficiency) * 0.04);
        offset(self.last_updated, MILLIS_PER_HOUR * self.maintenance / effective)
    }

    /// 1.0 right after the reading, 0.0 at drain time, negative when overdue
    pub fn power_remaining(&self, now: DateTime<Utc>) -> f64 {
        remaining(self.last_updated, self.power_drained_at(), now)
    }

    pub fn maintenance_remaining(&self, now: DateTime<Utc>) -> f64 {
        remaining(self.last_updated, self.maintenance_drained_at(), now)
    }
}

fn validate_concentration(concentration: f64) -> Result<(), DomainError> {
    if !(0.0..=100.0).contains(&concentration) {
        return Err(DomainError::validation(format!(
            "Concentration {} out of range 0..=100",
            concentration
        )));
    }
    Ok(())
}

fn offset(from: DateTime<Utc>, millis: f64) -> DateTime<Utc> {
    if !millis.is_finite() || millis >= i64::MAX as f64 {
        return DateTime::<Utc>::MAX_UTC;
    }
    Duration::try_milliseconds(millis as i64)
        .and_then(|delta| from.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn remaining(since: DateTime<Utc>, drained_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    if drained_at == DateTime::<Utc>::MAX_UTC {
        return 1.0;
    }
    let span = (drained_at - since).num_milliseconds() as f64;
    if span <= 0.0 {
        return 0.0;
    }
    1.0 - (now - since).num_milliseconds() as f64 / span
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ResourceKey;
    use crate::domain::value_objects::{ResourceClass, StatValues};
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn kind(token: &str) -> HarvesterType {
        token.parse().unwrap()
    }

    fn resource(name: &str) -> Resource {
        Resource::new(
            ResourceKey::new("alpha", name),
            ResourceClass::new("iron", "Iron"),
            StatValues::new(),
            t0(),
        )
    }

    fn owner(name: &str, level: u8) -> HarvesterOwner {
        let bonuses = HarvesterBonuses::new(level, level, level, level.min(2), level).unwrap();
        HarvesterOwner::new(name, bonuses).unwrap()
    }

    fn active(ber: f64, concentration: f64) -> Harvester {
        let mut h = Harvester::new("h1", kind("mineral-heavy"), ber, 10_000, t0()).unwrap();
        h.activate(&owner("Bob", 0), resource("Ore"), concentration, t0())
            .unwrap();
        h
    }

    #[test]
    fn test_construction_rejects_bad_arguments() {
        let k = kind("mineral-heavy");
        assert!(Harvester::new("h", k, -1.0, 100, t0()).is_err());
        assert!(Harvester::new(" ", k, 1.0, 100, t0()).is_err());
        assert!(Harvester::new("h", k, f64::NAN, 100, t0()).is_err());
        assert!(Harvester::new("h", k, 1.0, 0, t0()).is_err());
    }

    #[test]
    fn test_aer_example() {
        let h = active(100.0, 50.0);
        assert_eq!(h.aer(1.0), 50.0);
    }

    #[test]
    fn test_aer_is_linear_in_concentration() {
        let mut h = active(14.0, 20.0);
        let low = h.aer(1.0);
        h.set_concentration(40.0).unwrap();
        assert!((h.aer(1.0) - 2.0 * low).abs() < 1e-9);
        h.set_concentration(0.0).unwrap();
        assert_eq!(h.aer(1.0), 0.0);
    }

    #[test]
    fn test_extraction_modifier_steps() {
        let mut h = Harvester::new("h", kind("gas-medium"), 10.0, 100, t0()).unwrap();
        let o = HarvesterOwner::new("Ann", HarvesterBonuses::new(0, 0, 0, 2, 5).unwrap()).unwrap();
        h.activate(&o, resource("Gas"), 100.0, t0()).unwrap();
        assert!((h.extraction_modifier(1.0) - 1.35).abs() < 1e-9);
        assert!((h.extraction_modifier(2.0) - 2.70).abs() < 1e-9);
    }

    #[test]
    fn test_activation_from_deeded_copies_bonuses() {
        let mut h = Harvester::of_kind("h", kind("chemical-elite"), t0()).unwrap();
        let bob = owner("Bob", 2);
        h.activate(&bob, resource("Chem"), 80.0, t0()).unwrap();
        assert_eq!(h.state(), HarvesterState::Active);
        assert_eq!(h.bonuses(), bob.bonuses);
        assert_eq!(h.owner(), Some("Bob"));
    }

    #[test]
    fn test_activation_from_stayed_put_keeps_bonuses() {
        let mut h = Harvester::of_kind("h", kind("chemical-elite"), t0()).unwrap();
        let bob = owner("Bob", 2);
        h.activate(&bob, resource("Chem"), 80.0, t0()).unwrap();
        h.deactivate(false);
        assert_eq!(h.state(), HarvesterState::InactiveStayedPut);

        let carol = owner("Carol", 4);
        h.activate(&carol, resource("Chem2"), 60.0, t0()).unwrap();
        assert_eq!(h.owner(), Some("Carol"));
        assert_eq!(h.bonuses(), bob.bonuses);
    }

    #[test]
    fn test_double_activation_is_rejected() {
        let mut h = active(10.0, 50.0);
        let err = h.activate(&owner("Bob", 0), resource("Ore"), 50.0, t0());
        assert!(matches!(err, Err(DomainError::InvalidState(_))));
    }

    #[test]
    fn test_activation_rejects_bad_concentration() {
        let mut h = Harvester::of_kind("h", kind("flora-medium"), t0()).unwrap();
        assert!(h.activate(&owner("Bob", 0), resource("F"), 101.0, t0()).is_err());
        assert_eq!(h.state(), HarvesterState::InactiveDeeded);
    }

    #[test]
    fn test_stay_put_retains_owner_and_bonuses() {
        let mut h = Harvester::of_kind("h", kind("water-heavy"), t0()).unwrap();
        let bob = owner("Bob", 3);
        h.activate(&bob, resource("W"), 70.0, t0()).unwrap();
        h.set_several(3).unwrap();
        h.notes = "north field".to_string();
        h.deactivate(false);

        assert_eq!(h.owner(), Some("Bob"));
        assert_eq!(h.bonuses(), bob.bonuses);
        assert!(h.resource().is_none());
        assert_eq!(h.concentration(), 0.0);
        assert!(h.notes.is_empty());
        assert_eq!(h.several(), 1);
    }

    #[test]
    fn test_re_deed_resets_everything() {
        let mut h = Harvester::of_kind("h", kind("water-heavy"), t0()).unwrap();
        h.activate(&owner("Bob", 3), resource("W"), 70.0, t0()).unwrap();
        h.set_self_powered(true);
        h.set_several(2).unwrap();
        h.deactivate(true);

        assert_eq!(h.state(), HarvesterState::InactiveDeeded);
        assert_eq!(h.owner(), None);
        assert_eq!(h.bonuses(), HarvesterBonuses::default());
        assert!(!h.is_self_powered());
        assert_eq!(h.several(), 1);
    }

    #[test]
    fn test_hopper_units_truncate_and_cap() {
        let h = active(100.0, 50.0);
        // 50 units per minute, 90 seconds in
        let now = t0() + Duration::seconds(90);
        assert_eq!(h.hopper_units(now, 1.0), 75);
        let later = t0() + Duration::days(10);
        assert_eq!(h.hopper_units(later, 1.0), 10_000);
    }

    #[test]
    fn test_hopper_full_time() {
        let h = active(100.0, 50.0);
        // 10_000 units at 50 per minute
        assert_eq!(h.hopper_full_at(1.0), t0() + Duration::minutes(200));
    }

    #[test]
    fn test_storage_efficiency_grows_hopper() {
        let mut h = Harvester::new("h", kind("gas-heavy"), 10.0, 10_000, t0()).unwrap();
        let o = HarvesterOwner::new("Ann", HarvesterBonuses::new(0, 0, 4, 0, 0).unwrap()).unwrap();
        h.activate(&o, resource("Gas"), 50.0, t0()).unwrap();
        assert!((h.hopper_capacity() - 11_200.0).abs() < 1e-9);
    }

    #[test]
    fn test_power_drain_with_efficiency() {
        // heavy tier burns 75 power per hour; level 4 saves 20%
        let mut h = Harvester::new("h", kind("mineral-heavy"), 10.0, 100, t0()).unwrap();
        let o = HarvesterOwner::new("Ann", HarvesterBonuses::new(4, 0, 0, 0, 0).unwrap()).unwrap();
        h.activate(&o, resource("Ore"), 50.0, t0()).unwrap();
        h.record_reading(0.0, 600.0, t0()).unwrap();
        assert_eq!(h.power_drained_at(), t0() + Duration::hours(10));
    }

    #[test]
    fn test_self_powered_never_drains() {
        let mut h = Harvester::of_kind("h", kind("solar-medium"), t0()).unwrap();
        h.activate(&owner("Bob", 0), resource("Sun"), 50.0, t0()).unwrap();
        assert_eq!(h.power_drained_at(), DateTime::<Utc>::MAX_UTC);
        assert_eq!(h.power_remaining(t0() + Duration::days(400)), 1.0);

        let mut overridden = active(10.0, 50.0);
        overridden.set_self_powered(true);
        assert_eq!(overridden.power_drained_at(), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_maintenance_remaining_ramps_negative() {
        // heavy tier costs 48 credits per hour
        let mut h = active(10.0, 50.0);
        h.record_reading(480.0, 0.0, t0()).unwrap();
        assert_eq!(h.maintenance_drained_at(), t0() + Duration::hours(10));
        assert!((h.maintenance_remaining(t0()) - 1.0).abs() < 1e-9);
        assert!((h.maintenance_remaining(t0() + Duration::hours(5)) - 0.5).abs() < 1e-9);
        assert!(h.maintenance_remaining(t0() + Duration::hours(15)) < 0.0);
    }

    #[test]
    fn test_record_reading_rejects_negative() {
        let mut h = active(10.0, 50.0);
        assert!(h.record_reading(-1.0, 0.0, t0()).is_err());
    }

    #[test]
    fn test_bonus_ranges_are_enforced() {
        assert!(HarvesterBonuses::new(5, 0, 0, 0, 0).is_err());
        assert!(HarvesterBonuses::new(0, 0, 0, 3, 0).is_err());
        assert!(HarvesterBonuses::new(0, 0, 0, 0, 6).is_err());
        assert!(HarvesterBonuses::new(4, 4, 4, 2, 5).is_ok());
    }
}
