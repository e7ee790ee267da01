//! HarvesterType - Closed set of harvester kinds
//!
//! A kind is a power tier crossed with a resource category. The kind fixes the
//! upkeep rates and whether the unit powers itself.

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Size class of a harvester
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PowerTier {
    Personal,
    Medium,
    Heavy,
    Elite,
}

/// What a harvester extracts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HarvestCategory {
    Mineral,
    Chemical,
    Flora,
    Gas,
    Water,
    Solar,
    Wind,
    Fusion,
}

impl PowerTier {
    const ALL: [PowerTier; 4] = [
        PowerTier::Personal,
        PowerTier::Medium,
        PowerTier::Heavy,
        PowerTier::Elite,
    ];

    fn token(self) -> &'static str {
        match self {
            PowerTier::Personal => "personal",
            PowerTier::Medium => "medium",
            PowerTier::Heavy => "heavy",
            PowerTier::Elite => "elite",
        }
    }
}

impl HarvestCategory {
    const ALL: [HarvestCategory; 8] = [
        HarvestCategory::Mineral,
        HarvestCategory::Chemical,
        HarvestCategory::Flora,
        HarvestCategory::Gas,
        HarvestCategory::Water,
        HarvestCategory::Solar,
        HarvestCategory::Wind,
        HarvestCategory::Fusion,
    ];

    fn token(self) -> &'static str {
        match self {
            HarvestCategory::Mineral => "mineral",
            HarvestCategory::Chemical => "chemical",
            HarvestCategory::Flora => "flora",
            HarvestCategory::Gas => "gas",
            HarvestCategory::Water => "water",
            HarvestCategory::Solar => "solar",
            HarvestCategory::Wind => "wind",
            HarvestCategory::Fusion => "fusion",
        }
    }

    /// Solar and wind units generate their own power
    pub fn is_self_powered(self) -> bool {
        matches!(self, HarvestCategory::Solar | HarvestCategory::Wind)
    }
}

/// Harvester kind, written as `<category>-<tier>` (e.g. `mineral-heavy`)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct HarvesterType {
    pub category: HarvestCategory,
    pub tier: PowerTier,
}

impl HarvesterType {
    pub fn new(category: HarvestCategory, tier: PowerTier) -> Self {
        Self { category, tier }
    }

    /// Default base extraction rate, units per minute
    pub fn default_ber(&self) -> f64 {
        match self.tier {
            PowerTier::Personal => 3.0,
            PowerTier::Medium => 6.0,
            PowerTier::Heavy => 11.0,
            PowerTier::Elite => 14.0,
        }
    }

    /// Default hopper size, units
    pub fn default_hopper(&self) -> u32 {
        match self.tier {
            PowerTier::Personal => 24_000,
            PowerTier::Medium => 50_000,
            PowerTier::Heavy => 81_000,
            PowerTier::Elite => 100_000,
        }
    }

    /// Maintenance upkeep, credits per hour
    pub fn maintenance_rate(&self) -> f64 {
        match self.tier {
            PowerTier::Personal => 15.0,
            PowerTier::Medium => 24.0,
            PowerTier::Heavy => 48.0,
            PowerTier::Elite => 80.0,
        }
    }

    /// Power upkeep, units per hour; zero for self-powered kinds
    pub fn power_rate(&self) -> f64 {
        if self.is_self_powered() {
            return 0.0;
        }
        match self.tier {
            PowerTier::Personal => 25.0,
            PowerTier::Medium => 50.0,
            PowerTier::Heavy => 75.0,
            PowerTier::Elite => 100.0,
        }
    }

    pub fn is_self_powered(&self) -> bool {
        self.category.is_self_powered()
    }

    /// Every known kind
    pub fn all() -> impl Iterator<Item = HarvesterType> {
        HarvestCategory::ALL.into_iter().flat_map(|category| {
            PowerTier::ALL
                .into_iter()
                .map(move |tier| HarvesterType::new(category, tier))
        })
    }
}

impl std::fmt::Display for HarvesterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.category.token(), self.tier.token())
    }
}

impl std::str::FromStr for HarvesterType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase();
        HarvesterType::all()
            .find(|kind| kind.to_string() == token)
            .ok_or_else(|| DomainError::validation(format!("Unknown harvester type: {}", s)))
    }
}

impl TryFrom<String> for HarvesterType {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HarvesterType> for String {
    fn from(kind: HarvesterType) -> Self {
        kind.to_string()
    }
}
