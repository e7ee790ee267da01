//! Stat - Resource quality attributes

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One of the eleven resource stats, in alphabetical order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stat {
    /// Cold resistance
    Cd,
    /// Conductivity
    Cr,
    /// Decay resistance
    Dr,
    /// Entangle resistance
    Er,
    /// Flavor
    Fl,
    /// Heat resistance
    Hr,
    /// Malleability
    Ma,
    /// Overall quality
    Oq,
    /// Potential energy
    Pe,
    /// Shock resistance
    Sr,
    /// Unit toughness
    Ut,
}

impl Stat {
    pub const COUNT: usize = 11;

    /// All stats in the default (alphabetical) column order
    pub const ALL: [Stat; Stat::COUNT] = [
        Stat::Cd,
        Stat::Cr,
        Stat::Dr,
        Stat::Er,
        Stat::Fl,
        Stat::Hr,
        Stat::Ma,
        Stat::Oq,
        Stat::Pe,
        Stat::Sr,
        Stat::Ut,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            Stat::Cd => "CD",
            Stat::Cr => "CR",
            Stat::Dr => "DR",
            Stat::Er => "ER",
            Stat::Fl => "FL",
            Stat::Hr => "HR",
            Stat::Ma => "MA",
            Stat::Oq => "OQ",
            Stat::Pe => "PE",
            Stat::Sr => "SR",
            Stat::Ut => "UT",
        }
    }
}

impl std::fmt::Display for Stat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.abbreviation())
    }
}

impl std::str::FromStr for Stat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stat::ALL
            .iter()
            .copied()
            .find(|stat| stat.abbreviation().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown stat: {}", s))
    }
}

/// Per-stat values in 0..=1000; zero means the stat is not present
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Stat, u16>", into = "BTreeMap<Stat, u16>")]
pub struct StatValues([u16; Stat::COUNT]);

impl StatValues {
    pub const MAX_VALUE: u16 = 1000;

    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(stat, value)` pairs, values above 1000 are clamped
    pub fn from_pairs<I: IntoIterator<Item = (Stat, u16)>>(pairs: I) -> Self {
        let mut values = Self::default();
        for (stat, value) in pairs {
            values.set(stat, value);
        }
        values
    }

    pub fn with(mut self, stat: Stat, value: u16) -> Self {
        self.set(stat, value);
        self
    }

    pub fn get(&self, stat: Stat) -> u16 {
        self.0[stat.index()]
    }

    pub fn set(&mut self, stat: Stat, value: u16) {
        self.0[stat.index()] = value.min(Self::MAX_VALUE);
    }

    pub fn has(&self, stat: Stat) -> bool {
        self.get(stat) > 0
    }

    /// True when no stat has been reported
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|v| *v == 0)
    }

    /// Stats with a non-zero value
    pub fn present(&self) -> impl Iterator<Item = (Stat, u16)> + '_ {
        Stat::ALL
            .iter()
            .map(move |stat| (*stat, self.get(*stat)))
            .filter(|(_, v)| *v > 0)
    }
}

impl From<BTreeMap<Stat, u16>> for StatValues {
    fn from(map: BTreeMap<Stat, u16>) -> Self {
        Self::from_pairs(map)
    }
}

impl From<StatValues> for BTreeMap<Stat, u16> {
    fn from(values: StatValues) -> Self {
        values.present().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("oq".parse::<Stat>().unwrap(), Stat::Oq);
        assert_eq!(" UT ".parse::<Stat>().unwrap(), Stat::Ut);
        assert!("XX".parse::<Stat>().is_err());
    }

    #[test]
    fn test_default_order_is_alphabetical() {
        let names: Vec<&str> = Stat::ALL.iter().map(|s| s.abbreviation()).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_values_clamp_and_presence() {
        let values = StatValues::new().with(Stat::Oq, 1200).with(Stat::Cd, 0);
        assert_eq!(values.get(Stat::Oq), 1000);
        assert!(!values.has(Stat::Cd));
        assert!(!values.is_empty());
        assert!(StatValues::new().is_empty());
    }

    #[test]
    fn test_serializes_as_sparse_map() {
        let values = StatValues::new().with(Stat::Oq, 600).with(Stat::Pe, 400);
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"{"OQ":600,"PE":400}"#);
        let back: StatValues = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }
}
