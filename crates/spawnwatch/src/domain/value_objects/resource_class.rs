//! ResourceClass - Node of the resource taxonomy

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Stat;

/// Inclusive range a stat can take within a resource class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCap {
    pub min: u16,
    pub max: u16,
}

impl StatCap {
    pub fn new(min: u16, max: u16) -> Self {
        Self { min, max }
    }
}

/// Resource class as supplied by the catalog
///
/// The core never builds the taxonomy itself; it only asks whether one class
/// sits below another and what the stat caps are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceClass {
    /// Short token used in guard files, e.g. `steel_duralloy`
    pub token: String,
    pub name: String,
    /// Tokens of all ancestors, nearest first
    #[serde(default)]
    pub ancestors: Vec<String>,
    /// Stats this class carries; a stat without a cap is absent
    #[serde(default)]
    pub caps: BTreeMap<Stat, StatCap>,
    #[serde(default = "default_spawnable")]
    pub spawnable: bool,
}

fn default_spawnable() -> bool {
    true
}

impl ResourceClass {
    pub fn new(token: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            name: name.into(),
            ancestors: Vec::new(),
            caps: BTreeMap::new(),
            spawnable: true,
        }
    }

    pub fn with_ancestors<I, S>(mut self, ancestors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ancestors = ancestors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cap(mut self, stat: Stat, min: u16, max: u16) -> Self {
        self.caps.insert(stat, StatCap::new(min, max));
        self
    }

    pub fn cap(&self, stat: Stat) -> Option<StatCap> {
        self.caps.get(&stat).copied()
    }

    /// True for the class itself and for every class below `other`
    pub fn is_sub_class_of(&self, other: &ResourceClass) -> bool {
        self.token == other.token || self.ancestors.iter().any(|a| *a == other.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_class_includes_self_and_descendants() {
        let metal = ResourceClass::new("metal", "Metal");
        let steel = ResourceClass::new("steel", "Steel").with_ancestors(["metal", "inorganic"]);
        assert!(steel.is_sub_class_of(&metal));
        assert!(steel.is_sub_class_of(&steel));
        assert!(!metal.is_sub_class_of(&steel));
    }
}
