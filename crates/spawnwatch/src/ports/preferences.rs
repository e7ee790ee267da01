//! Preference Store Port
//!
//! String-keyed, typed configuration values. The core reads tunables here
//! at the start of every scan so edits apply without a restart.

use serde::{Deserialize, Serialize};

/// A stored preference value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl PrefValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PrefValue::Bool(b) => Some(*b),
            PrefValue::Text(s) => match s.to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PrefValue::Int(i) => Some(*i),
            PrefValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            PrefValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PrefValue::Float(f) => Some(*f),
            PrefValue::Int(i) => Some(*i as f64),
            PrefValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PrefValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Parse user input into the most specific value type
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if let Ok(b) = trimmed.parse::<bool>() {
            return PrefValue::Bool(b);
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return PrefValue::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return PrefValue::Float(f);
        }
        PrefValue::Text(trimmed.to_string())
    }
}

impl std::fmt::Display for PrefValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrefValue::Bool(b) => write!(f, "{}", b),
            PrefValue::Int(i) => write!(f, "{}", i),
            PrefValue::Float(x) => write!(f, "{}", x),
            PrefValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Key-value preference storage
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<PrefValue>;

    fn set(&self, key: &str, value: PrefValue);

    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
    }

    fn get_i64(&self, key: &str, default: i64) -> i64 {
        self.get(key).and_then(|v| v.as_i64()).unwrap_or(default)
    }

    fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.get(key).and_then(|v| v.as_f64()).unwrap_or(default)
    }

    fn get_str(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str().map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_picks_specific_type() {
        assert_eq!(PrefValue::parse("true"), PrefValue::Bool(true));
        assert_eq!(PrefValue::parse("-1"), PrefValue::Int(-1));
        assert_eq!(PrefValue::parse("1.5"), PrefValue::Float(1.5));
        assert_eq!(PrefValue::parse("Bria"), PrefValue::Text("Bria".to_string()));
    }

    #[test]
    fn test_lenient_conversions() {
        assert_eq!(PrefValue::Text("yes".into()).as_bool(), Some(true));
        assert_eq!(PrefValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(PrefValue::Float(2.0).as_i64(), Some(2));
        assert_eq!(PrefValue::Float(2.5).as_i64(), None);
    }
}
