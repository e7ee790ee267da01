//! Configuration management for spawnwatch CLI
//!
//! Preferences live in ~/.config/spawnwatch/config.toml as TOML tables:
//! `guard.alert_once` is stored as `alert_once` under `[guard]`.

use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use spawnwatch::adapters::MemoryPreferences;
use spawnwatch::{PrefValue, ScanConfig};

const CONFIG_DIR: &str = "spawnwatch";
const CONFIG_FILE: &str = "config.toml";

/// CLI Configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    path: PathBuf,
    values: BTreeMap<String, PrefValue>,
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join(CONFIG_DIR);
        Ok(config_dir)
    }

    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load config from the given file or the default one
    ///
    /// A missing file is an empty config.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if !path.exists() {
            return Ok(Self {
                path,
                values: BTreeMap::new(),
            });
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let values = parse_values(&content).context("Failed to parse config file")?;

        Ok(Self { path, values })
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory {:?}", dir))?;
        }
        let content = render_values(&self.values)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write config to {:?}", self.path))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn values(&self) -> &BTreeMap<String, PrefValue> {
        &self.values
    }

    pub fn set(&mut self, key: &str, value: PrefValue) {
        self.values.insert(key.to_string(), value);
    }

    /// Preference store seeded with this config
    pub fn preferences(&self) -> MemoryPreferences {
        MemoryPreferences::from_map(self.values.clone())
    }

    /// Validated settings, read the same way a scan reads them
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig::load(&self.preferences())
    }
}

fn parse_values(content: &str) -> Result<BTreeMap<String, PrefValue>> {
    let table: toml::Table = toml::from_str(content)?;
    let mut values = BTreeMap::new();
    flatten("", &table, &mut values);
    Ok(values)
}

fn flatten(prefix: &str, table: &toml::Table, out: &mut BTreeMap<String, PrefValue>) {
    for (name, value) in table {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        match value {
            toml::Value::Boolean(b) => {
                out.insert(key, PrefValue::Bool(*b));
            }
            toml::Value::Integer(i) => {
                out.insert(key, PrefValue::Int(*i));
            }
            toml::Value::Float(f) => {
                out.insert(key, PrefValue::Float(*f));
            }
            toml::Value::String(s) => {
                out.insert(key, PrefValue::Text(s.clone()));
            }
            toml::Value::Table(nested) => flatten(&key, nested, out),
            other => {
                tracing::warn!(key = %key, kind = other.type_str(), "Ignoring unsupported config value");
            }
        }
    }
}

fn render_values(values: &BTreeMap<String, PrefValue>) -> Result<String> {
    let mut root = toml::Table::new();
    for (key, value) in values {
        let mut parts: Vec<&str> = key.split('.').collect();
        let Some(leaf) = parts.pop() else {
            continue;
        };

        let mut table = &mut root;
        for part in parts {
            let entry = table
                .entry(part.to_string())
                .or_insert_with(|| toml::Value::Table(toml::Table::new()));
            table = match entry {
                toml::Value::Table(t) => t,
                _ => bail!("Config key {} clashes with a value at {}", key, part),
            };
        }
        let value = match value {
            PrefValue::Bool(b) => toml::Value::Boolean(*b),
            PrefValue::Int(i) => toml::Value::Integer(*i),
            PrefValue::Float(f) => toml::Value::Float(*f),
            PrefValue::Text(s) => toml::Value::String(s.clone()),
        };
        table.insert(leaf.to_string(), value);
    }
    toml::to_string_pretty(&root).context("Failed to serialize config")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_become_dotted_keys() {
        let values = parse_values(
            r#"
            [server]
            current = "Bria"

            [guard]
            alert_once = false
            age_limit_hours = 48

            [harvester]
            server_modifier = 1.5
            "#,
        )
        .unwrap();

        assert_eq!(values.get("server.current"), Some(&PrefValue::Text("Bria".into())));
        assert_eq!(values.get("guard.alert_once"), Some(&PrefValue::Bool(false)));
        assert_eq!(values.get("guard.age_limit_hours"), Some(&PrefValue::Int(48)));
        assert_eq!(values.get("harvester.server_modifier"), Some(&PrefValue::Float(1.5)));
    }

    #[test]
    fn test_render_then_parse() {
        let mut values = BTreeMap::new();
        values.insert("alert.mute_minutes".to_string(), PrefValue::Int(-1));
        values.insert("server.current".to_string(), PrefValue::Text("Bria".into()));

        let text = render_values(&values).unwrap();
        assert!(text.contains("[alert]"));
        assert_eq!(parse_values(&text).unwrap(), values);
    }

    #[test]
    fn test_invalid_modifier_falls_back_like_scans() {
        let mut config = Config::default();
        config.set("harvester.server_modifier", PrefValue::Float(-2.0));
        assert_eq!(config.scan_config().server_modifier, 1.0);

        config.set("harvester.server_modifier", PrefValue::Float(1.5));
        assert_eq!(config.scan_config().server_modifier, 1.5);
    }

    #[test]
    fn test_clashing_keys_rejected() {
        let mut values = BTreeMap::new();
        values.insert("scan".to_string(), PrefValue::Int(1));
        values.insert("scan.interval_secs".to_string(), PrefValue::Int(60));
        assert!(render_values(&values).is_err());
    }
}
