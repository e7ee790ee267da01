//! Scan Configuration
//!
//! Typed view of the tunables in the preference store, re-read at the start
//! of every scan.

use chrono::Duration;

use crate::ports::PreferenceStore;

/// Preference keys
pub mod keys {
    pub const SERVER_CURRENT: &str = "server.current";
    pub const GUARD_SCAN_ENABLED: &str = "guard.scan_enabled";
    pub const GUARD_AGE_LIMIT_HOURS: &str = "guard.age_limit_hours";
    pub const GUARD_NEW_SPAWN_MINUTES: &str = "guard.new_spawn_minutes";
    pub const GUARD_ALERT_ONCE: &str = "guard.alert_once";
    pub const MONITOR_SCAN_ENABLED: &str = "monitor.scan_enabled";
    pub const HARVESTER_SCAN_ENABLED: &str = "harvester.scan_enabled";
    pub const HARVESTER_WARNING_HOURS: &str = "harvester.warning_hours";
    pub const HARVESTER_SERVER_MODIFIER: &str = "harvester.server_modifier";
    pub const ALERT_MUTE_MINUTES: &str = "alert.mute_minutes";
    pub const SCAN_INTERVAL_SECS: &str = "scan.interval_secs";

    /// Every key the core reads
    pub const ALL: [&str; 11] = [
        SERVER_CURRENT,
        GUARD_SCAN_ENABLED,
        GUARD_AGE_LIMIT_HOURS,
        GUARD_NEW_SPAWN_MINUTES,
        GUARD_ALERT_ONCE,
        MONITOR_SCAN_ENABLED,
        HARVESTER_SCAN_ENABLED,
        HARVESTER_WARNING_HOURS,
        HARVESTER_SERVER_MODIFIER,
        ALERT_MUTE_MINUTES,
        SCAN_INTERVAL_SECS,
    ];
}

const DEFAULT_AGE_LIMIT_HOURS: i64 = 36;
const DEFAULT_NEW_SPAWN_MINUTES: i64 = 40;
const DEFAULT_WARNING_HOURS: i64 = 24;
const DEFAULT_MUTE_MINUTES: i64 = 10;
const DEFAULT_INTERVAL_SECS: i64 = 300;

/// How long a sound class stays quiet after it played
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteWindow {
    /// Never play
    Always,
    For(Duration),
}

impl MuteWindow {
    /// Negative minutes mean always muted
    pub fn from_minutes(minutes: i64) -> Self {
        if minutes < 0 {
            return MuteWindow::Always;
        }
        Duration::try_minutes(minutes)
            .map(MuteWindow::For)
            .unwrap_or(MuteWindow::Always)
    }
}

/// Tunables for one scan
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Server whose guards are scanned; no guard scan without one
    pub current_server: Option<String>,
    pub guard_scan_enabled: bool,
    /// Resources older than this never trigger a guard
    pub guard_age_limit: Duration,
    /// Matches younger than this are new spawns
    pub new_spawn: Duration,
    /// Stay silent on matches that are no longer new
    pub alert_once: bool,
    pub monitor_scan_enabled: bool,
    pub harvester_scan_enabled: bool,
    pub harvester_warning: Duration,
    pub server_modifier: f64,
    pub mute: MuteWindow,
    /// Scheduler period; `None` disables periodic scans
    pub scan_interval: Option<std::time::Duration>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            current_server: None,
            guard_scan_enabled: true,
            guard_age_limit: Duration::hours(DEFAULT_AGE_LIMIT_HOURS),
            new_spawn: Duration::minutes(DEFAULT_NEW_SPAWN_MINUTES),
            alert_once: true,
            monitor_scan_enabled: true,
            harvester_scan_enabled: true,
            harvester_warning: Duration::hours(DEFAULT_WARNING_HOURS),
            server_modifier: 1.0,
            mute: MuteWindow::For(Duration::minutes(DEFAULT_MUTE_MINUTES)),
            scan_interval: Some(std::time::Duration::from_secs(DEFAULT_INTERVAL_SECS as u64)),
        }
    }
}

impl ScanConfig {
    /// Read every tunable, falling back to defaults for missing or bad values
    pub fn load(prefs: &dyn PreferenceStore) -> Self {
        let defaults = Self::default();

        let current_server = prefs
            .get_str(keys::SERVER_CURRENT)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let guard_age_limit = Duration::try_hours(
            prefs
                .get_i64(keys::GUARD_AGE_LIMIT_HOURS, DEFAULT_AGE_LIMIT_HOURS)
                .max(0),
        )
        .unwrap_or(defaults.guard_age_limit);
        let new_spawn = Duration::try_minutes(
            prefs
                .get_i64(keys::GUARD_NEW_SPAWN_MINUTES, DEFAULT_NEW_SPAWN_MINUTES)
                .max(0),
        )
        .unwrap_or(defaults.new_spawn);
        let harvester_warning = Duration::try_hours(
            prefs
                .get_i64(keys::HARVESTER_WARNING_HOURS, DEFAULT_WARNING_HOURS)
                .max(0),
        )
        .unwrap_or(defaults.harvester_warning);

        let server_modifier = prefs.get_f64(keys::HARVESTER_SERVER_MODIFIER, 1.0);
        let server_modifier = if server_modifier.is_finite() && server_modifier >= 0.0 {
            server_modifier
        } else {
            tracing::warn!(
                value = server_modifier,
                "Invalid server modifier, using 1.0"
            );
            1.0
        };

        let interval_secs = prefs.get_i64(keys::SCAN_INTERVAL_SECS, DEFAULT_INTERVAL_SECS);
        let scan_interval = u64::try_from(interval_secs)
            .ok()
            .filter(|secs| *secs > 0)
            .map(std::time::Duration::from_secs);

        Self {
            current_server,
            guard_scan_enabled: prefs.get_bool(keys::GUARD_SCAN_ENABLED, true),
            guard_age_limit,
            new_spawn,
            alert_once: prefs.get_bool(keys::GUARD_ALERT_ONCE, true),
            monitor_scan_enabled: prefs.get_bool(keys::MONITOR_SCAN_ENABLED, true),
            harvester_scan_enabled: prefs.get_bool(keys::HARVESTER_SCAN_ENABLED, true),
            harvester_warning,
            server_modifier,
            mute: MuteWindow::from_minutes(
                prefs.get_i64(keys::ALERT_MUTE_MINUTES, DEFAULT_MUTE_MINUTES),
            ),
            scan_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryPreferences;
    use crate::ports::PrefValue;

    #[test]
    fn test_empty_store_gives_defaults() {
        let config = ScanConfig::load(&MemoryPreferences::new());
        assert_eq!(config, ScanConfig::default());
        assert_eq!(config.guard_age_limit, Duration::hours(36));
        assert_eq!(config.new_spawn, Duration::minutes(40));
        assert_eq!(config.mute, MuteWindow::For(Duration::minutes(10)));
    }

    #[test]
    fn test_values_from_store() {
        let prefs = MemoryPreferences::new()
            .with(keys::SERVER_CURRENT, PrefValue::Text("alpha".into()))
            .with(keys::GUARD_ALERT_ONCE, PrefValue::Bool(false))
            .with(keys::HARVESTER_WARNING_HOURS, PrefValue::Int(6))
            .with(keys::HARVESTER_SERVER_MODIFIER, PrefValue::Float(1.5))
            .with(keys::ALERT_MUTE_MINUTES, PrefValue::Int(-1))
            .with(keys::SCAN_INTERVAL_SECS, PrefValue::Int(0));
        let config = ScanConfig::load(&prefs);

        assert_eq!(config.current_server.as_deref(), Some("alpha"));
        assert!(!config.alert_once);
        assert_eq!(config.harvester_warning, Duration::hours(6));
        assert_eq!(config.server_modifier, 1.5);
        assert_eq!(config.mute, MuteWindow::Always);
        assert_eq!(config.scan_interval, None);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let prefs = MemoryPreferences::new()
            .with(keys::SERVER_CURRENT, PrefValue::Text("  ".into()))
            .with(keys::GUARD_AGE_LIMIT_HOURS, PrefValue::Text("soon".into()))
            .with(keys::HARVESTER_SERVER_MODIFIER, PrefValue::Float(-2.0));
        let config = ScanConfig::load(&prefs);

        assert_eq!(config.current_server, None);
        assert_eq!(config.guard_age_limit, Duration::hours(36));
        assert_eq!(config.server_modifier, 1.0);
    }
}
