//! Alert Gate - Per-kind sound rate limiting

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::config::MuteWindow;
use crate::domain::AlertKind;

/// Remembers when each sound class last played
#[derive(Debug, Default)]
pub struct AlertGate {
    last_played: HashMap<AlertKind, DateTime<Utc>>,
}

impl AlertGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether `kind` may sound now, recording it when it may
    pub fn admit(&mut self, kind: AlertKind, now: DateTime<Utc>, mute: MuteWindow) -> bool {
        let window = match mute {
            MuteWindow::Always => return false,
            MuteWindow::For(window) => window,
        };
        if let Some(last) = self.last_played.get(&kind) {
            if now - *last < window {
                return false;
            }
        }
        self.last_played.insert(kind, now);
        true
    }

    pub fn last_played(&self, kind: AlertKind) -> Option<DateTime<Utc>> {
        self.last_played.get(&kind).copied()
    }
}
