//! Alert sink that writes sounds to the log

use crate::domain::AlertKind;
use crate::ports::AlertSink;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn play(&self, kind: AlertKind) {
        match kind {
            AlertKind::Alarm => tracing::warn!("🚨 Alarm"),
            AlertKind::Alert => tracing::info!("🔔 Alert"),
            AlertKind::Warning => tracing::info!("⚠️  Warning"),
        }
    }
}
