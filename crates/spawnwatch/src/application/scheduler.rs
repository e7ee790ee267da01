//! Scan Scheduler - Periodic scans
//!
//! Asks the coordinator for a scan at a fixed interval. A tick that lands on
//! a running scan is dropped like any other request. The scheduler holds a
//! weak handle and stops once the coordinator is gone.

use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

use super::coordinator::{ScanCoordinator, WeakScanCoordinator};

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between scans
    pub interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300), // 5 minutes
        }
    }
}

/// Periodic scan driver
pub struct ScanScheduler {
    coordinator: WeakScanCoordinator,
    config: SchedulerConfig,
}

impl ScanScheduler {
    pub fn new(coordinator: &ScanCoordinator, config: Option<SchedulerConfig>) -> Self {
        Self {
            coordinator: coordinator.downgrade(),
            config: config.unwrap_or_default(),
        }
    }

    /// Start the scheduler (runs in background)
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(self) {
        tracing::info!(
            "📅 Scan scheduler started (interval: {:?})",
            self.config.interval
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Skip the first immediate tick
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let Some(coordinator) = self.coordinator.upgrade() else {
                tracing::info!("📅 Scan scheduler stopped, coordinator dropped");
                return;
            };
            let Some(handle) = coordinator.check() else {
                tracing::debug!("🔄 Scheduler: scan still running, tick skipped");
                continue;
            };

            drop(coordinator);
            match handle.await {
                Ok(summary) => {
                    tracing::info!(
                        "🔄 Scheduler: scan completed ({}, {} harvester servers, {} depleted monitors)",
                        summary.level,
                        summary.harvesters.len(),
                        summary.depleted_monitors.len()
                    );
                }
                Err(e) => {
                    tracing::warn!("  ❌ Scan task failed: {}", e);
                }
            }
        }
    }
}
