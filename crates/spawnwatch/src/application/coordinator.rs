//! Scan Coordinator (Use Case)
//!
//! Owns the per-server collections and the ports, runs scans in a fixed
//! order and turns their results into one alert level plus rate-limited
//! sounds.
//!
//! Each collection sits behind one `tokio::sync::Mutex`. Scans and mutations
//! take the same locks, always in the order guards, harvesters, monitors,
//! inventory, and never hold two at once except harvesters then inventory.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::{Arc, Weak};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use super::alert_gate::AlertGate;
use super::config::ScanConfig;
use super::scheduler::{ScanScheduler, SchedulerConfig};
use super::stores::{GuardBook, HarvesterBook, MonitorBook};
use crate::domain::services::{
    guard_engine, guard_file, harvester_scan, monitor_tracker, AddOutcome, GuardImport,
    GuardScanReport, GuardScanWindow, HarvesterScanReport, HarvesterScanWindow, HarvesterStatus,
    InventoryLedger,
};
use crate::domain::{
    AlertKind, AlertLevel, DomainError, Guard, Harvester, HarvesterOwner, InventoryWrapper,
    Monitor, ReconcileMode, ResourceKey,
};
use crate::ports::{AlertSink, Clock, DepletionReporter, PreferenceStore, ResourceCatalog};

/// External collaborators of the coordinator
#[derive(Clone)]
pub struct CoordinatorPorts {
    pub catalog: Arc<dyn ResourceCatalog>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub clock: Arc<dyn Clock>,
    pub alerts: Arc<dyn AlertSink>,
    /// Optional; without it depletion reports are refused
    pub reporter: Option<Arc<dyn DepletionReporter>>,
}

/// Initial contents of the collections
#[derive(Debug, Clone, Default)]
pub struct Collections {
    pub guards: GuardBook,
    pub harvesters: HarvesterBook,
    pub monitors: MonitorBook,
    pub inventory: InventoryLedger,
}

/// Everything one scan found
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSummary {
    pub level: AlertLevel,
    /// Guard scan of the current server, when it ran
    pub guards: Option<GuardScanReport>,
    pub purged_monitors: usize,
    pub depleted_monitors: Vec<ResourceKey>,
    /// Per server, current server last
    pub harvesters: Vec<(String, HarvesterScanReport)>,
    /// Sounds that actually played
    pub sounds: Vec<AlertKind>,
}

struct Shared {
    ports: CoordinatorPorts,
    guards: Mutex<GuardBook>,
    harvesters: Mutex<HarvesterBook>,
    monitors: Mutex<MonitorBook>,
    inventory: Mutex<InventoryLedger>,
    gate: Mutex<AlertGate>,
    scan_lock: Arc<Mutex<()>>,
    level: watch::Sender<AlertLevel>,
    scheduler: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        let slot = self.scheduler.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

/// Entry point for scans and for every change to the collections
#[derive(Clone)]
pub struct ScanCoordinator {
    shared: Arc<Shared>,
}

/// Coordinator handle that does not keep the coordinator alive
#[derive(Clone)]
pub struct WeakScanCoordinator {
    shared: Weak<Shared>,
}

impl WeakScanCoordinator {
    pub fn upgrade(&self) -> Option<ScanCoordinator> {
        self.shared.upgrade().map(|shared| ScanCoordinator { shared })
    }
}

impl ScanCoordinator {
    pub fn new(ports: CoordinatorPorts, collections: Collections) -> Self {
        let (level, _) = watch::channel(AlertLevel::Clear);
        Self {
            shared: Arc::new(Shared {
                ports,
                guards: Mutex::new(collections.guards),
                harvesters: Mutex::new(collections.harvesters),
                monitors: Mutex::new(collections.monitors),
                inventory: Mutex::new(collections.inventory),
                gate: Mutex::new(AlertGate::new()),
                scan_lock: Arc::new(Mutex::new(())),
                level,
                scheduler: std::sync::Mutex::new(None),
            }),
        }
    }

    /// Start periodic scans; returns false when the interval is disabled
    ///
    /// Calling it again while the scheduler runs changes nothing. The
    /// scheduler stops on `shutdown` or once the last handle is dropped.
    pub fn init(&self) -> bool {
        let config = ScanConfig::load(self.shared.ports.preferences.as_ref());
        let Some(interval) = config.scan_interval else {
            tracing::info!("📅 Scan scheduler disabled");
            return false;
        };

        let mut slot = self
            .shared
            .scheduler
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if slot.as_ref().is_some_and(|h| !h.is_finished()) {
            return true;
        }
        let scheduler = ScanScheduler::new(self, Some(SchedulerConfig { interval }));
        *slot = Some(scheduler.start());
        true
    }

    /// Stop periodic scans
    pub fn shutdown(&self) {
        let handle = self
            .shared
            .scheduler
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
            tracing::info!("📅 Scan scheduler stopped");
        }
    }

    /// Run a scan in the background unless one is already running
    ///
    /// A request that arrives during a scan is dropped, not queued.
    pub fn check(&self) -> Option<JoinHandle<ScanSummary>> {
        let permit = match self.shared.scan_lock.clone().try_lock_owned() {
            Ok(permit) => permit,
            Err(_) => {
                tracing::debug!("Scan already in progress, request dropped");
                return None;
            }
        };
        let shared = self.shared.clone();
        Some(tokio::spawn(async move {
            let summary = shared.run_scan().await;
            drop(permit);
            summary
        }))
    }

    /// A new resource snapshot arrived for a server
    pub fn on_snapshot_updated(&self, server: &str) -> Option<JoinHandle<ScanSummary>> {
        tracing::debug!(server, "Snapshot updated, requesting scan");
        self.check()
    }

    /// Level of the last finished scan
    pub fn alert_level(&self) -> AlertLevel {
        *self.shared.level.borrow()
    }

    /// Receive the level after every scan
    pub fn subscribe(&self) -> watch::Receiver<AlertLevel> {
        self.shared.level.subscribe()
    }

    pub fn downgrade(&self) -> WeakScanCoordinator {
        WeakScanCoordinator {
            shared: Arc::downgrade(&self.shared),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.shared.ports.clock.now()
    }

    // ---- guards ----

    pub async fn add_guard(&self, server: &str, guard: Guard) -> Result<(), DomainError> {
        let name = guard.name.clone();
        self.shared.guards.lock().await.add(server, guard)?;
        tracing::info!("Added guard {} on {}", name, server);
        Ok(())
    }

    pub async fn remove_guard(&self, server: &str, name: &str) -> usize {
        self.shared.guards.lock().await.remove(server, name)
    }

    pub async fn clear_guards(&self, server: &str) -> usize {
        let removed = self.shared.guards.lock().await.clear(server);
        tracing::info!("Cleared {} guards on {}", removed, server);
        removed
    }

    pub async fn guards(&self, server: &str) -> Vec<Guard> {
        self.shared.guards.lock().await.guards(server).to_vec()
    }

    /// Parse a guard file and add what it holds
    ///
    /// Guards that already exist are skipped; they stay out of the returned
    /// list but are not counted as errors.
    pub async fn import_guards(&self, server: &str, text: &str) -> GuardImport {
        let parsed = guard_file::parse(text, self.shared.ports.catalog.as_ref());
        let mut book = self.shared.guards.lock().await;
        let mut added = Vec::with_capacity(parsed.guards.len());
        for guard in parsed.guards {
            match book.add(server, guard.clone()) {
                Ok(()) => added.push(guard),
                Err(e) => tracing::debug!(error = %e, "Skipping imported guard"),
            }
        }
        tracing::info!(
            "Imported {} guards on {} ({} lines rejected)",
            added.len(),
            server,
            parsed.errors.len()
        );
        GuardImport {
            guards: added,
            errors: parsed.errors,
        }
    }

    pub async fn export_guards(&self, server: &str) -> Result<String, DomainError> {
        guard_file::export(self.shared.guards.lock().await.guards(server))
    }

    // ---- harvesters ----

    pub async fn add_harvester(&self, server: &str, harvester: Harvester) -> Result<(), DomainError> {
        let name = harvester.name().to_string();
        self.shared
            .harvesters
            .lock()
            .await
            .add_harvester(server, harvester)?;
        tracing::info!("Added harvester {} on {}", name, server);
        Ok(())
    }

    pub async fn remove_harvester(&self, server: &str, name: &str) -> Result<Harvester, DomainError> {
        self.shared
            .harvesters
            .lock()
            .await
            .remove_harvester(server, name)
    }

    pub async fn harvesters(&self, server: &str) -> Vec<Harvester> {
        self.shared.harvesters.lock().await.harvesters(server).to_vec()
    }

    pub async fn upsert_owner(&self, server: &str, owner: HarvesterOwner) {
        self.shared.harvesters.lock().await.upsert_owner(server, owner);
    }

    pub async fn remove_owner(&self, server: &str, name: &str) -> bool {
        self.shared.harvesters.lock().await.remove_owner(server, name)
    }

    /// Put a harvester on a resource for one of the server's owners
    pub async fn activate_harvester(
        &self,
        server: &str,
        name: &str,
        owner: &str,
        resource: &ResourceKey,
        concentration: f64,
    ) -> Result<(), DomainError> {
        let found = self
            .shared
            .ports
            .catalog
            .resource(resource)
            .ok_or_else(|| DomainError::not_found("Resource", &resource.to_string()))?;
        let now = self.now();

        let mut book = self.shared.harvesters.lock().await;
        let owner = book
            .owner(server, owner)
            .cloned()
            .ok_or_else(|| DomainError::not_found("HarvesterOwner", owner))?;
        let harvester = book
            .harvester_mut(server, name)
            .ok_or_else(|| DomainError::not_found("Harvester", name))?;
        harvester.activate(&owner, found, concentration, now)?;
        tracing::info!("Activated harvester {} on {} for {}", name, resource, owner.name);
        Ok(())
    }

    /// Stop a harvester
    ///
    /// When the harvester is flagged to feed the inventory, the hopper
    /// contents are added to the owner's stock first. Returns the units
    /// added.
    pub async fn deactivate_harvester(
        &self,
        server: &str,
        name: &str,
        re_deed: bool,
    ) -> Result<Option<u64>, DomainError> {
        let config = ScanConfig::load(self.shared.ports.preferences.as_ref());
        let now = self.now();

        let mut book = self.shared.harvesters.lock().await;
        let harvester = book
            .harvester_mut(server, name)
            .ok_or_else(|| DomainError::not_found("Harvester", name))?;

        let mut stocked = None;
        if harvester.is_active() && harvester.add_to_inventory {
            if let (Some(resource), Some(owner)) = (harvester.resource(), harvester.owner()) {
                let units = harvester.hopper_units(now, config.server_modifier);
                let wrapper = InventoryWrapper::new(owner, resource.key.clone(), units);
                self.shared
                    .inventory
                    .lock()
                    .await
                    .add(server, wrapper, ReconcileMode::Add);
                stocked = Some(units);
            }
        }
        harvester.deactivate(re_deed);
        tracing::info!("Deactivated harvester {} on {} (re-deed: {})", name, server, re_deed);
        Ok(stocked)
    }

    /// Enter fresh maintenance and power readings
    pub async fn record_harvester_reading(
        &self,
        server: &str,
        name: &str,
        maintenance: f64,
        power: f64,
    ) -> Result<(), DomainError> {
        let now = self.now();
        let mut book = self.shared.harvesters.lock().await;
        book.harvester_mut(server, name)
            .ok_or_else(|| DomainError::not_found("Harvester", name))?
            .record_reading(maintenance, power, now)
    }

    // ---- monitors ----

    pub async fn add_monitor(&self, resource: &ResourceKey, notes: &str) -> Result<(), DomainError> {
        let found = self
            .shared
            .ports
            .catalog
            .resource(resource)
            .ok_or_else(|| DomainError::not_found("Resource", &resource.to_string()))?;
        let monitor = Monitor::new(found, self.now())?.with_notes(notes);
        self.shared.monitors.lock().await.add(monitor)?;
        tracing::info!("Monitoring {}", resource);
        Ok(())
    }

    pub async fn remove_monitor(&self, resource: &ResourceKey) -> bool {
        self.shared.monitors.lock().await.remove(resource)
    }

    pub async fn monitors(&self, server: &str) -> Vec<Monitor> {
        self.shared.monitors.lock().await.monitors(server).to_vec()
    }

    // ---- inventory ----

    pub async fn inventory_add(
        &self,
        server: &str,
        wrapper: InventoryWrapper,
        mode: ReconcileMode,
    ) -> AddOutcome {
        self.shared.inventory.lock().await.add(server, wrapper, mode)
    }

    pub async fn inventory_remove(&self, server: &str, assignee: &str, resource: &ResourceKey) -> bool {
        self.shared
            .inventory
            .lock()
            .await
            .remove(server, assignee, resource)
    }

    /// Stock held across assignees; `None` when nobody holds it
    pub async fn inventory_total(&self, server: &str, resource: &ResourceKey) -> Option<u64> {
        self.shared.inventory.lock().await.total_amount(server, resource)
    }

    pub async fn inventory(&self, server: &str) -> Vec<InventoryWrapper> {
        self.shared.inventory.lock().await.flattened(server)
    }

    // ---- remote ----

    /// Tell the data service a resource is gone and flag it locally on success
    pub async fn report_depleted(&self, resource: &ResourceKey) -> Result<(), DomainError> {
        let reporter = self.shared.ports.reporter.clone().ok_or_else(|| {
            DomainError::InvalidState("No depletion reporter configured".to_string())
        })?;
        let found = self
            .shared
            .ports
            .catalog
            .resource(resource)
            .ok_or_else(|| DomainError::not_found("Resource", &resource.to_string()))?;

        if let Err(fault) = reporter.report_depleted(&found).await {
            tracing::warn!(resource = %resource, error = %fault, "Depletion report failed");
            return Err(fault.into());
        }
        self.shared.ports.catalog.mark_depleted(resource, self.now());
        tracing::info!("Reported {} depleted", resource);
        Ok(())
    }
}

impl Shared {
    async fn run_scan(&self) -> ScanSummary {
        let config = ScanConfig::load(self.ports.preferences.as_ref());
        let now = self.ports.clock.now();
        let catalog = self.ports.catalog.as_ref();
        let mut summary = ScanSummary::default();
        let mut wanted: BTreeSet<AlertKind> = BTreeSet::new();

        tracing::debug!("🔄 Scan started");

        // guards of the current server only
        let guard_server = config
            .current_server
            .as_deref()
            .filter(|_| config.guard_scan_enabled);
        if let Some(server) = guard_server {
            let snapshot = catalog.spawning(server);
            let claimed = self.harvesters.lock().await.claimed(server);
            let window = GuardScanWindow {
                now,
                age_limit: config.guard_age_limit,
                new_spawn: config.new_spawn,
            };
            let report = {
                let mut book = self.guards.lock().await;
                guard_engine::scan(book.guards_mut(server), &snapshot, &claimed, window)
            };

            if !report.fresh.is_empty() {
                wanted.insert(if report.alarm {
                    AlertKind::Alarm
                } else {
                    AlertKind::Alert
                });
            } else if !report.triggered.is_empty() && !config.alert_once {
                wanted.insert(AlertKind::Alert);
            }
            summary.level = summary.level.escalate(report.level);
            summary.guards = Some(report);
        }

        // monitors of every server
        if config.monitor_scan_enabled {
            let mut book = self.monitors.lock().await;
            for (server, monitors) in book.iter_mut() {
                let purged = monitor_tracker::purge(monitors, now);
                if purged > 0 {
                    tracing::info!("Purged {} expired monitors on {}", purged, server);
                }
                summary.purged_monitors += purged;
                summary.depleted_monitors.extend(
                    monitor_tracker::depleted(monitors, catalog)
                        .into_iter()
                        .map(|m| m.resource.key.clone()),
                );
            }
            if !summary.depleted_monitors.is_empty() {
                wanted.insert(AlertKind::Alert);
                summary.level = summary.level.escalate(AlertLevel::Urgent);
            }
        }

        // harvesters of every server, current server last
        if config.harvester_scan_enabled {
            let book = self.harvesters.lock().await;
            let mut servers = book.active_servers();
            if let Some(current) = config.current_server.as_deref() {
                if let Some(pos) = servers.iter().position(|s| s == current) {
                    let current = servers.remove(pos);
                    servers.push(current);
                }
            }
            let window = HarvesterScanWindow {
                now,
                warning: config.harvester_warning,
                base_modifier: config.server_modifier,
            };
            for server in servers {
                let report = harvester_scan::scan(book.harvesters(&server), catalog, window);
                for (_, status) in &report.statuses {
                    match status {
                        HarvesterStatus::Idling(_) => {
                            wanted.insert(AlertKind::Alert);
                        }
                        HarvesterStatus::Warning(_) => {
                            wanted.insert(AlertKind::Warning);
                        }
                        HarvesterStatus::Ok => {}
                    }
                }
                summary.level = summary.level.escalate(report.level);
                summary.harvesters.push((server, report));
            }
        }

        {
            let mut gate = self.gate.lock().await;
            for kind in wanted {
                if gate.admit(kind, now, config.mute) {
                    self.ports.alerts.play(kind);
                    summary.sounds.push(kind);
                } else {
                    tracing::debug!(%kind, "Sound muted");
                }
            }
        }

        self.level.send_replace(summary.level);
        tracing::info!(
            "🔄 Scan finished: {} ({} sounds)",
            summary.level,
            summary.sounds.len()
        );
        summary
    }
}
