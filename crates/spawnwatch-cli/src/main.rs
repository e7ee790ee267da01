//! Spawnwatch CLI - Guard checks, harvester math and a watch loop
//!
//! Reads resource snapshots and guard files from disk; preferences come
//! from ~/.config/spawnwatch/config.toml.

mod adapters;
mod config;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

use spawnwatch::adapters::{InMemoryCatalog, TracingAlertSink};
use spawnwatch::application::keys;
use spawnwatch::domain::services::guard_file;
use spawnwatch::{
    AlertLevel, Collections, CoordinatorPorts, GuardImport, Harvester, HarvesterBonuses,
    HarvesterOwner, HarvesterStatus, HarvesterType, PrefValue, PreferenceStore, Resource,
    ResourceClass, ResourceKey, ScanCoordinator, ScanSummary, StatValues, SystemClock,
};

use config::Config;

/// How often `watch` looks for a newer snapshot file
const SNAPSHOT_POLL_SECS: u64 = 5;

#[derive(Parser)]
#[command(name = "spawnwatch")]
#[command(about = "Spawnwatch - resource guards, harvesters and monitors", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.config/spawnwatch/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scan against a snapshot
    Check {
        /// Resource snapshot (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,
        /// Guard file
        #[arg(short, long)]
        guards: PathBuf,
        /// Server to scan (overrides server.current)
        #[arg(long)]
        server: Option<String>,
        /// Print the scan summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scan periodically until Ctrl-C
    Watch {
        /// Resource snapshot (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,
        /// Guard file
        #[arg(short, long)]
        guards: PathBuf,
        /// Server to scan (overrides server.current)
        #[arg(long)]
        server: Option<String>,
    },

    /// Guard file tools
    Guards {
        #[command(subcommand)]
        action: GuardsAction,
    },

    /// Harvester calculations
    Harvester {
        #[command(subcommand)]
        action: HarvesterAction,
    },

    /// Show or change preferences
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum GuardsAction {
    /// Report which lines parse
    Validate {
        file: PathBuf,
        /// Snapshot providing the class taxonomy
        #[arg(short, long)]
        snapshot: PathBuf,
    },
    /// Re-export in the canonical column order
    Normalize {
        file: PathBuf,
        /// Snapshot providing the class taxonomy
        #[arg(short, long)]
        snapshot: PathBuf,
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum HarvesterAction {
    /// Extraction rate, hopper and drain times for one harvester
    Calc {
        /// Harvester type, e.g. mineral-heavy
        #[arg(short = 't', long = "type")]
        kind: String,
        /// Resource concentration (0-100)
        #[arg(short, long)]
        concentration: f64,
        /// Base extraction rate (defaults to the type's)
        #[arg(long)]
        ber: Option<f64>,
        /// Hopper size (defaults to the type's)
        #[arg(long)]
        hopper: Option<u32>,
        /// Energy efficiency expertise (0-4)
        #[arg(long, default_value = "0")]
        energy: u8,
        /// Maintenance efficiency expertise (0-4)
        #[arg(long, default_value = "0")]
        maint: u8,
        /// Storage efficiency expertise (0-4)
        #[arg(long, default_value = "0")]
        storage: u8,
        /// Harvesting technology expertise (0-2)
        #[arg(long, default_value = "0")]
        tech: u8,
        /// Entertainer buff (0-5)
        #[arg(long, default_value = "0")]
        buff: u8,
        /// Power deposited (units)
        #[arg(long, default_value = "0")]
        power: f64,
        /// Maintenance deposited (credits)
        #[arg(long, default_value = "0")]
        maintenance: f64,
    },
    /// List harvester types and their constants
    Types,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all preferences
    Show,
    /// Set a preference
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Check { snapshot, guards, server, json } => {
            cmd_check(&config, &snapshot, &guards, server, json).await
        }
        Commands::Watch { snapshot, guards, server } => {
            cmd_watch(&config, &snapshot, &guards, server).await
        }
        Commands::Guards { action } => cmd_guards(action),
        Commands::Harvester { action } => cmd_harvester(&config, action),
        Commands::Config { action } => cmd_config(config, action),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,spawnwatch=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ============================================
// Command Implementations
// ============================================

/// Coordinator over a snapshot with the file's guards loaded
async fn prepare(
    config: &Config,
    snapshot: &Path,
    guards: &Path,
    server: Option<String>,
) -> Result<(ScanCoordinator, Arc<InMemoryCatalog>, String)> {
    let catalog = Arc::new(adapters::load_catalog(snapshot)?);

    let prefs = config.preferences();
    if let Some(server) = server {
        prefs.set(keys::SERVER_CURRENT, PrefValue::Text(server));
    }
    let server = prefs.get_str(keys::SERVER_CURRENT).context(
        "No server selected. Use --server or 'spawnwatch config set server.current <name>'",
    )?;

    let coordinator = ScanCoordinator::new(
        CoordinatorPorts {
            catalog: catalog.clone(),
            preferences: Arc::new(prefs),
            clock: Arc::new(SystemClock),
            alerts: Arc::new(TracingAlertSink),
            reporter: None,
        },
        Collections::default(),
    );

    let text = fs::read_to_string(guards)
        .with_context(|| format!("Failed to read guard file: {:?}", guards))?;
    let import = coordinator.import_guards(&server, &text).await;
    print_import_errors(&import);

    Ok((coordinator, catalog, server))
}

async fn cmd_check(
    config: &Config,
    snapshot: &Path,
    guards: &Path,
    server: Option<String>,
    json: bool,
) -> Result<()> {
    let (coordinator, _, server) = prepare(config, snapshot, guards, server).await?;

    let scan = coordinator.check().context("A scan is already running")?;
    let summary = scan.await.context("Scan task failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&server, &summary);
    }
    Ok(())
}

async fn cmd_watch(
    config: &Config,
    snapshot: &Path,
    guards: &Path,
    server: Option<String>,
) -> Result<()> {
    let (coordinator, catalog, server) = prepare(config, snapshot, guards, server).await?;
    let mut levels = coordinator.subscribe();

    if !coordinator.init() {
        println!(
            "{} scan.interval_secs is 0, scans run only when the snapshot changes",
            "!".yellow()
        );
    }
    if let Some(scan) = coordinator.check() {
        let summary = scan.await.context("Scan task failed")?;
        print_summary(&server, &summary);
    }

    let mut seen = modified_at(snapshot);
    let mut poll = tokio::time::interval(Duration::from_secs(SNAPSHOT_POLL_SECS));
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    println!("{}", "Watching... press Ctrl-C to stop".dimmed());
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = levels.changed() => {
                if changed.is_err() {
                    break;
                }
                let level = *levels.borrow_and_update();
                println!("{} {}", Utc::now().format("%H:%M:%S").to_string().dimmed(), level_label(level));
            }
            _ = poll.tick() => {
                let modified = modified_at(snapshot);
                if modified == seen {
                    continue;
                }
                seen = modified;
                if let Some(scan) = reload_snapshot(&coordinator, &catalog, snapshot, &server) {
                    let summary = scan.await.context("Scan task failed")?;
                    print_summary(&server, &summary);
                }
            }
        }
    }

    coordinator.shutdown();
    Ok(())
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Load a changed snapshot into the catalog and request a scan
///
/// A snapshot that fails to load leaves the catalog as it was.
fn reload_snapshot(
    coordinator: &ScanCoordinator,
    catalog: &InMemoryCatalog,
    path: &Path,
    current: &str,
) -> Option<JoinHandle<ScanSummary>> {
    let snapshot = match adapters::read_snapshot(path) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red(), e);
            return None;
        }
    };
    let servers = snapshot.apply(catalog);
    println!("{} Snapshot reloaded ({} servers)", "✓".green(), servers.len());

    let server = servers
        .iter()
        .find(|s| s.as_str() == current)
        .or_else(|| servers.first())?;
    coordinator.on_snapshot_updated(server)
}

fn cmd_guards(action: GuardsAction) -> Result<()> {
    match action {
        GuardsAction::Validate { file, snapshot } => {
            let import = read_guards(&file, &snapshot)?;
            print_import_errors(&import);
            let status = if import.errors.is_empty() {
                "✓".green()
            } else {
                "✗".red()
            };
            println!(
                "{} {} guards, {} rejected lines",
                status,
                import.guards.len(),
                import.errors.len()
            );
            if !import.errors.is_empty() {
                bail!("Guard file has errors");
            }
        }

        GuardsAction::Normalize { file, snapshot, output } => {
            let import = read_guards(&file, &snapshot)?;
            print_import_errors(&import);
            let text =
                guard_file::export(&import.guards).context("Failed to write guards back out")?;
            match output {
                Some(path) => {
                    fs::write(&path, text)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    eprintln!("{} {} guards written to {:?}", "✓".green(), import.guards.len(), path);
                }
                None => print!("{}", text),
            }
        }
    }
    Ok(())
}

fn read_guards(file: &Path, snapshot: &Path) -> Result<GuardImport> {
    let catalog: InMemoryCatalog = adapters::load_catalog(snapshot)?;
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read guard file: {:?}", file))?;
    Ok(guard_file::parse(&text, &catalog))
}

fn cmd_harvester(config: &Config, action: HarvesterAction) -> Result<()> {
    match action {
        HarvesterAction::Calc {
            kind,
            concentration,
            ber,
            hopper,
            energy,
            maint,
            storage,
            tech,
            buff,
            power,
            maintenance,
        } => {
            let kind: HarvesterType = kind.parse()?;
            let now = Utc::now();
            let modifier = config.scan_config().server_modifier;

            let mut harvester = Harvester::new(
                "calc",
                kind,
                ber.unwrap_or_else(|| kind.default_ber()),
                hopper.unwrap_or_else(|| kind.default_hopper()),
                now,
            )?;
            let owner = HarvesterOwner::new(
                "calc",
                HarvesterBonuses::new(energy, maint, storage, tech, buff)?,
            )?;
            let placeholder = Resource::new(
                ResourceKey::new("-", "-"),
                ResourceClass::new("resource", "Resource"),
                StatValues::new(),
                now,
            );
            harvester.activate(&owner, placeholder, concentration, now)?;
            harvester.record_reading(maintenance, power, now)?;

            println!("{} {}", "Harvester".bold(), kind.to_string().cyan());
            println!("  BER:               {:.2} /min", harvester.ber());
            println!("  Modifier:          {:.3}", harvester.extraction_modifier(modifier));
            println!("  AER:               {:.2} /min", harvester.aer(modifier));
            println!("  Hopper capacity:   {:.0}", harvester.hopper_capacity());
            println!("  Power use:         {:.1} /h", harvester.power_rate());
            println!("  Maintenance use:   {:.1} /h", harvester.maintenance_rate());
            println!("  Hopper full:       {}", describe_at(harvester.hopper_full_at(modifier), now));
            println!("  Power drained:     {}", describe_at(harvester.power_drained_at(), now));
            println!("  Maintenance out:   {}", describe_at(harvester.maintenance_drained_at(), now));
        }

        HarvesterAction::Types => {
            println!("{}", "Harvester types:".bold());
            for kind in HarvesterType::all() {
                let power = if kind.is_self_powered() {
                    "self-powered".green().to_string()
                } else {
                    format!("{} power/h", kind.power_rate())
                };
                println!(
                    "  {:<18} BER {:>4}  hopper {:>7}  {} maint/h  {}",
                    kind.to_string().cyan(),
                    kind.default_ber(),
                    kind.default_hopper(),
                    kind.maintenance_rate(),
                    power
                );
            }
        }
    }
    Ok(())
}

fn cmd_config(mut config: Config, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", "Configuration:".bold());
            println!("  Path: {:?}", config.path());
            for key in keys::ALL {
                match config.values().get(key) {
                    Some(value) => println!("  {} = {}", key.cyan(), value),
                    None => println!("  {} = {}", key.cyan(), "(default)".dimmed()),
                }
            }
            for (key, value) in config.values() {
                if !keys::ALL.contains(&key.as_str()) {
                    println!("  {} = {} {}", key, value, "(unused)".yellow());
                }
            }
        }

        ConfigAction::Set { key, value } => {
            if !keys::ALL.contains(&key.as_str()) {
                println!("{} '{}' is not a known preference", "!".yellow(), key);
            }
            let value = PrefValue::parse(&value);
            config.set(&key, value.clone());
            config.save()?;
            println!("{} {} = {}", "✓".green(), key, value);
        }
    }
    Ok(())
}

// ============================================
// Output helpers
// ============================================

fn level_label(level: AlertLevel) -> String {
    match level {
        AlertLevel::Urgent => "URGENT".red().bold().to_string(),
        AlertLevel::Notice => "notice".yellow().to_string(),
        AlertLevel::Clear => "clear".green().to_string(),
    }
}

fn print_import_errors(import: &GuardImport) {
    for error in &import.errors {
        eprintln!("  {} {}", "✗".red(), error);
    }
}

fn print_summary(current: &str, summary: &ScanSummary) {
    println!("{} {}", "Scan:".bold(), level_label(summary.level));

    if let Some(guards) = &summary.guards {
        if guards.triggered.is_empty() {
            println!("  {} no guard triggered on {}", "·".dimmed(), current.cyan());
        }
        for name in &guards.triggered {
            let marker = if guards.fresh.contains(name) {
                "new".red().bold().to_string()
            } else {
                "seen".dimmed().to_string()
            };
            println!("  {} guard {} [{}]", "●".yellow(), name.cyan(), marker);
        }
    }

    for key in &summary.depleted_monitors {
        println!("  {} monitored {} is depleted", "●".red(), key);
    }
    if summary.purged_monitors > 0 {
        println!("  {} {} expired monitors purged", "·".dimmed(), summary.purged_monitors);
    }

    for (server, report) in &summary.harvesters {
        for (name, status) in &report.statuses {
            let text = match status {
                HarvesterStatus::Ok => "ok".green().to_string(),
                HarvesterStatus::Warning(reason) => format!("{:?}", reason).yellow().to_string(),
                HarvesterStatus::Idling(reason) => format!("{:?}", reason).red().to_string(),
            };
            println!("  {} harvester {}@{}: {}", "●".blue(), name, server, text);
        }
    }

    if !summary.sounds.is_empty() {
        let sounds: Vec<String> = summary.sounds.iter().map(|k| k.to_string()).collect();
        println!("  {} {}", "♪".magenta(), sounds.join(", "));
    }
}

/// "never", or the time with how far away it is
fn describe_at(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    if at == DateTime::<Utc>::MAX_UTC {
        return "never".green().to_string();
    }
    let left = at - now;
    let text = format!(
        "{} (in {}h {:02}m)",
        at.format("%Y-%m-%d %H:%M UTC"),
        left.num_hours(),
        left.num_minutes() % 60
    );
    if left.num_hours() < 24 {
        text.yellow().to_string()
    } else {
        text
    }
}
