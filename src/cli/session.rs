//! Shared command setup: config, logging, ledger and registry state.

use super::config::{default_config_path, BallotConfig, LoggingConfig};
use ballotbox::address::Address;
use ballotbox::ledger::{ConfiguredLedger, LedgerClient, LedgerClock};
use ballotbox::registry::VotingRegistry;
use ballotbox::serialization::{load_snapshot, lock_snapshot, save_snapshot, SnapshotLock};
use ballotbox::service::RegistryService;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, UNIX_EPOCH};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// A loaded registry ready for one command.
///
/// Holds the snapshot lock for its whole lifetime, so a concurrent command
/// waits until this one has persisted (or failed) before reading state.
pub struct Session {
    pub config: BallotConfig,
    pub state_path: PathBuf,
    pub service: RegistryService<ConfiguredLedger>,
    _lock: SnapshotLock,
}

impl Session {
    /// Load config and the registry snapshot.
    ///
    /// `at` pins the ledger clock; otherwise the system clock is used.
    pub fn open(
        config_path: Option<String>,
        at: Option<u64>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = config_path
            .map(PathBuf::from)
            .unwrap_or_else(default_config_path);

        if !config_path.exists() {
            return Err(format!(
                "No config file found at '{}'. Run `ballotbox init` first.",
                config_path.display()
            )
            .into());
        }

        let config = BallotConfig::load(&config_path)?;
        init_logging(&config.logging)?;

        let clock = at.map(LedgerClock::Fixed).unwrap_or(LedgerClock::System);
        let ledger = config.ledger(clock);
        let state_path = config.state_path(&config_path);
        let lock = lock_snapshot(&state_path)?;

        let registry = match load_snapshot(&state_path)? {
            Some(snapshot) => {
                if snapshot.owner != config.registry.owner || snapshot.policy != config.policy() {
                    warn!(
                        path = %state_path.display(),
                        "[registry] settings differ from the snapshot; snapshot wins"
                    );
                }
                VotingRegistry::from_snapshot(snapshot).map_err(|e| {
                    format!("Snapshot '{}' is unusable: {}", state_path.display(), e)
                })?
            }
            None => {
                info!(owner = %config.registry.owner, "starting new registry");
                VotingRegistry::new(config.registry.owner, config.policy())
            }
        };

        Ok(Self {
            config,
            state_path,
            service: RegistryService::new(registry, ledger),
            _lock: lock,
        })
    }

    /// The caller for a write: `--caller`, else the configured signer.
    pub fn caller(&self, explicit: Option<Address>) -> Result<Address, Box<dyn std::error::Error>> {
        explicit
            .or(self.config.ledger.signer)
            .ok_or_else(|| "No caller given. Pass --caller or set [ledger] signer.".into())
    }

    /// Current ledger time.
    pub async fn now(&self) -> Result<u64, Box<dyn std::error::Error>> {
        Ok(self.service.ledger().block_timestamp().await?)
    }

    /// Write the registry back to disk.
    pub async fn persist(&self) -> Result<(), Box<dyn std::error::Error>> {
        let snapshot = self.service.snapshot().await;
        save_snapshot(&self.state_path, &snapshot)?;
        Ok(())
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
fn init_logging(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| format!("Invalid log level '{}': {}", logging.level, e))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    // A subscriber may already be installed (tests); keep that one.
    let installed = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| format!("Failed to open log file '{}': {}", path.display(), e))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    if let Err(e) = installed {
        debug!(error = %e, "keeping existing tracing subscriber");
    }

    Ok(())
}

/// RFC 3339 rendering of a Unix timestamp.
pub fn format_time(unix_seconds: u64) -> String {
    humantime::format_rfc3339_seconds(UNIX_EPOCH + Duration::from_secs(unix_seconds)).to_string()
}
