//! ballotbox configuration file handling
//!
//! Provides default configuration generation and loading for the operator
//! CLI. Configuration files are TOML.
//!
//! The `[registry]` section only seeds a NEW registry. Once a snapshot exists
//! its owner and policies are part of the registry state and are not changed
//! by editing this file.

use ballotbox::address::Address;
use ballotbox::ledger::{ConfiguredLedger, LedgerClock};
use ballotbox::registry::{AuthorizationPolicy, RegistryPolicy, WeightPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Default snapshot file name, resolved next to the config file
const DEFAULT_STATE_FILE: &str = "registry.cbor";

/// Operator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallotConfig {
    /// Settings for a newly created registry
    pub registry: RegistryConfig,

    /// Snapshot storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Offline ledger (signer + balance table)
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry owner (may create and finalize topics under owner-only)
    pub owner: Address,

    #[serde(default)]
    pub authorization: AuthorizationPolicy,

    #[serde(default)]
    pub weighting: WeightPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Registry snapshot path. Relative paths resolve against the config
    /// file's directory.
    #[serde(default = "default_state_file")]
    pub state_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LedgerConfig {
    /// Default caller when `--caller` is not given
    pub signer: Option<Address>,

    /// Token balances used for vote weighting
    #[serde(default)]
    pub balances: Vec<BalanceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub token: Address,
    pub holder: Address,
    pub amount: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_state_file() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_FILE)
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_file(),
        }
    }
}

impl BallotConfig {
    /// Create a new configuration for a registry owned by `owner`
    pub fn new(owner: Address) -> Self {
        Self {
            registry: RegistryConfig {
                owner,
                authorization: AuthorizationPolicy::default(),
                weighting: WeightPolicy::default(),
            },
            storage: StorageConfig::default(),
            ledger: LedgerConfig {
                signer: Some(owner),
                balances: Vec::new(),
            },
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: BallotConfig = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(path, contents)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        Ok(())
    }

    /// Policy for a newly created registry
    pub fn policy(&self) -> RegistryPolicy {
        RegistryPolicy {
            authorization: self.registry.authorization,
            weighting: self.registry.weighting,
        }
    }

    /// Snapshot path, resolved against the directory holding `config_path`
    pub fn state_path(&self, config_path: &Path) -> PathBuf {
        if self.storage.state_path.is_absolute() {
            self.storage.state_path.clone()
        } else {
            config_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(&self.storage.state_path)
        }
    }

    /// Build the offline ledger from the balance table
    pub fn ledger(&self, clock: LedgerClock) -> ConfiguredLedger {
        self.ledger
            .balances
            .iter()
            .fold(ConfiguredLedger::new(clock), |ledger, entry| {
                ledger.with_balance(entry.token, entry.holder, u128::from(entry.amount))
            })
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml(owner: &Address) -> String {
        format!(
            r#"# ballotbox configuration
#
# [registry] seeds a NEW registry only. Once the snapshot file exists, the
# owner and policies stored in it are authoritative.

[registry]
# Registry owner address
owner = "{owner}"

# Who may create and finalize topics: "owner-only" or "open"
authorization = "owner-only"

# When balances become vote weight:
# "balance-at-finalization" or "balance-at-vote"
weighting = "balance-at-finalization"

[storage]
# Registry snapshot (CBOR). Relative paths resolve next to this file.
state_path = "{state}"

[ledger]
# Default caller for create-topic / vote / finalize
signer = "{owner}"

# Token balances used to weight votes. Holders not listed have 0.
# [[ledger.balances]]
# token = "0x..."
# holder = "0x..."
# amount = 1000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (optional, logs to stderr if not specified)
# file = "/var/log/ballotbox/ballotbox.log"
"#,
            owner = owner,
            state = DEFAULT_STATE_FILE,
        )
    }

    /// Create and save a default configuration file
    pub fn create_default(
        config_path: &Path,
        owner: &Address,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let contents = Self::generate_default_toml(owner);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(config_path, contents).map_err(|e| {
            format!(
                "Failed to write config file '{}': {}",
                config_path.display(),
                e
            )
        })?;

        Ok(())
    }
}

/// Get the default config file path
///
/// - Config: ~/.local/share/ballotbox/config.toml
pub fn default_config_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ballotbox")
        .join("config.toml")
}
