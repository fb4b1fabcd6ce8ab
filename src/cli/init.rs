use super::config::{default_config_path, BallotConfig};
use ballotbox::address::Address;
use std::path::PathBuf;

/// Write a default config file for a registry owned by `owner`.
///
/// Refuses to overwrite an existing file unless `force` is set. The registry
/// snapshot itself is created by the first write command.
pub fn execute(
    config_path: Option<String>,
    owner: Address,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    if config_path.exists() && !force {
        return Err(format!(
            "Config file '{}' already exists. Use --force to overwrite.",
            config_path.display()
        )
        .into());
    }

    if owner.is_zero() {
        return Err("Owner must not be the zero address".into());
    }

    BallotConfig::create_default(&config_path, &owner)?;

    println!("Created: {}", config_path.display());
    println!("Owner: {}", owner);
    Ok(())
}
