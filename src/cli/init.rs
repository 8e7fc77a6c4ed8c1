use super::config::{default_config_path, default_journal_path, AgoraConfig};
use std::path::PathBuf;

/// Write a default configuration file
///
/// The journal path defaults to `ledger.journal` next to the config file
/// unless `--journal` is given. An existing config is left alone unless
/// `--force` is passed.
pub fn execute(
    config_path: Option<String>,
    journal: Option<String>,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    if config_path.exists() && !force {
        return Err(format!(
            "Config file '{}' already exists (use --force to overwrite)",
            config_path.display()
        )
        .into());
    }

    let journal_path = journal
        .map(PathBuf::from)
        .unwrap_or_else(|| default_journal_path(&config_path));

    AgoraConfig::create_default(&config_path, &journal_path)?;

    println!("Config:  {}", config_path.display());
    println!("Journal: {}", journal_path.display());
    Ok(())
}
