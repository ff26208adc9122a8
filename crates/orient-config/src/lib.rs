mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const APP_DIR: &str = "orient-app";
const CONFIG_FILE: &str = "config.toml";

/// Location of `config.toml` under the platform config directory.
pub fn config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Load the user config. On first run the defaults are written out so they can be edited.
pub fn load_config() -> Result<AppConfig> {
    load_or_init(&config_path()?)
}

/// Read `path`, or create it with default settings if it does not exist yet.
pub fn load_or_init(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = AppConfig::from_toml(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        info!(?path, "Loaded config");
        return Ok(config);
    }

    let config = AppConfig::default();
    match save_config(path, &config) {
        Ok(()) => info!(?path, "No config found, wrote defaults"),
        // A read-only config dir should not keep the filter from running.
        Err(e) => warn!(?e, "No config found, using defaults without saving"),
    }
    Ok(config)
}

/// Write `config` to `path`, creating parent directories.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
    config.validate()?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
    info!(?path, "Saved config");
    Ok(())
}
