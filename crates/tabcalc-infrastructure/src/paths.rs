//! Platform paths for tabcalc configuration and data.
//!
//! ```text
//! ~/.config/tabcalc/           # Config directory (AppPaths default)
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/tabcalc/      # Data directory
//! └── calculator.json          # Persisted sessions and schema version
//! ```

use std::path::PathBuf;
use tabcalc_core::error::{CalcError, Result};
use version_migrate::AppPaths;

const APP_NAME: &str = "tabcalc";
const CONFIG_FILE_NAME: &str = "config.toml";
const DATA_FILE_NAME: &str = "calculator.json";

/// Resolves tabcalc paths via AppPaths.
pub struct TabcalcPaths;

impl TabcalcPaths {
    fn app_paths() -> AppPaths {
        AppPaths::new(APP_NAME)
    }

    pub fn config_dir() -> Result<PathBuf> {
        Self::app_paths()
            .config_dir()
            .map_err(|e| CalcError::config(format!("Cannot resolve config directory: {}", e)))
    }

    pub fn data_dir() -> Result<PathBuf> {
        Self::app_paths()
            .data_dir()
            .map_err(|e| CalcError::config(format!("Cannot resolve data directory: {}", e)))
    }

    /// Path to `config.toml`.
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Default location of the data file.
    pub fn data_file() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join(DATA_FILE_NAME))
    }
}
