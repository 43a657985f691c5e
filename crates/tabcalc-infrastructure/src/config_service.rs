//! Configuration service.
//!
//! Loads `CalcConfig` from `config.toml` and caches it.

use crate::paths::TabcalcPaths;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tabcalc_core::config::CalcConfig;
use tabcalc_core::error::{CalcError, Result};

/// Loads and caches the application configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration, loaded lazily.
    config: Arc<RwLock<Option<CalcConfig>>>,
}

impl ConfigService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Uses `config.toml` in the platform config directory.
    pub fn from_default_location() -> Result<Self> {
        Ok(Self::new(TabcalcPaths::config_file()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading it from file if not cached.
    ///
    /// A missing file yields the defaults. An unreadable or invalid file is an
    /// error and nothing is cached.
    pub fn get_config(&self) -> Result<CalcConfig> {
        {
            let read_lock = self.config.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = self.load_config()?;

        {
            let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *write_lock = None;
    }

    fn load_config(&self) -> Result<CalcConfig> {
        if !self.path.exists() {
            tracing::debug!(
                "[Config] {} not found, using defaults",
                self.path.display()
            );
            return Ok(CalcConfig::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|e| {
            CalcError::config(format!("Invalid {}: {}", self.path.display(), e))
        })
    }
}
