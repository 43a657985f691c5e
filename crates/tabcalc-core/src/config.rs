use crate::session::DEFAULT_LABEL_HINT;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct CalcConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub tabs: TabsConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct StorageConfig {
    /// Data file path. Falls back to the platform data directory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `warn` or `tabcalc_core=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TabsConfig {
    /// Prefix for labels of newly created tabs.
    #[serde(default = "default_label_hint")]
    pub label_hint: String,
}

impl Default for TabsConfig {
    fn default() -> Self {
        Self {
            label_hint: default_label_hint(),
        }
    }
}

fn default_label_hint() -> String {
    DEFAULT_LABEL_HINT.to_string()
}
