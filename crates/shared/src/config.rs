//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Version engine limits.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Limits enforced by the budget version engine.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of ancestors a derived version may have.
    #[serde(default = "default_max_lineage_depth")]
    pub max_lineage_depth: usize,
    /// Maximum number of free-form metadata extension entries per version.
    #[serde(default = "default_max_metadata_extensions")]
    pub max_metadata_extensions: usize,
    /// Maximum length in bytes of a metadata extension key.
    #[serde(default = "default_max_extension_key_len")]
    pub max_extension_key_len: usize,
}

fn default_max_lineage_depth() -> usize {
    32
}

fn default_max_metadata_extensions() -> usize {
    16
}

fn default_max_extension_key_len() -> usize {
    64
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_lineage_depth: default_max_lineage_depth(),
            max_metadata_extensions: default_max_metadata_extensions(),
            max_extension_key_len: default_max_extension_key_len(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Default `tracing` filter directive, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SCENARIA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_sources() {
        temp_env::with_vars_unset(
            [
                "SCENARIA__ENGINE__MAX_LINEAGE_DEPTH",
                "SCENARIA__LOG__FILTER",
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.engine.max_lineage_depth, 32);
                assert_eq!(config.engine.max_metadata_extensions, 16);
                assert_eq!(config.engine.max_extension_key_len, 64);
                assert_eq!(config.log.filter, "info");
                assert!(!config.log.json);
            },
        );
    }

    #[test]
    fn test_environment_overrides() {
        temp_env::with_vars(
            [
                ("SCENARIA__ENGINE__MAX_LINEAGE_DEPTH", Some("4")),
                ("SCENARIA__LOG__FILTER", Some("scenaria=debug")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.engine.max_lineage_depth, 4);
                assert_eq!(config.log.filter, "scenaria=debug");
            },
        );
    }
}
