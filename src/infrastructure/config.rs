//! Hierarchical configuration loading.
//!
//! Grounded on the teacher's `infrastructure/config/loader.rs`: Figment
//! layering defaults → project file → local override → environment,
//! generalized from `.abathur/` to `.scc_hub/` and from `ABATHUR_` to
//! `SCC_HUB_`.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::{AuthMode, Config};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid log level: {0}. must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("invalid log format: {0}. must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("database path cannot be empty")]
    EmptyDatabasePath,

    #[error(
        "invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),
}

fn parse_bool_env(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes"))
}

fn parse_f64_env(name: &str) -> Option<f64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn parse_u32_env(name: &str) -> Option<u32> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. `.scc_hub/config.yaml` (project config)
    /// 3. `.scc_hub/local.yaml` (local override, optional)
    /// 4. `SCC_HUB__*` environment variables (ambient settings only)
    /// 5. the wire-contract environment variables named in spec.md §6
    ///    (`REPO_ROOT`, `UNIFIED_SERVER_HOST`, ... `SCC_PARENT_INBOX`),
    ///    applied last since they keep their exact historical names and
    ///    aren't routed through the `SCC_HUB__` figment prefix.
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".scc_hub/config.yaml"))
            .merge(Yaml::file(".scc_hub/local.yaml"))
            .merge(Env::prefixed("SCC_HUB__").split("__"))
            .extract()
            .context("failed to extract configuration from figment")?;

        let config = Self::apply_wire_env_vars(config);
        Self::validate(&config)?;
        Ok(config)
    }

    /// Overlays the spec's wire-level environment variables, which are
    /// read directly (not through the figment `SCC_HUB__` prefix) since
    /// they're part of the contract with the original system.
    fn apply_wire_env_vars(mut config: Config) -> Config {
        use std::env;

        if let Ok(v) = env::var("REPO_ROOT") {
            config.repo_root = v;
        }
        if let Ok(v) = env::var("UNIFIED_SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("UNIFIED_SERVER_PORT") {
            if let Ok(port) = v.parse() {
                config.server.port = port;
            }
        }
        if let Ok(v) = env::var("AUTH_MODE") {
            config.server.auth_mode = match v.as_str() {
                "none" => AuthMode::None,
                _ => AuthMode::Bearer,
            };
        }
        if let Some(v) = parse_bool_env("SCC_MODEL_ENABLED") {
            config.server.model_enabled = v;
        }
        if let Some(v) = parse_bool_env("SCC_FULLAGENT_ALLOW_SHELL") {
            config.server.fullagent_allow_shell = v;
        }
        if let Some(v) = parse_bool_env("SCC_TASK_AUTOSTART_ENABLED") {
            config.server.task_autostart_enabled = v;
        }
        if let Some(v) = parse_bool_env("SCC_EXECUTOR_DRY_RUN") {
            config.server.executor_dry_run = v;
        }
        if let Some(v) = parse_bool_env("SCC_PATCH_APPLY_ENABLED") {
            config.server.patch_apply_enabled = v;
        }
        if let Some(v) = parse_f64_env("SCC_GOV_CPU_HIGH") {
            config.governor.cpu_high = v;
        }
        if let Some(v) = parse_f64_env("SCC_GOV_CPU_LOW") {
            config.governor.cpu_low = v;
        }
        if let Some(v) = parse_f64_env("SCC_GOV_MEM_HIGH") {
            config.governor.mem_high = v;
        }
        if let Some(v) = parse_f64_env("SCC_GOV_MEM_LOW") {
            config.governor.mem_low = v;
        }
        if let Some(v) = parse_u32_env("SCC_GOV_STEP") {
            config.governor.step = v;
        }
        if let Some(v) = parse_u32_env("SCC_GOV_MIN_OUTSTANDING") {
            config.governor.min_outstanding = v;
        }
        if let Some(v) = parse_u32_env("SCC_GOV_MAX_OUTSTANDING") {
            config.governor.max_outstanding = v;
        }
        if let Ok(v) = env::var("SCC_PARENT_INBOX") {
            config.parent_inbox_path = Some(v);
        }

        config
    }

    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.retry.initial_backoff_ms >= config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        ConfigLoader::validate(&config).expect("default config should be valid");
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn rejects_empty_database_path() {
        let mut config = Config::default();
        config.database.path = String::new();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyDatabasePath)
        ));
    }

    #[test]
    fn rejects_backoff_ordering_violation() {
        let mut config = Config::default();
        config.retry.initial_backoff_ms = 60_000;
        config.retry.max_backoff_ms = 1_000;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidBackoff(60_000, 1_000))
        ));
    }

    #[test]
    fn hierarchical_override_wins_over_base() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(base_file, "logging:\n  level: info\n  format: json").unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "logging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn wire_env_vars_override_config_by_their_historical_names() {
        temp_env::with_vars(
            [
                ("REPO_ROOT", Some("/srv/scc")),
                ("UNIFIED_SERVER_PORT", Some("9000")),
                ("AUTH_MODE", Some("none")),
                ("SCC_GOV_MAX_OUTSTANDING", Some("7")),
                ("SCC_PARENT_INBOX", Some("/srv/scc/inbox.jsonl")),
            ],
            || {
                let config = ConfigLoader::apply_wire_env_vars(Config::default());
                assert_eq!(config.repo_root, "/srv/scc");
                assert_eq!(config.server.port, 9000);
                assert_eq!(config.server.auth_mode, AuthMode::None);
                assert_eq!(config.governor.max_outstanding, 7);
                assert_eq!(config.parent_inbox_path(), std::path::PathBuf::from("/srv/scc/inbox.jsonl"));
            },
        );
    }
}
