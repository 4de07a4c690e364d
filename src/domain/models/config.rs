//! Configuration structure for the SCC hub.
//!
//! Field shape and `#[serde(default = "...")]` idiom grounded on the
//! teacher's `domain/models/config.rs`, extended with the environment
//! variables and policy defaults named in SPEC_FULL.md §6.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    #[serde(default = "default_repo_root")]
    pub repo_root: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub policy_gate: PolicyGateConfig,

    #[serde(default)]
    pub governor: GovernorConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    /// `SCC_PARENT_INBOX` override; defaults to
    /// `<repo_root>/artifacts/scc_state/parent_inbox.jsonl` when unset.
    #[serde(default)]
    pub parent_inbox_path: Option<String>,
}

fn default_repo_root() -> String {
    ".".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo_root: default_repo_root(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            rate_limit: RateLimitConfig::default(),
            scheduler: SchedulerConfig::default(),
            policy_gate: PolicyGateConfig::default(),
            governor: GovernorConfig::default(),
            retry: RetryConfig::default(),
            parent_inbox_path: None,
        }
    }
}

impl Config {
    /// Resolves the parent inbox path, applying the documented default
    /// relative to `repo_root` when no override is configured.
    pub fn parent_inbox_path(&self) -> std::path::PathBuf {
        match &self.parent_inbox_path {
            Some(p) => std::path::PathBuf::from(p),
            None => std::path::Path::new(&self.repo_root)
                .join("artifacts/scc_state/parent_inbox.jsonl"),
        }
    }
}

/// Auth mode recognized at the Gateway boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    None,
    Bearer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_auth_mode")]
    pub auth_mode: AuthMode,
    #[serde(default)]
    pub bearer_token: Option<String>,
    #[serde(default)]
    pub model_enabled: bool,
    #[serde(default)]
    pub fullagent_allow_shell: bool,
    #[serde(default)]
    pub task_autostart_enabled: bool,
    #[serde(default)]
    pub executor_dry_run: bool,
    #[serde(default)]
    pub patch_apply_enabled: bool,
    #[serde(default = "default_sse_max_connections")]
    pub sse_max_connections: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
const fn default_port() -> u16 {
    18788
}
const fn default_auth_mode() -> AuthMode {
    AuthMode::Bearer
}
const fn default_sse_max_connections() -> usize {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            auth_mode: default_auth_mode(),
            bearer_token: None,
            model_enabled: false,
            fullagent_allow_shell: false,
            task_autostart_enabled: false,
            executor_dry_run: true,
            patch_apply_enabled: false,
            sse_max_connections: default_sse_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".scc_hub/hub.db".to_string()
}
const fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub log_dir: Option<String>,
    #[serde(default = "default_true")]
    pub enable_stdout: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}
const fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            enable_stdout: default_true(),
            rotation: default_rotation(),
        }
    }
}

/// JSON-RPC / REST rate limit, per `spec.md` §4.8 ("default 100/min").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RateLimitConfig {
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
}

const fn default_requests_per_minute() -> u32 {
    100
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_requests_per_minute(),
        }
    }
}

/// Priority scheduler aging configuration (Open Question resolved in
/// SPEC_FULL.md §9).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerConfig {
    #[serde(default = "default_lease_ttl_secs")]
    pub lease_ttl_secs: i64,
    #[serde(default = "default_aging_threshold_secs")]
    pub aging_threshold_secs: i64,
    #[serde(default = "default_aging_step")]
    pub aging_step: u8,
}

const fn default_lease_ttl_secs() -> i64 {
    300
}
const fn default_aging_threshold_secs() -> i64 {
    30
}
const fn default_aging_step() -> u8 {
    1
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lease_ttl_secs: default_lease_ttl_secs(),
            aging_threshold_secs: default_aging_threshold_secs(),
            aging_step: default_aging_step(),
        }
    }
}

/// Which submission gates are enabled, and which task classes require the
/// (opt-in) signature gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PolicyGateConfig {
    #[serde(default = "default_true")]
    pub schema_gate_enabled: bool,
    #[serde(default = "default_true")]
    pub doclink_gate_enabled: bool,
    #[serde(default)]
    pub signature_required_task_classes: HashSet<String>,
    #[serde(default = "default_true")]
    pub semantic_context_gate_enabled: bool,
    #[serde(default = "default_true")]
    pub import_scan_gate_enabled: bool,
    #[serde(default = "default_protected_path_prefixes")]
    pub protected_path_prefixes: Vec<String>,
}

fn default_protected_path_prefixes() -> Vec<String> {
    vec![
        "contracts/".to_string(),
        "roles/".to_string(),
        "skills/".to_string(),
        "eval/".to_string(),
    ]
}

impl Default for PolicyGateConfig {
    fn default() -> Self {
        Self {
            schema_gate_enabled: true,
            doclink_gate_enabled: true,
            signature_required_task_classes: HashSet::new(),
            semantic_context_gate_enabled: true,
            import_scan_gate_enabled: true,
            protected_path_prefixes: default_protected_path_prefixes(),
        }
    }
}

/// Resource governor thresholds, grounded verbatim on
/// `original_source/scc-top/tools/scc/automation/resource_governor.py`'s
/// `GovernorConfig` dataclass defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GovernorConfig {
    #[serde(default = "default_cpu_high")]
    pub cpu_high: f64,
    #[serde(default = "default_cpu_low")]
    pub cpu_low: f64,
    #[serde(default = "default_mem_high")]
    pub mem_high: f64,
    #[serde(default = "default_mem_low")]
    pub mem_low: f64,
    #[serde(default = "default_gov_step")]
    pub step: u32,
    #[serde(default = "default_min_outstanding")]
    pub min_outstanding: u32,
    #[serde(default = "default_max_outstanding")]
    pub max_outstanding: u32,
}

const fn default_cpu_high() -> f64 {
    0.75
}
const fn default_cpu_low() -> f64 {
    0.55
}
const fn default_mem_high() -> f64 {
    0.83
}
const fn default_mem_low() -> f64 {
    0.75
}
const fn default_gov_step() -> u32 {
    1
}
const fn default_min_outstanding() -> u32 {
    1
}
const fn default_max_outstanding() -> u32 {
    3
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            cpu_high: default_cpu_high(),
            cpu_low: default_cpu_low(),
            mem_high: default_mem_high(),
            mem_low: default_mem_low(),
            step: default_gov_step(),
            min_outstanding: default_min_outstanding(),
            max_outstanding: default_max_outstanding(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}
const fn default_initial_backoff_ms() -> u64 {
    1_000
}
const fn default_max_backoff_ms() -> u64 {
    60_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}
