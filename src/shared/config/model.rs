use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub cluster: ClusterConfig,
    pub consolidation: ConsolidationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct ClusterConfig {
    /// Base URL of the cluster REST API, e.g. "http://localhost:9200"
    pub endpoint: String,
    /// Index name pattern scoping which partitions are candidates at all
    pub name_pattern: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsolidationConfig {
    /// A partition strictly below this size may seed a new consolidation target
    pub min_size_bytes: u64,
    /// Maximum size a target is allowed to grow to
    pub ceiling_bytes: u64,
    #[serde(default = "default_max_attempts_per_step")]
    pub max_attempts_per_step: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Per-attempt bound on waiting for a remote copy to complete
    #[serde(default = "default_copy_timeout_ms")]
    pub copy_timeout_ms: u64,
    /// Pause between merges so the cluster's size/count reporting settles
    #[serde(default = "default_iteration_delay_ms")]
    pub iteration_delay_ms: u64,
    /// 0 disables the iteration cap
    #[serde(default)]
    pub max_iterations: u64,
    /// 0 disables the wall-clock cap
    #[serde(default)]
    pub max_runtime_ms: u64,
    /// Allowed absolute record-count shortfall when verifying a copy
    #[serde(default)]
    pub count_tolerance: u64,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            min_size_bytes: 1024 * 1024 * 1024,
            ceiling_bytes: 50 * 1024 * 1024 * 1024,
            max_attempts_per_step: default_max_attempts_per_step(),
            poll_interval_ms: default_poll_interval_ms(),
            copy_timeout_ms: default_copy_timeout_ms(),
            iteration_delay_ms: default_iteration_delay_ms(),
            max_iterations: 0,
            max_runtime_ms: 0,
            count_tolerance: 0,
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

fn default_max_attempts_per_step() -> u32 {
    5
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_copy_timeout_ms() -> u64 {
    30 * 60 * 1_000
}

fn default_iteration_delay_ms() -> u64 {
    10_000
}

fn default_backoff_base_ms() -> u64 {
    500
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
    pub stdout_level: String,
    pub file_level: String,
}

use std::env;

pub fn load_settings() -> Result<Settings, config::ConfigError> {
    let config_path = env::var("COLDPACK_CONFIG").unwrap_or_else(|_| "config".to_string());

    let settings: Settings = config::Config::builder()
        .add_source(config::File::with_name(&config_path))
        .build()?
        .try_deserialize()?;

    Ok(settings)
}
