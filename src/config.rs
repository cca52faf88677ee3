use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Document store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the embedded defaults, an optional file and the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var("COURSE_SEARCH_CONFIG")
            .unwrap_or_else(|_| "config/local.toml".to_string());

        Self::load_from(&config_path)
    }

    /// Same as [`Config::load`] with an explicit override file
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .add_source(config::File::with_name(config_path).required(false))
            // Environment overrides (prefix: COURSE_SEARCH_, nested with __)
            .add_source(
                config::Environment::with_prefix("COURSE_SEARCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the Elasticsearch node
    #[serde(default = "default_store_url")]
    pub url: String,

    /// Index holding one document per class
    #[serde(default = "default_class_index")]
    pub class_index: String,

    /// Index holding employee records, searched alongside classes
    #[serde(default = "default_employee_index")]
    pub employee_index: String,

    /// Request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Keyword field the known-subjects cache is seeded from
    #[serde(default = "default_subject_field")]
    pub subject_field: String,

    /// Upper bound on distinct values fetched for the subjects cache
    #[serde(default = "default_distinct_values_limit")]
    pub distinct_values_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            class_index: default_class_index(),
            employee_index: default_employee_index(),
            request_timeout_secs: default_request_timeout(),
            subject_field: default_subject_field(),
            distinct_values_limit: default_distinct_values_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            prometheus_enabled: true,
        }
    }
}

// Default value functions
fn default_store_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_class_index() -> String {
    "classes".to_string()
}

fn default_employee_index() -> String {
    "employees".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_subject_field() -> String {
    "class.subject.keyword".to_string()
}

fn default_distinct_values_limit() -> usize {
    10000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
