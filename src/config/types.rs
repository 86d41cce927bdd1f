// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::collections::HashMap;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub lookup: LookupConfig,
    /// Explicit package table: name -> base directory
    #[serde(default)]
    pub packages: HashMap<String, String>,
    /// Auxiliary processes launched at startup
    #[serde(default)]
    pub companions: Vec<CompanionConfig>,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Content-Type sent with every served file
    pub content_type: String,
    pub server_name: String,
}

/// Package lookup configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LookupConfig {
    /// Root directories crawled for packages
    #[serde(default)]
    pub search_paths: Vec<String>,
    /// Also crawl the roots listed in `ROS_PACKAGE_PATH`
    pub use_ros_package_path: bool,
}

/// One auxiliary process, e.g. a topic throttler
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CompanionConfig {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}
