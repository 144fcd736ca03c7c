// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub gallery: GalleryConfig,
    #[serde(default)]
    pub health: HealthConfig,
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
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
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
    pub server_name: String,
    pub max_body_size: u64,
    #[serde(default)]
    pub cors: CorsConfig,
}

/// CORS headers attached to every response
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    #[serde(default = "default_cors_origin")]
    pub allow_origin: String,
    #[serde(default = "default_cors_methods")]
    pub allow_methods: String,
    #[serde(default = "default_cors_headers")]
    pub allow_headers: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_cors_origin() -> String {
    "*".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_cors_methods() -> String {
    "GET, POST, PUT, DELETE, OPTIONS".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_cors_headers() -> String {
    "Content-Type".to_string()
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: default_cors_origin(),
            allow_methods: default_cors_methods(),
            allow_headers: default_cors_headers(),
        }
    }
}

/// Gallery API and image directory layout
#[derive(Debug, Deserialize, Clone)]
pub struct GalleryConfig {
    /// Collection path, e.g. `/api/gallery`
    pub api_prefix: String,
    /// URL prefix stripped before resolving image files
    pub images_prefix: String,
    /// Local directory the images are served from
    pub images_dir: String,
    /// Start with the built-in seed records
    pub seed: bool,
}

/// Health check configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HealthConfig {
    /// Enable health check endpoints
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,
    /// Liveness probe path (default: /healthz)
    #[serde(default = "default_healthz_path")]
    pub liveness_path: String,
    /// Readiness probe path (default: /readyz)
    #[serde(default = "default_readyz_path")]
    pub readiness_path: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_health_enabled() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_healthz_path() -> String {
    "/healthz".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_readyz_path() -> String {
    "/readyz".to_string()
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: default_health_enabled(),
            liveness_path: default_healthz_path(),
            readiness_path: default_readyz_path(),
        }
    }
}
