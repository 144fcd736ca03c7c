// Configuration module entry point
// Manages application configuration and runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, CorsConfig, GalleryConfig, HealthConfig, HttpConfig, LoggingConfig,
    PerformanceConfig, ServerConfig,
};

type Builder = config::ConfigBuilder<config::builder::DefaultState>;

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    ///
    /// Environment variables override file values, e.g. `GALLERY_SERVER__PORT=9000`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::with_defaults()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("GALLERY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Self>()?
            .validate()
    }

    /// Built-in defaults only, no file or environment sources
    pub fn defaults() -> Result<Self, config::ConfigError> {
        Self::with_defaults()?.build()?.try_deserialize()
    }

    /// Reject values that deserialize fine but cannot be used at startup
    fn validate(self) -> Result<Self, config::ConfigError> {
        if self.server.workers == Some(0) {
            return Err(config::ConfigError::Message(
                "server.workers must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }

    fn with_defaults() -> Result<Builder, config::ConfigError> {
        config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "gallery-server")?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_default("gallery.api_prefix", "/api/gallery")?
            .set_default("gallery.images_prefix", "/images/")?
            .set_default("gallery.images_dir", "images")?
            .set_default("gallery.seed", true)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::defaults().unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.gallery.api_prefix, "/api/gallery");
        assert_eq!(cfg.gallery.images_prefix, "/images/");
        assert!(cfg.gallery.seed);
        assert_eq!(cfg.http.cors, CorsConfig::default());
        assert_eq!(cfg.http.cors.allow_origin, "*");
        assert!(cfg.health.enabled);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert!(cfg.server.workers.is_none());
    }

    #[test]
    fn test_socket_addr() {
        let mut cfg = Config::defaults().unwrap();
        assert_eq!(
            cfg.get_socket_addr().unwrap(),
            "0.0.0.0:8080".parse::<SocketAddr>().unwrap()
        );

        cfg.server.host = "not a host".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut cfg = Config::defaults().unwrap();
        cfg.server.workers = Some(0);
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("server.workers"));

        let mut cfg = Config::defaults().unwrap();
        cfg.server.workers = Some(2);
        assert_eq!(cfg.validate().unwrap().server.workers, Some(2));
    }

    #[test]
    fn test_zero_workers_in_file_rejected() {
        let path = std::env::temp_dir().join(format!("gallery-zero-workers-{}.toml", std::process::id()));
        std::fs::write(&path, "[server]\nworkers = 0\n").unwrap();
        let result = Config::load_from(path.to_str().unwrap());
        std::fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let cfg = Config::load_from("definitely-not-a-config-file").unwrap();
        assert_eq!(cfg.gallery.images_dir, "images");
        assert_eq!(cfg.performance.read_timeout, 30);
    }
}
