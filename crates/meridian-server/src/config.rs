//! Server configuration module
//!
//! Handles loading and validation of server configuration from environment
//! variables, configuration files, and defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes
    pub max_body_size: usize,

    /// CORS configuration
    pub cors: CorsConfig,

    /// Database connection configuration
    pub database: DatabaseConfig,

    /// Authentication configuration
    pub auth: AuthConfig,

    /// Tile and polygon-analysis cache configuration
    pub cache: CacheConfig,

    /// LiDAR canopy-height-model pipeline configuration
    pub lidar: LidarSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// CORS (Cross-Origin Resource Sharing) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allow any origin (development only)
    pub allow_any_origin: bool,

    /// List of allowed origins
    pub allowed_origins: Vec<String>,

    /// Allowed HTTP methods
    pub allowed_methods: Vec<String>,

    /// Allowed headers
    pub allowed_headers: Vec<String>,

    /// Allow credentials
    pub allow_credentials: bool,

    /// Max age for preflight cache (seconds)
    pub max_age_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database host
    pub host: String,

    /// Database port
    pub port: u16,

    /// Database name
    pub database: String,

    /// Username
    pub username: String,

    /// Password
    pub password: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Converts this configuration into a [`meridian_db::PoolConfig`].
    pub fn to_pool_config(&self) -> meridian_db::PoolConfig {
        meridian_db::PoolConfig::builder()
            .host(self.host.clone())
            .port(self.port)
            .database(self.database.clone())
            .username(self.username.clone())
            .password(self.password.clone())
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(self.connect_timeout_secs)
            .idle_timeout(self.idle_timeout_secs)
            .build()
    }
}

/// Authentication configuration
///
/// Identity extraction, token issuance, and validation live outside this
/// service; the core only checks whether an identity has been published on
/// the request context for the three protected routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Enforce presence of an identity on protected routes. Disabled only
    /// for local development against an unauthenticated upstream.
    pub enabled: bool,

    /// Name of the cookie carrying the identity, consulted when no bearer
    /// header is present.
    pub identity_cookie_name: String,
}

/// Tile and polygon-analysis cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache backend (memory, disk)
    pub backend: String,

    /// Directory backing the disk cache backend, if selected
    pub disk_cache_dir: PathBuf,

    /// In-memory cache capacity, in entries
    pub memory_capacity: usize,
}

/// LiDAR canopy-height-model pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LidarSettings {
    /// Base URL of the WFS-style tile index
    pub wfs_base_url: String,

    /// Directory used to cache fetched raster tiles and rendered CHM images
    pub cache_dir: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,

    /// Enable request logging
    pub log_requests: bool,

    /// Enable SQL query logging
    pub log_queries: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            max_body_size: 10 * 1024 * 1024, // 10MB
            cors: CorsConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            cache: CacheConfig::default(),
            lidar: LidarSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_any_origin: false,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "OPTIONS".to_string(),
            ],
            allowed_headers: vec![
                "Content-Type".to_string(),
                "Authorization".to_string(),
                "Accept".to_string(),
            ],
            allow_credentials: true,
            max_age_secs: 3600,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "meridian".to_string(),
            username: "postgres".to_string(),
            password: "postgres".to_string(),
            max_connections: 20,
            min_connections: 5,
            connect_timeout_secs: 10,
            idle_timeout_secs: 300,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            identity_cookie_name: "meridian_session".to_string(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            disk_cache_dir: PathBuf::from("/var/lib/meridian/tile-cache"),
            memory_capacity: 10_000,
        }
    }
}

impl Default for LidarSettings {
    fn default() -> Self {
        Self {
            wfs_base_url: meridian_lidar::config::DEFAULT_WFS_BASE_URL.to_string(),
            cache_dir: PathBuf::from("/var/lib/meridian/lidar-cache"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            log_requests: true,
            log_queries: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment and config files
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            // Start with default values
            .add_source(config::Config::try_from(&ServerConfig::default())?)
            // Add environment-specific config file
            .add_source(config::File::with_name("config/server").required(false))
            // Add environment variables with prefix MERIDIAN_
            .add_source(config::Environment::with_prefix("MERIDIAN").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port must be greater than 0".to_string());
        }

        if self.max_body_size == 0 {
            return Err("Max body size must be greater than 0".to_string());
        }

        if self.database.max_connections < self.database.min_connections {
            return Err("Max connections must be >= min connections".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_config_validation() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());

        let mut invalid_config = ServerConfig::default();
        invalid_config.port = 0;
        assert!(invalid_config.validate().is_err());
    }
}
