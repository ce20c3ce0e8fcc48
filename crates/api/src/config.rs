//! Application configuration.
//!
//! Configuration is layered: `config/default.toml`, then an optional
//! `config/local.toml`, then environment variables with the `ARISAN`
//! prefix and `__` as the section separator (`ARISAN__DATABASE__URL`).

use persistence::db::DatabaseConfig;
use serde::Deserialize;
use shared::jwt::{JwtConfig, JwtError};
use std::net::SocketAddr;
use thiserror::Error;

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    #[serde(default)]
    pub otp: OtpConfig,
    pub jwt: JwtAuthConfig,
    #[serde(default)]
    pub sms: SmsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Request body cap. Must leave headroom above the 5 MiB proof
    /// limit for multipart framing.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` or `pretty`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Security settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Allowed CORS origins. Empty means allow any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// OTP requests allowed per phone per hour. 0 disables throttling.
    #[serde(default = "default_otp_request_limit_per_hour")]
    pub otp_request_limit_per_hour: u32,
}

/// OTP lifecycle settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OtpConfig {
    #[serde(default = "default_otp_ttl_secs")]
    pub ttl_secs: i64,

    #[serde(default = "default_otp_max_attempts")]
    pub max_attempts: i32,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_otp_ttl_secs(),
            max_attempts: default_otp_max_attempts(),
        }
    }
}

/// JWT signing configuration. Keys are RSA PEM strings.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtAuthConfig {
    #[serde(default)]
    pub private_key: String,

    #[serde(default)]
    pub public_key: String,

    #[serde(default = "default_access_token_expiry_secs")]
    pub access_token_expiry_secs: i64,

    #[serde(default = "default_refresh_token_expiry_secs")]
    pub refresh_token_expiry_secs: i64,

    #[serde(default = "default_jwt_leeway_secs")]
    pub leeway_secs: u64,
}

impl JwtAuthConfig {
    /// Parses the PEM key material into a ready-to-use [`JwtConfig`].
    pub fn build(&self) -> Result<JwtConfig, JwtError> {
        JwtConfig::new(
            &self.private_key,
            &self.public_key,
            self.access_token_expiry_secs,
            self.refresh_token_expiry_secs,
            self.leeway_secs,
        )
    }
}

/// SMS delivery settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
    /// `console` logs messages, `http` posts to a gateway.
    #[serde(default = "default_sms_provider")]
    pub provider: String,

    #[serde(default)]
    pub gateway_url: String,

    #[serde(default)]
    pub gateway_token: String,

    #[serde(default = "default_sms_sender_id")]
    pub sender_id: String,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            provider: default_sms_provider(),
            gateway_url: String::new(),
            gateway_token: String::new(),
            sender_id: default_sms_sender_id(),
        }
    }
}

/// Payment-proof storage settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// `local` writes files under `root`, `memory` keeps them in-process.
    #[serde(default = "default_storage_provider")]
    pub provider: String,

    #[serde(default = "default_storage_root")]
    pub root: String,

    /// URL prefix under which the proof directory is served.
    #[serde(default = "default_storage_public_base_url")]
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: default_storage_provider(),
            root: default_storage_root(),
            public_base_url: default_storage_public_base_url(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_otp_request_limit_per_hour() -> u32 {
    5
}

fn default_otp_ttl_secs() -> i64 {
    domain::models::otp::OTP_DEFAULT_TTL_SECS
}

fn default_otp_max_attempts() -> i32 {
    domain::models::otp::OTP_MAX_ATTEMPTS
}

fn default_access_token_expiry_secs() -> i64 {
    3600
}

fn default_refresh_token_expiry_secs() -> i64 {
    30 * 24 * 3600
}

fn default_jwt_leeway_secs() -> u64 {
    30
}

fn default_sms_provider() -> String {
    "console".to_string()
}

fn default_sms_sender_id() -> String {
    "ARISAN".to_string()
}

fn default_storage_provider() -> String {
    "local".to_string()
}

fn default_storage_root() -> String {
    "var/uploads/payment-proofs".to_string()
}

fn default_storage_public_base_url() -> String {
    "/uploads/payment-proofs".to_string()
}

/// Configuration errors caught by [`Config::validate`].
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Loads configuration from files and the environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("ARISAN").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Loads configuration for tests from embedded defaults plus
    /// overrides, skipping validation.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        const TEST_DEFAULTS: &str = r#"
            [server]
            host = "127.0.0.1"
            port = 0

            [database]
            url = "postgres://localhost/arisan_test"

            [logging]
            level = "debug"
            format = "pretty"

            [security]
            cors_origins = []
            otp_request_limit_per_hour = 0

            [jwt]
            private_key = "test-private-key"
            public_key = "test-public-key"
        "#;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            TEST_DEFAULTS,
            config::FileFormat::Toml,
        ));
        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }
        builder.build()?.try_deserialize()
    }

    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "database.url (set ARISAN__DATABASE__URL)".to_string(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "server.port must be non-zero".to_string(),
            ));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "database.min_connections exceeds database.max_connections".to_string(),
            ));
        }
        if self.jwt.private_key.is_empty() || self.jwt.public_key.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "jwt.private_key and jwt.public_key".to_string(),
            ));
        }
        if self.otp.ttl_secs <= 0 {
            return Err(ConfigValidationError::InvalidValue(
                "otp.ttl_secs must be positive".to_string(),
            ));
        }
        if self.otp.max_attempts <= 0 {
            return Err(ConfigValidationError::InvalidValue(
                "otp.max_attempts must be positive".to_string(),
            ));
        }
        if self.sms.provider == "http" && self.sms.gateway_url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "sms.gateway_url for the http provider".to_string(),
            ));
        }
        Ok(())
    }

    /// Bind address for the HTTP listener.
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .expect("Invalid socket address")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_for_test_applies_defaults() {
        let config = Config::load_for_test(&[]).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.server.max_body_size, 10 * 1024 * 1024);
        assert_eq!(config.otp.ttl_secs, 300);
        assert_eq!(config.otp.max_attempts, 5);
        assert_eq!(config.jwt.access_token_expiry_secs, 3600);
        assert_eq!(config.sms.provider, "console");
        assert_eq!(config.storage.provider, "local");
        assert_eq!(config.database.max_connections, 20);
    }

    #[test]
    fn test_load_for_test_overrides() {
        let config = Config::load_for_test(&[
            ("server.port", "9999"),
            ("otp.ttl_secs", "60"),
            ("sms.provider", "http"),
            ("sms.gateway_url", "https://sms.example.test/send"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 9999);
        assert_eq!(config.otp.ttl_secs, 60);
        assert_eq!(config.sms.provider, "http");
        assert_eq!(config.sms.gateway_url, "https://sms.example.test/send");
    }

    #[test]
    fn test_validate_requires_database_url() {
        let mut config = Config::load_for_test(&[("server.port", "8080")]).unwrap();
        config.database.url = String::new();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigValidationError::MissingRequired(_)));
        assert!(err.to_string().contains("ARISAN__DATABASE__URL"));
    }

    #[test]
    fn test_validate_rejects_port_zero() {
        let config = Config::load_for_test(&[]).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigValidationError::InvalidValue(_)));
    }

    #[test]
    fn test_validate_rejects_inverted_pool_bounds() {
        let mut config = Config::load_for_test(&[("server.port", "8080")]).unwrap();
        config.database.min_connections = 50;
        config.database.max_connections = 10;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_jwt_keys() {
        let mut config = Config::load_for_test(&[("server.port", "8080")]).unwrap();
        config.jwt.public_key = String::new();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("jwt"));
    }

    #[test]
    fn test_validate_http_sms_needs_gateway_url() {
        let mut config = Config::load_for_test(&[("server.port", "8080")]).unwrap();
        config.sms.provider = "http".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("gateway_url"));
    }

    #[test]
    fn test_socket_addr() {
        let config = Config::load_for_test(&[("server.port", "8123")]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8123");
    }
}
