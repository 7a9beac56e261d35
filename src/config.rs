//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub jwt: JwtConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Blob storage configuration (any S3-compatible endpoint)
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Bucket name for uploaded images
    pub bucket: String,
    /// S3-compatible endpoint URL (e.g., "https://s3.example.com")
    pub endpoint: String,
    /// Region (S3-compatible stores often accept "auto")
    #[serde(default = "default_storage_region")]
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

fn default_storage_region() -> String {
    "auto".to_string()
}

/// Token issuing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// HMAC signing secret (32+ bytes)
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    /// Access token lifetime in minutes
    pub access_token_lifetime_minutes: i64,
    /// Refresh token lifetime in days
    pub refresh_token_lifetime_days: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (RUSTSCRIBE_*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.path", "data/rustscribe.db")?
            .set_default("storage.region", "auto")?
            .set_default("jwt.issuer", "rustscribe")?
            .set_default("jwt.audience", "rustscribe")?
            .set_default("jwt.access_token_lifetime_minutes", 15)?
            .set_default("jwt.refresh_token_lifetime_days", 7)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (RUSTSCRIBE_*)
            .add_source(
                Environment::with_prefix("RUSTSCRIBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        const MIN_JWT_SECRET_BYTES: usize = 32;

        if self.jwt.secret.as_bytes().len() < MIN_JWT_SECRET_BYTES {
            return Err(crate::error::AppError::Config(format!(
                "jwt.secret must be at least {} bytes",
                MIN_JWT_SECRET_BYTES
            )));
        }

        if self.jwt.access_token_lifetime_minutes <= 0 {
            return Err(crate::error::AppError::Config(
                "jwt.access_token_lifetime_minutes must be greater than 0".to_string(),
            ));
        }

        if self.jwt.refresh_token_lifetime_days <= 0 {
            return Err(crate::error::AppError::Config(
                "jwt.refresh_token_lifetime_days must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                path: PathBuf::from("/tmp/rustscribe-test.db"),
            },
            storage: StorageConfig {
                bucket: "media".to_string(),
                endpoint: "https://s3.example.com".to_string(),
                region: "auto".to_string(),
                access_key_id: "access-key".to_string(),
                secret_access_key: "secret-key".to_string(),
            },
            jwt: JwtConfig {
                secret: "x".repeat(32),
                issuer: "rustscribe".to_string(),
                audience: "rustscribe".to_string(),
                access_token_lifetime_minutes: 15,
                refresh_token_lifetime_days: 7,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn validate_accepts_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_short_jwt_secret() {
        let mut config = valid_config();
        config.jwt.secret = "short-secret".to_string();

        let error = config
            .validate()
            .expect_err("jwt secret shorter than 32 bytes must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("jwt.secret")
        ));
    }

    #[test]
    fn validate_rejects_non_positive_lifetimes() {
        let mut config = valid_config();
        config.jwt.access_token_lifetime_minutes = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.jwt.refresh_token_lifetime_days = -1;
        assert!(config.validate().is_err());
    }
}
