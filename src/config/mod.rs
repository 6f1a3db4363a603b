//! Configuration management
//!
//! Loads settings from a TOML file with `AIREG_*` environment variable
//! overrides. Every section has serde defaults so a missing or partial
//! config file still yields a runnable configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

/// Database settings (SQLite)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path or `:memory:`
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "data/registry.db".to_string(),
        }
    }
}

/// JWT authentication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub jwt_secret: String,
    /// Access token lifetime in seconds
    pub access_ttl_seconds: u64,
    /// Refresh token lifetime in seconds
    pub refresh_ttl_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-in-production".to_string(),
            access_ttl_seconds: 15 * 60,
            refresh_ttl_seconds: 7 * 24 * 3600,
        }
    }
}

/// Cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Default TTL for entries that do not request a specific one
    pub ttl_seconds: u64,
    /// Maximum number of cached entries
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 3600,
            max_capacity: 10_000,
        }
    }
}

/// File upload settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory where module file blobs are stored
    pub dir: PathBuf,
    /// Maximum upload size in bytes
    pub max_size_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/uploads"),
            max_size_bytes: 100 * 1024 * 1024,
        }
    }
}

/// Email notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// When false, notifications are logged instead of sent
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_address: String,
    pub from_name: String,
    pub site_name: String,
    pub site_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: "noreply@localhost".to_string(),
            from_name: "AI Registry".to_string(),
            site_name: "AI Registry".to_string(),
            site_url: "http://localhost:8080".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then apply environment
    /// overrides. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            tracing::warn!("Config file {} not found, using defaults", path.display());
            Config::default()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply `AIREG_*` environment variable overrides
    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("AIREG_SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = std::env::var("AIREG_SERVER_PORT") {
            if let Ok(port) = v.parse() {
                self.server.port = port;
            }
        }
        if let Ok(v) = std::env::var("AIREG_CORS_ORIGIN") {
            self.server.cors_origin = v;
        }
        if let Ok(v) = std::env::var("AIREG_DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = std::env::var("AIREG_JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Ok(v) = std::env::var("AIREG_UPLOAD_DIR") {
            self.upload.dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("AIREG_SMTP_HOST") {
            self.email.smtp_host = v;
            self.email.enabled = true;
        }
        if let Ok(v) = std::env::var("AIREG_SMTP_PASSWORD") {
            self.email.smtp_password = v;
        }
    }

    /// Reject configurations that cannot work
    fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            anyhow::bail!("database.url must not be empty");
        }
        if self.auth.jwt_secret.is_empty() {
            anyhow::bail!("auth.jwt_secret must not be empty");
        }
        if self.auth.access_ttl_seconds == 0 || self.auth.refresh_ttl_seconds == 0 {
            anyhow::bail!("auth token lifetimes must be positive");
        }
        if self.email.enabled && self.email.smtp_host.is_empty() {
            anyhow::bail!("email.smtp_host is required when email is enabled");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.access_ttl_seconds, 900);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.database.url, "data/registry.db");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[server]\nhost = \"0.0.0.0\"\nport = 9000\ncors_origin = \"*\"\n"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        // Unspecified sections fall back to defaults
        assert_eq!(config.cache.ttl_seconds, 3600);
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "server = not valid toml [").unwrap();
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_email_enabled_requires_host() {
        let config = Config {
            email: EmailConfig {
                enabled: true,
                smtp_host: String::new(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
