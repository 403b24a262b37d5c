//! Configuration management
//!
//! All settings come from the process environment. A `.env` file in the
//! working directory is loaded first when present.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default path prefix for the versioned API.
pub const DEFAULT_BASE_PATH: &str = "/api";

/// Default grace period for in-flight requests on shutdown, in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 1;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Default interval between background key set refreshes, in seconds.
pub const DEFAULT_JWKS_REFRESH_SECS: u64 = 3600;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub token: TokenConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Normalized prefix: empty, or starts with `/` and has no trailing `/`
    pub base_path: String,
    pub shutdown_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    /// Database name; replaces whatever the URL names
    pub database: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

impl CorsConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}

/// Bearer token verification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Expected `iss` claim; the key set is served from `<issuer>/publickeys`
    pub issuer_url: String,
    pub jwks_refresh_secs: u64,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| -> anyhow::Result<String> {
            match lookup(name) {
                Some(value) if !value.trim().is_empty() => Ok(value),
                _ => anyhow::bail!("{} must be set", name),
            }
        };

        let config = Config {
            server: ServerConfig {
                host: lookup("API_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
                port: parsed_or(&lookup, "API_PORT", DEFAULT_SERVER_PORT)?,
                base_path: normalize_base_path(
                    &lookup("API_BASE_PATH").unwrap_or_else(|| DEFAULT_BASE_PATH.to_string()),
                ),
                shutdown_timeout_secs: parsed_or(
                    &lookup,
                    "API_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                )?,
                request_timeout_secs: parsed_or(
                    &lookup,
                    "API_REQUEST_TIMEOUT",
                    DEFAULT_REQUEST_TIMEOUT_SECS,
                )?,
            },
            database: DatabaseConfig {
                url: required("POSTGRESQL_URL")?,
                database: required("POSTGRESQL_DATABASE")?,
                max_connections: parsed_or(
                    &lookup,
                    "POSTGRESQL_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                )?,
                min_connections: parsed_or(
                    &lookup,
                    "POSTGRESQL_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                )?,
                connect_timeout_secs: parsed_or(
                    &lookup,
                    "POSTGRESQL_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                )?,
            },
            cors: {
                let allowed_origins: Vec<String> = lookup("API_CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                let allow_credentials = !allowed_origins.iter().any(|o| o == "*");
                CorsConfig {
                    allowed_origins,
                    allow_credentials,
                }
            },
            token: TokenConfig {
                issuer_url: required("TOKEN_ISSUER_URL")?,
                jwks_refresh_secs: parsed_or(
                    &lookup,
                    "TOKEN_JWKS_REFRESH_SECS",
                    DEFAULT_JWKS_REFRESH_SECS,
                )?,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("POSTGRESQL_URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if !self.token.issuer_url.starts_with("http://")
            && !self.token.issuer_url.starts_with("https://")
        {
            anyhow::bail!(
                "TOKEN_ISSUER_URL must be an http(s) URL, got '{}'",
                self.token.issuer_url
            );
        }

        if self.token.jwks_refresh_secs == 0 {
            anyhow::bail!("TOKEN_JWKS_REFRESH_SECS must be greater than 0");
        }

        if self.cors.allows_any_origin() {
            tracing::warn!("CORS allows any origin");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                base_path: DEFAULT_BASE_PATH.to_string(),
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: String::new(),
                database: String::new(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
            token: TokenConfig {
                issuer_url: String::new(),
                jwks_refresh_secs: DEFAULT_JWKS_REFRESH_SECS,
            },
        }
    }
}

/// Parse an optional variable; a present but malformed value is an error
fn parsed_or<F, T>(lookup: &F, name: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value '{}'", name, raw)),
    }
}

/// `"api/"` -> `"/api"`, `"/"` -> `""`
pub fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
