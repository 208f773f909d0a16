/// Configuration management for the guild verifier
use crate::error::{GuildError, GuildResult};
use serde::{Deserialize, Serialize};
use std::env;

/// Default upstream directory service
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.guild.xyz/v1";

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub upstream: UpstreamConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
}

/// Upstream directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL without trailing slash (e.g., https://api.guild.xyz/v1)
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// User-Agent header for upstream requests
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_URL.to_string(),
            timeout_secs: 10,
            user_agent: format!("guild-verifier/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> GuildResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("GUILD_HOSTNAME").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("GUILD_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| GuildError::Validation("Invalid port number".to_string()))?;
        let version = env!("CARGO_PKG_VERSION").to_string();

        let defaults = UpstreamConfig::default();
        let base_url = env::var("GUILD_UPSTREAM_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);
        let timeout_secs = env::var("GUILD_UPSTREAM_TIMEOUT_SECS")
            .unwrap_or_else(|_| defaults.timeout_secs.to_string())
            .parse()
            .map_err(|_| GuildError::Validation("Invalid upstream timeout".to_string()))?;
        let user_agent = env::var("GUILD_UPSTREAM_USER_AGENT").unwrap_or(defaults.user_agent);

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
            },
            upstream: UpstreamConfig {
                base_url,
                timeout_secs,
                user_agent,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> GuildResult<()> {
        if self.service.hostname.is_empty() {
            return Err(GuildError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.upstream.timeout_secs == 0 {
            return Err(GuildError::Validation(
                "Upstream timeout must be at least 1 second".to_string(),
            ));
        }

        if !self.upstream.base_url.starts_with("http://")
            && !self.upstream.base_url.starts_with("https://")
        {
            return Err(GuildError::Validation(format!(
                "Upstream URL must be http(s): {}",
                self.upstream.base_url
            )));
        }

        Ok(())
    }
}
