/// Application context and dependency injection
use crate::{
    aggregate::Aggregator,
    config::ServerConfig,
    directory::{
        AccessResolver, CommunityDirectory, DirectoryClient, DirectoryClientConfig,
        HttpDirectoryClient,
    },
    error::GuildResult,
};
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    /// Process-wide community cache; lives as long as the server
    pub directory: Arc<CommunityDirectory>,
    pub aggregator: Arc<Aggregator>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub fn new(config: ServerConfig) -> GuildResult<Self> {
        // Validate configuration
        config.validate()?;

        let client = HttpDirectoryClient::new(DirectoryClientConfig::from(&config.upstream))?;
        tracing::info!("Upstream directory: {}", config.upstream.base_url);

        Ok(Self::with_directory_client(config, Arc::new(client)))
    }

    /// Build the context over an explicit directory backend
    pub fn with_directory_client(config: ServerConfig, client: Arc<dyn DirectoryClient>) -> Self {
        let directory = Arc::new(CommunityDirectory::new(Arc::clone(&client)));
        let access = AccessResolver::new(client);
        let aggregator = Arc::new(Aggregator::new(Arc::clone(&directory), access));

        Self {
            config: Arc::new(config),
            directory,
            aggregator,
        }
    }

    /// Get listen address
    pub fn listen_addr(&self) -> String {
        format!(
            "{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
