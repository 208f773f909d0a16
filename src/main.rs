/// Guild Verifier - signed-message role lookup service
use guild_verifier::{config::ServerConfig, metrics, server, AppContext, GuildResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> GuildResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "guild_verifier=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    metrics::init();

    // Load configuration
    let config = ServerConfig::from_env()?;
    tracing::info!(
        version = %config.service.version,
        log_level = %config.logging.level,
        "Starting guild verifier"
    );

    // Create application context
    let ctx = AppContext::new(config)?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}
