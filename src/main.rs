//! Main entry point for the embeddings gateway

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use embeddings_gateway::{api::create_router, bind_listener, core::Config, EmbeddingsService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        "Starting embeddings gateway on {}:{}",
        config.server.host,
        config.server.port
    );

    // Initialize service; an invalid model list is fatal
    let service = EmbeddingsService::new(config.clone()).await?;
    if let Err(e) = service.validate_models().await {
        tracing::error!("Model validation failed: {}", e);
        return Err(e.into());
    }

    let app = create_router(service.app_state());

    // Start server
    let listener = bind_listener(&config.server).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
