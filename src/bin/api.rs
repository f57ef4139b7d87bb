use investment_assistant::{
    api::start_server,
    config::Config,
    create_investment_pipeline,
    llm::create_client,
    tools::create_default_registry,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.default_log_level())),
        )
        .init();

    info!("Investment Assistant - API Server");
    info!("Port: {}", config.port);

    let tools = Arc::new(create_default_registry());
    let client = create_client(&config)?;
    let pipeline = Arc::new(create_investment_pipeline(&config, client, &tools));

    info!(live = config.has_credential(), "Pipeline initialized");

    start_server(pipeline, tools, config.port).await?;

    Ok(())
}
