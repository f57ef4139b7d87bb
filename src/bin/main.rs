use investment_assistant::{
    config::Config,
    create_investment_pipeline,
    llm::create_client,
    session::{ChatSession, DISCLAIMER},
    tools::create_default_registry,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
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
        .with_writer(std::io::stderr)
        .init();

    info!(environment = %config.environment, model = %config.openai_model, "Investment Assistant starting");

    let tools = create_default_registry();
    let client = create_client(&config)?;
    let pipeline = Arc::new(create_investment_pipeline(&config, client, &tools));
    let mut session = ChatSession::new(pipeline);

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(b"Investment Assistant\nAsk me about investments, stocks, or portfolio analysis. Type /quit to exit.\n\n")
        .await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }
        if prompt == "/quit" || prompt == "/exit" {
            break;
        }

        let answer = session.submit(prompt).await;
        stdout.write_all(format!("\n{}\n\n", answer).as_bytes()).await?;
    }

    info!(messages = session.history().message_count(), "Session ended");
    stdout
        .write_all(format!("\n{}\n", DISCLAIMER).as_bytes())
        .await?;

    Ok(())
}
