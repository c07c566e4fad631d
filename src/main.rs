use comment_insight_api::{Config, InsightError, InsightServer};

#[tokio::main]
async fn main() -> Result<(), InsightError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_target(false)
        .json()
        .init();

    tracing::info!("Starting comment insight API server");

    let config = Config::from_env()?;
    let server = InsightServer::new(config).await?;
    server.run().await?;

    Ok(())
}
