use std::error::Error;

use ai_llm_service::telemetry;
use tracing::{Level, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // .env is optional; real environment variables take precedence.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("warn", Level::INFO))
        .with(telemetry::layer())
        .init();

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "loaded .env");
    }

    api::start().await?;

    Ok(())
}
