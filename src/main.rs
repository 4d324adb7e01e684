use anyhow::{Context, Result};
use stats_learning_site::{config, server};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when not present)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stats_learning_site=info".parse()?),
        )
        .init();

    info!("Starting statistics learning site");

    let config = config::Config::from_env()?;

    // A missing default-locale file is fatal
    let state = server::AppState::from_config(&config).with_context(|| {
        format!(
            "Failed to load translations from {}",
            config.translations_dir.display()
        )
    })?;

    info!(
        "Serving quizzes from {} and static files from {}",
        config.quizzes_dir.display(),
        config.static_dir.display()
    );

    server::serve(&config, state).await
}
