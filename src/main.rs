mod bot;
mod config;
mod dictionary;
mod error;
mod game;
mod models;
mod routes;
mod telegram;
mod transport;

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::Router;
use bot::Bot;
use config::Config;
use dictionary::{ImageAssets, WordList};
use game::GameSession;
use telegram::TelegramClient;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transport::Transport;

/// Application state shared across all handlers
pub struct AppState {
    pub config: Config,
    pub bot: Arc<Bot>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alias_party_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Alias party bot...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Load word list
    let words = WordList::load_or_builtin(&config.game.words_path).await;
    tracing::info!("Word list ready with {} words", words.len());
    let assets = ImageAssets::from_setting(&config.game.images_dir);

    // Create shared HTTP client for reusing connections
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;
    let client = Arc::new(TelegramClient::new(http_client, &config.bot.token));
    let transport: Arc<dyn Transport> = client.clone();
    tracing::info!("Telegram client initialized");

    let session = GameSession::new(config.game.clone(), words, assets, transport.clone());
    let bot = Arc::new(Bot::new(session, transport));

    match &config.bot.webhook_url {
        Some(base) => {
            client
                .set_webhook(&webhook_endpoint(base, &config.bot.token))
                .await
                .context("Failed to register webhook")?;
            tracing::info!("Webhook registered at {}/webhook/...", base);
        }
        None => {
            let polling_bot = bot.clone();
            tokio::spawn(async move {
                telegram::run_polling(client, polling_bot).await;
            });
        }
    }

    // Create application state
    let state = Arc::new(AppState {
        config: config.clone(),
        bot,
    });

    // Build router
    let app = Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Public URL Telegram should deliver updates to
fn webhook_endpoint(base: &str, token: &str) -> String {
    format!("{}/webhook/{}", base.trim_end_matches('/'), token)
}
