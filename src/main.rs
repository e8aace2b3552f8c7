mod config;
mod frame;
mod routes;
mod services;
mod state;

use crate::config::{Config, ConfigError};
use crate::services::packs::{self, PackError, PackStore};

/// Anything that stops the server from coming up.
#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("word packs: {0}")]
    Packs(#[from] PackError),
    #[error("failed to bind port {port}: {source}")]
    Bind { port: u16, source: std::io::Error },
    #[error("server failed: {0}")]
    Serve(std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    // A missing .env file is normal outside development.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let store = PackStore::load_dir(&config.packs_dir)?;
    let words = packs::active_words(&store, &config.word_pack)?;
    tracing::info!(pack = %config.word_pack, words = words.len(), "active word pack loaded");

    let state = state::AppState::new(store, words, config.timing);
    let app = match &config.static_dir {
        Some(dir) => routes::app_with_static(state, dir),
        None => routes::app(state),
    };

    let port = config.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .map_err(|source| StartupError::Bind { port, source })?;

    tracing::info!(%port, "doodleroom listening");
    axum::serve(listener, app).await.map_err(StartupError::Serve)
}
