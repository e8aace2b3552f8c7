//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router carries the game websocket at `/ws`, the word pack REST
//! API under `/api/packs`, and a health check. When a static directory is
//! configured, the drawing client is served from it as the fallback.

pub mod packs;
pub mod ws;

use std::path::Path;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// API and websocket routes.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/api/packs", get(packs::list_packs).post(packs::create_pack))
        .route("/api/packs/{name}", get(packs::get_pack).delete(packs::delete_pack))
        .route("/api/packs/{name}/words", post(packs::add_word))
        .route("/api/packs/{name}/words/{word}", delete(packs::delete_word))
        .layer(CompressionLayer::new());

    Router::new()
        .merge(api)
        .route("/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// `app` plus static client files served from `dir`.
pub fn app_with_static(state: AppState, dir: &Path) -> Router {
    let site = ServeDir::new(dir).append_index_html_on_directories(true);
    app(state).fallback_service(site)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn healthz_is_ok() {
        assert_eq!(healthz().await, StatusCode::OK);
    }
}
