//! Word pack REST routes.
//!
//! Every response uses the same envelope: `{"success": true, "data": ...}`
//! for reads, `{"success": true, "message": ...}` for mutations, and
//! `{"success": false, "error": ...}` for failures. Changes live in memory
//! only and do not alter the word list rooms are already drawing from.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::services::packs::{PackError, WordPackSource};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePackBody {
    pub name: Option<String>,
    pub words: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct AddWordBody {
    pub word: Option<String>,
}

// =============================================================================
// ENVELOPE
// =============================================================================

fn data(status: StatusCode, value: serde_json::Value) -> Response {
    (status, Json(json!({ "success": true, "data": value }))).into_response()
}

fn message(status: StatusCode, text: String) -> Response {
    (status, Json(json!({ "success": true, "message": text }))).into_response()
}

fn failure(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "success": false, "error": error }))).into_response()
}

pub(crate) fn pack_error_to_status(err: &PackError) -> StatusCode {
    match err {
        PackError::NotFound(_) => StatusCode::NOT_FOUND,
        PackError::AlreadyExists(_) => StatusCode::CONFLICT,
        PackError::InvalidWord | PackError::InvalidName | PackError::Empty(_) => StatusCode::BAD_REQUEST,
        PackError::Io { .. } | PackError::Json { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn pack_error(err: &PackError) -> Response {
    let status = pack_error_to_status(err);
    if status.is_server_error() {
        warn!(error = %err, "packs: request failed");
        return failure(status, "Server error");
    }
    failure(status, &err.to_string())
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /api/packs`: every pack with its words.
pub async fn list_packs(State(state): State<AppState>) -> Response {
    let packs = state.packs.read().await.all();
    data(StatusCode::OK, json!(packs))
}

/// `POST /api/packs`: create a pack from `{name, words}`.
pub async fn create_pack(State(state): State<AppState>, body: Result<Json<CreatePackBody>, JsonRejection>) -> Response {
    let Ok(Json(body)) = body else {
        return failure(StatusCode::BAD_REQUEST, "Invalid body");
    };
    let Some(name) = body.name.filter(|n| !n.trim().is_empty()) else {
        return failure(StatusCode::BAD_REQUEST, "Missing name");
    };
    let Some(words) = body.words else {
        return failure(StatusCode::BAD_REQUEST, "Missing words array");
    };

    match state.packs.write().await.create(&name, words) {
        Ok(()) => {
            info!(pack = %name, "packs: created");
            message(StatusCode::CREATED, format!("Pack {name} successfully created."))
        }
        Err(e) => pack_error(&e),
    }
}

/// `GET /api/packs/{name}`: one pack.
pub async fn get_pack(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.packs.read().await.get_pack(&name) {
        Ok(pack) => data(StatusCode::OK, json!(pack)),
        Err(e) => pack_error(&e),
    }
}

/// `DELETE /api/packs/{name}`: remove a pack.
pub async fn delete_pack(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.packs.write().await.delete(&name) {
        Ok(()) => {
            info!(pack = %name, "packs: deleted");
            message(StatusCode::OK, format!("Pack {name} deleted."))
        }
        Err(e) => pack_error(&e),
    }
}

/// `POST /api/packs/{name}/words`: add `{word}` to a pack.
pub async fn add_word(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Result<Json<AddWordBody>, JsonRejection>,
) -> Response {
    let Some(word) = body.ok().and_then(|Json(b)| b.word).filter(|w| !w.is_empty()) else {
        return failure(StatusCode::BAD_REQUEST, "Missing word");
    };

    match state.packs.write().await.add_word(&name, &word) {
        Ok(()) => message(StatusCode::OK, format!("Word {word} successfully added to {name}.")),
        Err(e) => pack_error(&e),
    }
}

/// `DELETE /api/packs/{name}/words/{word}`: remove a word from a pack.
pub async fn delete_word(State(state): State<AppState>, Path((name, word)): Path<(String, String)>) -> Response {
    match state.packs.write().await.delete_word(&name, &word) {
        Ok(()) => message(StatusCode::OK, format!("Word {word} removed from {name}.")),
        Err(e) => pack_error(&e),
    }
}

#[cfg(test)]
#[path = "packs_test.rs"]
mod tests;
