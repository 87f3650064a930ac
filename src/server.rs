//! A small HTTP endpoint that keeps the portfolio document in a JSON file so
//! several machines can share one copy through the remote mirror.

use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

struct ServerState {
    data_file: PathBuf,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn get_data(State(state): State<Arc<ServerState>>) -> Json<Value> {
    let content = match tokio::fs::read_to_string(&state.data_file).await {
        Ok(content) => content,
        Err(e) => {
            debug!("No data at {}: {}", state.data_file.display(), e);
            return Json(json!({}));
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => Json(value),
        Err(e) => {
            warn!(
                "{} is corrupted, returning empty data: {}",
                state.data_file.display(),
                e
            );
            Json(json!({}))
        }
    }
}

async fn post_data(State(state): State<Arc<ServerState>>, body: String) -> Response {
    let value: Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("Invalid JSON: {e}")),
    };

    let pretty = match serde_json::to_string_pretty(&value) {
        Ok(pretty) => pretty,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    if let Some(parent) = state.data_file.parent() {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            warn!("Failed to create {}: {}", parent.display(), e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save data");
        }
    }
    if let Err(e) = tokio::fs::write(&state.data_file, pretty).await {
        warn!("Failed to write {}: {}", state.data_file.display(), e);
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save data");
    }

    debug!("Saved {} bytes to {}", body.len(), state.data_file.display());
    Json(json!({ "success": true, "message": "Data saved successfully" })).into_response()
}

pub fn router(data_file: PathBuf) -> Router {
    let state = Arc::new(ServerState { data_file });
    Router::new()
        .route("/api/data", get(get_data).post(post_data))
        .with_state(state)
}

pub async fn serve_on(listener: TcpListener, data_file: PathBuf) -> Result<()> {
    axum::serve(listener, router(data_file))
        .await
        .context("Server stopped unexpectedly")
}

pub async fn serve(config: &AppConfig) -> Result<()> {
    let data_file = config.server_data_file()?;
    let listener = TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    info!("Listening on {}", config.server.bind);
    println!(
        "Serving {} on http://{}/api/data",
        data_file.display(),
        config.server.bind
    );
    serve_on(listener, data_file).await
}
