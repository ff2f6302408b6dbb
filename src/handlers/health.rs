use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

/// GET /health - liveness plus a database ping
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.db.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok",
                "version": env!("CARGO_PKG_VERSION"),
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable",
                    "version": env!("CARGO_PKG_VERSION"),
                })),
            )
        }
    }
}

/// GET / - service name and route overview
pub async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "name": "Bookflow API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health (public)",
            "auth": "/api/auth/* (public)",
            "authors": "/api/authors[/:authorId[/works]]",
            "works": "/api/works[/:workId[/editions|/primary-edition]]",
            "user": "/api/user/{profile,account,authors,works} (session required)",
            "openlibrary": "/api/openlibrary/* (session required, rate limited)",
        }
    }))
}
