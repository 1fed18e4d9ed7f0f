//! Liveness endpoint. No authentication, no dependency checks: a 200 here
//! means the process is up and routing requests.

use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

async fn liveness() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/health", get(liveness))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn liveness_reports_healthy() {
        let response = liveness().await.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }
}
