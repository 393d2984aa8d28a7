use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

/// Liveness banner served at `/`
#[derive(Debug, Serialize)]
pub struct StatusBanner {
    status: &'static str,
    message: &'static str,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
}

/// GET / - Service banner
pub async fn root() -> Json<StatusBanner> {
    Json(StatusBanner {
        status: "ok",
        message: "Carbon Operations Engine Running",
    })
}

/// GET /health - Health check endpoint
///
/// The engine is stateless, so a running process is a healthy one
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now(),
    })
}

/// GET /health/live - Liveness probe for Kubernetes
///
/// Returns 200 if the application is running
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_root_banner() {
        let Json(banner) = root().await;
        let json = serde_json::to_value(banner).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["message"], "Carbon Operations Engine Running");
    }

    #[tokio::test]
    async fn test_liveness_check() {
        let response = liveness_check().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
