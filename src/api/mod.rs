//! HTTP surface: the analyze endpoint and the liveness probe.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AnalysisError;
use crate::service::AnalyzerService;

/// Shared state for the HTTP layer.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AnalyzerService>,
}

/// Uniform `{message, data}` response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    code: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Error channel for the HTTP layer: the envelope shape with a status code
/// per failure kind.
#[derive(Debug)]
pub struct ApiError(AnalysisError);

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AnalysisError::Model => StatusCode::BAD_GATEWAY,
            AnalysisError::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Envelope {
            message: self.0.to_string(),
            data: None,
        };
        (status, Json(body)).into_response()
    }
}

/// Build the service router.
pub fn router(state: AppState, origins: &[String]) -> Router {
    Router::new()
        .route("/analyze-code/", post(analyze_code))
        .route("/health", get(health))
        .layer(cors_layer(origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if parsed.is_empty() {
        layer
    } else {
        layer.allow_origin(AllowOrigin::list(parsed))
    }
}

/// Start the HTTP server on the given address.
pub async fn serve(state: AppState, host: &str, port: u16, origins: &[String]) -> anyhow::Result<()> {
    let router = router(state, origins);
    let addr = format!("{host}:{port}");
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn analyze_code(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<Envelope>, ApiError> {
    let suggestions = state.service.analyze(&req.code).await?;

    Ok(Json(Envelope {
        message: "analysis completed successfully".to_string(),
        data: Some(suggestions),
    }))
}
