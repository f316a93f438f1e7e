use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use triage_agents::{AgentError, CompletionModel, MessageRouter, RouterResponse};

use crate::{models::RouterRequest, telemetry::correlation_id_middleware};

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Error body of the router endpoint: `{"error", "details"}`.
struct ApiError {
    status: StatusCode,
    message: &'static str,
    details: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.message,
            "details": self.details,
        });
        (self.status, Json(body)).into_response()
    }
}

// Any agent failure is a completion transport error, reported as a 500.
impl From<AgentError> for ApiError {
    fn from(e: AgentError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Failed to process message",
            details: e.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub router: Arc<MessageRouter>,
}

/// Builds the HTTP app around an already constructed completion model.
pub fn create_app(model: Arc<dyn CompletionModel>) -> Router {
    info!(model = %model.model_id(), "Creating message router");
    let app_state = AppState {
        router: Arc::new(MessageRouter::new(model)),
    };
    build_router(app_state)
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/agents/router", post(route_message))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(correlation_id_middleware))
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Chat Triage Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Language and topic triage for website chat messages",
        "endpoints": {
            "POST /agents/router": "Classify a chat message and generate a reply",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn route_message(
    State(state): State<AppState>,
    Json(request): Json<RouterRequest>,
) -> ApiResult<RouterResponse> {
    info!(
        message_length = request.message.len(),
        history_length = request.conversation.len(),
        "Processing router request"
    );

    let response = state
        .router
        .route(&request.message, &request.conversation)
        .await
        .inspect_err(|e| error!(error = %e, "Failed to route message"))?;

    info!(
        detected_language = %response.detected_language,
        is_medical_request = response.is_medical_request,
        is_legal_request = response.is_legal_request,
        "Router request completed"
    );
    Ok(Json(response))
}
