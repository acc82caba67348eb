//! HTTP control surface
//!
//! A small externally reachable API: `POST /speak` pushes caller-supplied
//! text into the synthesis half of the pipeline, `GET /health` reports
//! liveness and link state.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::bridge::Orchestrator;
use crate::transport::VoiceLink;
use crate::{Error, Result};

/// Shared state for API handlers
pub struct ApiState {
    /// Orchestrator driving the speak pipeline
    pub orchestrator: Arc<Orchestrator>,
    /// Voice link, for health reporting
    pub link: Arc<dyn VoiceLink>,
}

/// Build the control-surface router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/speak", post(speak))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the control surface until `shutdown` resolves.
///
/// # Errors
///
/// Returns error if the listener cannot bind or the server fails
pub async fn serve(
    state: Arc<ApiState>,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Config(format!("bind {addr}: {e}")))?;

    tracing::info!(addr, "control surface listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(Error::Io)
}

/// Health response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    link_connected: bool,
}

/// Liveness probe
async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        link_connected: state.link.is_connected(),
    })
}

/// Speak request
#[derive(Debug, Deserialize)]
struct SpeakRequest {
    text: String,
    #[serde(default)]
    voice: Option<String>,
}

/// Speak response
#[derive(Debug, Serialize)]
struct SpeakResponse {
    status: &'static str,
}

/// Queue caller-supplied text for synthesis and transmission.
///
/// Returns 202 once queued; synthesis failures after that are only logged,
/// matching the silent-abort policy for the speak pipeline.
async fn speak(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SpeakRequest>,
) -> std::result::Result<(StatusCode, Json<SpeakResponse>), ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("empty text"));
    }
    if !state.link.is_connected() {
        return Err(ApiError::NotConnected);
    }

    let orchestrator = Arc::clone(&state.orchestrator);
    tokio::spawn(async move {
        if let Err(e) = orchestrator
            .speak(&request.text, request.voice.as_deref())
            .await
        {
            tracing::warn!(error = %e, "speak request aborted");
        }
    });

    Ok((StatusCode::ACCEPTED, Json(SpeakResponse { status: "queued" })))
}

/// Control surface errors
#[derive(Debug)]
enum ApiError {
    BadRequest(&'static str),
    NotConnected,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: &'static str,
        }

        let (status, code, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::NotConnected => (
                StatusCode::SERVICE_UNAVAILABLE,
                "not_connected",
                "voice link is not connected",
            ),
        };

        (status, Json(ErrorResponse { error: ErrorBody { code, message } })).into_response()
    }
}
