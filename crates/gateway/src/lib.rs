//! HTTP gateway for Aisha.
//!
//! Exposes the chat endpoint, the embedded web page and a health check.
//!
//! Built on Axum; every request runs through CORS, a body size limit
//! and HTTP trace logging.

pub mod frontend;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use aisha_agent::{ChatError, ChatService, WhatlangDetector};
use aisha_config::{AppConfig, GatewayConfig};
use aisha_memory::HistoryCache;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub chat: ChatService,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes and layers.
pub fn build_router(state: SharedState, config: &GatewayConfig) -> Router {
    Router::new()
        .route("/chat/", post(chat_handler))
        .route("/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .merge(frontend::frontend_router())
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors_layer(&config.allow_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// CORS policy. `"*"` anywhere in the list allows every origin, method
/// and header.
fn cors_layer(allow_origins: &[String]) -> CorsLayer {
    if allow_origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allow_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600))
}

/// Assemble the chat pipeline from configuration: provider, history
/// cache, persona and language detector.
pub fn build_chat_service(config: &AppConfig) -> Result<ChatService, Box<dyn std::error::Error>> {
    if !config.has_api_key() {
        warn!(
            provider = %config.default_provider,
            "No API key configured; model calls will likely fail"
        );
    }

    let router = aisha_providers::router::build_from_config(config);
    let provider = router.default().ok_or_else(|| {
        format!("No provider registered under '{}'", config.default_provider)
    })?;

    let history = Arc::new(HistoryCache::new(Duration::from_secs(config.history.ttl_secs)));
    let persona = config.persona.resolve();
    info!(
        persona = %persona.name,
        source = persona.source.as_deref().unwrap_or("<built-in>"),
        prompt_tokens = persona.estimated_tokens(),
        "Persona loaded"
    );

    Ok(ChatService::new(provider, config.active_model(), history)
        .with_params(config.generation)
        .with_detector(Arc::new(WhatlangDetector::new()))
        .with_persona(persona)
        .with_blank_rejection(config.chat.reject_blank_messages))
}

/// Start the gateway HTTP server and run until Ctrl-C.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let chat = build_chat_service(&config)?;
    info!(
        provider = %chat.provider_name(),
        model = %chat.model(),
        ttl_secs = config.history.ttl_secs,
        "Chat service ready"
    );

    let app = build_router(Arc::new(GatewayState { chat }), &config.gateway);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// --- Handlers ---

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: &'static str,
}

/// A chat failure as seen by the HTTP caller.
struct ApiError {
    status: StatusCode,
    detail: &'static str,
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        let status = match &e {
            ChatError::EmptyMessage => StatusCode::BAD_REQUEST,
            ChatError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            detail: e.public_detail(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { detail: self.detail })).into_response()
    }
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let response = state.chat.reply(&payload.message).await?;
    Ok(Json(ChatResponse { response }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    history_entries: usize,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        history_entries: state.chat.history().len(),
    })
}
