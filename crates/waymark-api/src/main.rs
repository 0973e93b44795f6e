//! waymark-api - HTTP API server for waymark

mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use waymark_core::defaults;
use waymark_inference::{AnthropicBackend, StreamingChat};
use waymark_store::Storage;

use handlers::{chat, journeys, media, messages, threads};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Produces UUIDv7 correlation IDs for incoming requests.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically when
/// correlating a request's log lines across the store and inference layers.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared state handed to every handler.
#[derive(Clone)]
struct AppState {
    /// Journey, thread, and media repositories over one storage root.
    storage: Arc<Storage>,
    /// Streaming backend for assistant turns.
    chat: Arc<dyn StreamingChat>,
}

// =============================================================================
// CORS
// =============================================================================

/// Parse allowed CORS origins from the `ALLOWED_ORIGINS` environment
/// variable (comma-separated). Unset or empty means only the default
/// local frontend origin.
fn parse_allowed_origins() -> Vec<HeaderValue> {
    let origins_str = std::env::var("ALLOWED_ORIGINS").unwrap_or_default();
    parse_origin_list(&origins_str)
}

fn parse_origin_list(origins_str: &str) -> Vec<HeaderValue> {
    if origins_str.trim().is_empty() {
        return vec![HeaderValue::from_static(defaults::ALLOWED_ORIGIN)];
    }

    origins_str
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

// =============================================================================
// STARTUP
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pull in .env before any configuration is read
    dotenvy::dotenv().ok();

    // Tracing setup, shaped by environment
    //
    // Environment variables:
    //   LOG_FORMAT  - "text" (default) or "json"
    //   LOG_FILE    - write to this file instead of stdout
    //   LOG_ANSI    - "true"/"false" forces ANSI colors on or off
    //   RUST_LOG    - env filter, default "waymark_api=debug,tower_http=debug"
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "waymark_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // File output goes through a daily-rotated non-blocking appender
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("waymark-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(non_blocking);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            } else {
                layer = layer.with_ansi(false); // files never get ANSI codes
            }
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Server configuration from the environment
    let storage_path =
        std::env::var("STORAGE_PATH").unwrap_or_else(|_| defaults::STORAGE_PATH.to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| defaults::SERVER_HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| defaults::SERVER_PORT.to_string())
        .parse()
        .unwrap_or(defaults::SERVER_PORT);

    // Open storage (creates collection directories, runs a health check)
    let storage = Storage::open(storage_path.as_str()).await?;
    info!("Storage initialized at {}", storage_path);

    // Streaming chat backend
    let chat_backend = AnthropicBackend::from_env()?;
    info!("Chat backend initialized: {}", chat_backend.model_name());

    let state = AppState {
        storage: Arc::new(storage),
        chat: Arc::new(chat_backend),
    };

    let app = router(state);

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// =============================================================================
// ROUTER
// =============================================================================

fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Journeys
        .route(
            "/api/journeys",
            get(journeys::list_journeys).post(journeys::create_journey),
        )
        .route(
            "/api/journeys/:id",
            get(journeys::get_journey).delete(journeys::delete_journey),
        )
        // Threads
        .route(
            "/api/threads",
            get(threads::list_threads).post(threads::create_thread),
        )
        .route(
            "/api/threads/:id",
            get(threads::get_thread)
                .put(threads::rename_thread)
                .delete(threads::delete_thread),
        )
        // Messages
        .route("/api/threads/:id/messages", post(messages::append_message))
        .route(
            "/api/threads/:id/messages/:message_id",
            put(messages::edit_message).delete(messages::delete_message),
        )
        // Media
        .route("/api/media/sweep", post(media::sweep_media))
        .route("/api/media/:filename", get(media::get_media))
        // Chat
        .route("/api/chat", post(chat::stream_chat))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer({
            let allowed_origins = parse_allowed_origins();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(std::time::Duration::from_secs(3600))
        })
        // The extractor default (2 MB) is disabled so the tower-http limit
        // below is the single body-size bound for attachment uploads.
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(defaults::MAX_BODY_SIZE_BYTES))
        .with_state(state)
}

// =============================================================================
// HEALTH CHECK
// =============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

/// Handler-level error mapped onto an HTTP status and `{"error": ...}` body.
#[derive(Debug)]
enum ApiError {
    Internal(waymark_core::Error),
    NotFound(String),
    BadRequest(String),
}

impl From<waymark_core::Error> for ApiError {
    fn from(err: waymark_core::Error) -> Self {
        match &err {
            waymark_core::Error::NotFound(_)
            | waymark_core::Error::JourneyNotFound(_)
            | waymark_core::Error::ThreadNotFound(_)
            | waymark_core::Error::MessageNotFound(_) => ApiError::NotFound(err.to_string()),
            waymark_core::Error::InvalidInput(_) => ApiError::BadRequest(err.to_string()),
            _ => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Internal(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

// =============================================================================
// TESTS
// =============================================================================
