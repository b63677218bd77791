// KyatFlow - Web Server
// JSON API over the formatting helpers, for clients that cannot link the library

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use kyatflow::{
    format_live_input, from_myanmar_digits, parse_payment_notification, relative_time,
    to_myanmar_digits, AmountFormatter, DisplayUnit, Language, ParsedNotification, Preferences,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    prefs: Arc<Preferences>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn err(data: T, message: &str) -> Self {
        Self {
            success: false,
            data,
            error: Some(message.to_string()),
        }
    }
}

/// Format request; unset fields fall back to the server preferences
#[derive(Deserialize)]
struct FormatRequest {
    amount: f64,
    unit: Option<DisplayUnit>,
    language: Option<Language>,
    with_suffix: Option<bool>,
}

#[derive(Deserialize)]
struct TextRequest {
    text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum Direction {
    ToMyanmar,
    ToWestern,
}

#[derive(Deserialize)]
struct TransliterateRequest {
    text: String,
    direction: Direction,
}

#[derive(Deserialize)]
struct RelativeTimeRequest {
    timestamp: DateTime<Utc>,
    now: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct ParseResponse {
    value: f64,
    kyats: f64,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/format - Format an amount
async fn format_handler(
    State(state): State<AppState>,
    Json(req): Json<FormatRequest>,
) -> impl IntoResponse {
    let mut prefs = (*state.prefs).clone();
    if let Some(unit) = req.unit {
        prefs.unit = unit;
    }
    if let Some(language) = req.language {
        prefs.language = language;
    }
    if let Some(with_suffix) = req.with_suffix {
        prefs.show_suffix = with_suffix;
    }

    Json(ApiResponse::ok(AmountFormatter::new(prefs).format(req.amount)))
}

/// POST /api/parse-input - Parse typed amount text
async fn parse_input_handler(
    State(state): State<AppState>,
    Json(req): Json<TextRequest>,
) -> impl IntoResponse {
    let formatter = AmountFormatter::new((*state.prefs).clone());

    Json(ApiResponse::ok(ParseResponse {
        value: formatter.parse(&req.text),
        kyats: formatter.parse_to_kyats(&req.text),
    }))
}

/// POST /api/live-input - Regroup partially typed input
async fn live_input_handler(Json(req): Json<TextRequest>) -> impl IntoResponse {
    Json(ApiResponse::ok(format_live_input(&req.text)))
}

/// POST /api/transliterate - Swap digit glyphs
async fn transliterate_handler(Json(req): Json<TransliterateRequest>) -> impl IntoResponse {
    let text = match req.direction {
        Direction::ToMyanmar => to_myanmar_digits(&req.text),
        Direction::ToWestern => from_myanmar_digits(&req.text),
    };

    Json(ApiResponse::ok(text))
}

/// POST /api/relative-time - "5m ago" label
async fn relative_time_handler(Json(req): Json<RelativeTimeRequest>) -> impl IntoResponse {
    let now = req.now.unwrap_or_else(Utc::now);
    Json(ApiResponse::ok(relative_time(req.timestamp, now)))
}

/// POST /api/notifications/parse - Extract a payment from SMS text
async fn parse_notification_handler(Json(req): Json<TextRequest>) -> impl IntoResponse {
    match parse_payment_notification(&req.text) {
        Some(parsed) => (StatusCode::OK, Json(ApiResponse::ok(Some(parsed)))).into_response(),
        None => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::<Option<ParsedNotification>>::err(
                None,
                "No MMK amount found in notification text",
            )),
        )
            .into_response(),
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kyatflow=info,tower_http=debug,axum=debug".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let prefs_path = Preferences::default_path();
    let prefs = Preferences::load_or_default(&prefs_path)?;
    tracing::info!(path = %prefs_path.display(), unit = prefs.unit.code(), language = prefs.language.code(), "preferences loaded");

    // Create shared state
    let state = AppState {
        prefs: Arc::new(prefs),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/format", post(format_handler))
        .route("/parse-input", post(parse_input_handler))
        .route("/live-input", post(live_input_handler))
        .route("/transliterate", post(transliterate_handler))
        .route("/relative-time", post(relative_time_handler))
        .route("/notifications/parse", post(parse_notification_handler))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = std::env::var("KYATFLOW_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🚀 Server running on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
