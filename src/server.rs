use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::rate_limiter::SubmissionLimiter;
use crate::ticket::{self, Submission};
use crate::zoho::ZohoDesk;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// One submission per IP and per email inside this window.
pub const SUBMISSION_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub limiter: Arc<SubmissionLimiter>,
    pub desk: Arc<ZohoDesk>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let desk = Arc::new(ZohoDesk::new(&config));
        Self {
            config,
            limiter: Arc::new(SubmissionLimiter::new(SUBMISSION_WINDOW)),
            desk,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let images_dir = Path::new(&state.config.public_dir).join("images");
    Router::new()
        .route("/", get(|| async { Html(INDEX_HTML) }))
        .route("/api/puzzle", get(puzzle_handler))
        .route("/api/submit", post(submit_handler))
        .nest_service("/images", ServeDir::new(images_dir))
        .nest_service("/static", ServeDir::new("static"))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct SubmitResponse {
    success: bool,
    message: String,
    #[serde(rename = "ticketId")]
    ticket_id: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

async fn puzzle_handler(State(state): State<AppState>) -> Response {
    let path = Path::new(&state.config.public_dir)
        .join("data")
        .join("puzzle2024.json");
    let contents = match tokio::fs::read_to_string(&path).await {
        Ok(contents) => contents,
        Err(e) => {
            error!("Error loading puzzle data from {}: {}", path.display(), e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load puzzle data",
            );
        }
    };
    match serde_json::from_str::<serde_json::Value>(&contents) {
        Ok(puzzle) => Json(puzzle).into_response(),
        Err(e) => {
            error!("Invalid puzzle data in {}: {}", path.display(), e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load puzzle data",
            )
        }
    }
}

async fn submit_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(submission): Json<Submission>,
) -> Response {
    if let Some(field) = submission.missing_field() {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Missing required field: {field}"),
        );
    }

    let ip = client_ip(&headers, addr);
    info!("Submission from IP {}", ip);

    if let Err(message) = state.limiter.check(&ip, &submission.email) {
        warn!("Rate limit hit for IP {}", ip);
        return error_response(StatusCode::TOO_MANY_REQUESTS, message);
    }

    let payload = ticket::build_ticket(&submission, &ip, &state.config);
    match state.desk.create_ticket(&payload).await {
        Ok(created) => {
            // Only a confirmed ticket consumes the rate-limit slot.
            state.limiter.commit(&ip, &submission.email);
            (
                StatusCode::OK,
                Json(SubmitResponse {
                    success: true,
                    message: "Ticket created successfully".to_string(),
                    ticket_id: created.id,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Ticket creation failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// Client address for rate limiting, honoring reverse-proxy headers before
/// falling back to the socket peer.
fn client_ip(headers: &HeaderMap, addr: SocketAddr) -> String {
    for name in ["x-forwarded-for", "x-real-ip"] {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            if let Some(first) = value.split(',').next().map(str::trim) {
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
    }
    addr.ip().to_string()
}
