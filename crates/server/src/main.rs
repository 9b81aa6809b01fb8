use std::{net::SocketAddr, path::Path, sync::Arc};

use axum::{
    extract::{OriginalUri, Query, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use server_api::{
    fetch_landing_config, forward_lead_confirm, forward_lead_submit, forward_resend_confirmation,
    ApiContext, UpstreamClient,
};
use shared::{
    error::ApiError,
    protocol::{LeadResendRequest, LeadSubmitRequest},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{info, warn};

mod config;

use config::{load_settings, parse_cors_origins, Settings};

#[derive(Clone)]
struct AppState {
    api: ApiContext,
    public_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConfirmQuery {
    token: Option<String>,
}

const MIN_CONFIRM_TOKEN_CHARS: usize = 10;
const MAX_NAME_CHARS: usize = 255;
const MAX_BODY_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let state = AppState {
        api: ApiContext {
            upstream: UpstreamClient::new(&settings.upstream_api_url, &settings.funnel_slug),
        },
        public_url: settings.public_url.clone(),
    };
    let app = build_router(Arc::new(state), &settings);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, upstream = %settings.upstream_api_url, "gateway listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, settings: &Settings) -> Router {
    let api = Router::new()
        .route("/landing-config", get(http_landing_config))
        .route("/leads/submit", post(http_submit_lead))
        .route("/leads/resend", post(http_resend_confirmation))
        .route("/leads/confirm", get(http_confirm_lead))
        .route("/v1/healthz", get(healthz))
        .fallback(api_not_found);

    let mut app = Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", api);

    let static_root = Path::new(&settings.static_dir);
    if static_root.is_dir() {
        let index = static_root.join("index.html");
        app = app.fallback_service(ServeDir::new(static_root).fallback(ServeFile::new(index)));
    } else {
        info!(static_dir = %settings.static_dir, "static directory missing; serving the API only");
    }

    app.layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&settings.cors_origins))
        .with_state(state)
}

fn cors_layer(raw_origins: &str) -> CorsLayer {
    let origins: Vec<HeaderValue> = parse_cors_origins(raw_origins)
        .into_iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn api_not_found() -> (StatusCode, Json<ApiError>) {
    (StatusCode::NOT_FOUND, Json(ApiError::new("Not found")))
}

async fn http_landing_config(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ApiError>)> {
    let config = fetch_landing_config(&state.api).await.map_err(|error| {
        warn!(%error, "landing config fetch failed");
        (
            error.upstream_status().unwrap_or(StatusCode::BAD_GATEWAY),
            Json(ApiError::new("Failed to fetch landing config")),
        )
    })?;
    Ok(Json(config))
}

async fn http_submit_lead(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Json(mut req): Json<LeadSubmitRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), (StatusCode, Json<ApiError>)> {
    validate_name(&req.name)?;
    validate_email(&req.email)?;
    if req.source_url.as_deref().map_or(true, str::is_empty) {
        req.source_url = request_page_url(state.public_url.as_deref(), &headers, &uri);
    }

    let reply = forward_lead_submit(&state.api, &req).await.map_err(|error| {
        warn!(%error, "lead submission forward failed");
        (
            StatusCode::BAD_GATEWAY,
            Json(ApiError::new("Lead service unavailable")),
        )
    })?;
    Ok((reply.status, Json(reply.body)))
}

async fn http_resend_confirmation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LeadResendRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), (StatusCode, Json<ApiError>)> {
    validate_email(&req.email)?;

    let reply = forward_resend_confirmation(&state.api, &req)
        .await
        .map_err(|error| {
            warn!(%error, "resend confirmation forward failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ApiError::new("Lead service unavailable")),
            )
        })?;
    Ok((reply.status, Json(reply.body)))
}

async fn http_confirm_lead(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ConfirmQuery>,
) -> Result<(StatusCode, Json<serde_json::Value>), (StatusCode, Json<ApiError>)> {
    let token = q.token.unwrap_or_default();
    if token.chars().count() < MIN_CONFIRM_TOKEN_CHARS {
        return Err(validation_error(format!(
            "token must be at least {MIN_CONFIRM_TOKEN_CHARS} characters"
        )));
    }

    let reply = forward_lead_confirm(&state.api, &token)
        .await
        .map_err(|error| {
            warn!(%error, "lead confirmation forward failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ApiError::new("Lead service unavailable")),
            )
        })?;
    Ok((reply.status, Json(reply.body)))
}

fn validate_name(name: &str) -> Result<(), (StatusCode, Json<ApiError>)> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(validation_error("name must not be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(validation_error(format!(
            "name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), (StatusCode, Json<ApiError>)> {
    if !looks_like_email(email) {
        return Err(validation_error("invalid email address"));
    }
    Ok(())
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

fn validation_error(detail: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(ApiError::new(detail)))
}

/// Page URL recorded on leads that arrive without one. The configured public
/// URL wins over the Host header, which carries no scheme.
fn request_page_url(public_url: Option<&str>, headers: &HeaderMap, uri: &Uri) -> Option<String> {
    if let Some(base) = public_url {
        return Some(format!("{}{uri}", base.trim_end_matches('/')));
    }
    let host = headers.get(header::HOST)?.to_str().ok()?;
    Some(format!("http://{host}{uri}"))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
