use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use shared::protocol::{LeadResendRequest, LeadSubmitRequest};
use thiserror::Error;
use tracing::debug;

const CONFIG_TIMEOUT: Duration = Duration::from_secs(10);
const LEAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Shared handle the HTTP handlers use to reach the lead service.
#[derive(Clone)]
pub struct ApiContext {
    pub upstream: UpstreamClient,
}

/// Failure reaching the lead service, or a refusal it reported before a
/// usable body arrived.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct UpstreamError(#[from] reqwest::Error);

impl UpstreamError {
    /// Status the lead service answered with, when it answered at all.
    pub fn upstream_status(&self) -> Option<StatusCode> {
        self.0.status()
    }
}

/// Verbatim answer from the lead service: its status plus whatever JSON body
/// came back, degraded to `{}` when the body does not parse.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: Value,
}

#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    base_url: String,
    slug: String,
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            slug: slug.into(),
        }
    }
}

pub async fn fetch_landing_config(ctx: &ApiContext) -> Result<Value, UpstreamError> {
    let upstream = &ctx.upstream;
    debug!(slug = %upstream.slug, "fetching landing config from lead service");
    let config = upstream
        .http
        .get(format!(
            "{}/public/funnels/{}/landing-config",
            upstream.base_url, upstream.slug
        ))
        .timeout(CONFIG_TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(config)
}

pub async fn forward_lead_submit(
    ctx: &ApiContext,
    request: &LeadSubmitRequest,
) -> Result<UpstreamReply, UpstreamError> {
    let upstream = &ctx.upstream;
    let response = upstream
        .http
        .post(format!(
            "{}/public/funnels/{}/leads",
            upstream.base_url, upstream.slug
        ))
        .timeout(LEAD_TIMEOUT)
        .json(request)
        .send()
        .await?;
    Ok(reply_from(response).await)
}

pub async fn forward_resend_confirmation(
    ctx: &ApiContext,
    request: &LeadResendRequest,
) -> Result<UpstreamReply, UpstreamError> {
    let upstream = &ctx.upstream;
    let response = upstream
        .http
        .post(format!(
            "{}/public/funnels/{}/leads/resend-confirmation",
            upstream.base_url, upstream.slug
        ))
        .timeout(LEAD_TIMEOUT)
        .json(request)
        .send()
        .await?;
    Ok(reply_from(response).await)
}

/// Confirmation tokens are global, so this is the one lead route that is not
/// scoped under the funnel slug.
pub async fn forward_lead_confirm(
    ctx: &ApiContext,
    token: &str,
) -> Result<UpstreamReply, UpstreamError> {
    let upstream = &ctx.upstream;
    let response = upstream
        .http
        .get(format!("{}/public/leads/confirm", upstream.base_url))
        .query(&[("token", token)])
        .timeout(LEAD_TIMEOUT)
        .send()
        .await?;
    Ok(reply_from(response).await)
}

async fn reply_from(response: reqwest::Response) -> UpstreamReply {
    let status = response.status();
    let body = response
        .json::<Value>()
        .await
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
    UpstreamReply { status, body }
}
