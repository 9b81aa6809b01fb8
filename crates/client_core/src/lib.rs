use std::sync::Arc;

use reqwest::{Client, StatusCode};
use shared::{
    domain::{LandingConfig, LandingConfigPatch},
    protocol::{LeadReply, LeadResendRequest, LeadSubmitRequest},
};
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

const SUBMIT_ACCEPTED_FALLBACK: &str = "Submission accepted. Check your email to confirm.";
const SUBMIT_REJECTED_FALLBACK: &str = "Submission failed.";
const SUBMIT_NETWORK_FAILURE: &str = "Submission failed due to a network error.";
const RESEND_FAILURE: &str = "Could not resend confirmation. Try again in a minute.";
const RESEND_ACCEPTED_FALLBACK: &str = "If found, a confirmation email was sent.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    Idle,
    Submitting,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmState {
    Idle,
    Loading,
    Confirmed,
    Error,
}

impl ConfirmState {
    /// Banner text shown for the state; `Idle` renders nothing.
    pub fn banner(self) -> Option<&'static str> {
        match self {
            ConfirmState::Idle => None,
            ConfirmState::Loading => Some("Confirming your request..."),
            ConfirmState::Confirmed => Some("You are confirmed. We will follow up shortly."),
            ConfirmState::Error => {
                Some("Confirmation failed. Please request another confirmation email.")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadForm {
    pub name: String,
    pub email: String,
    pub company: String,
    pub message: String,
    /// Honeypot. Real users never see the input, so a non-empty value marks
    /// a bot submission for the backend.
    pub website: String,
}

impl LeadForm {
    fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadField {
    Name,
    Email,
    Company,
    Message,
    Website,
}

struct SubmissionState {
    status: SubmissionStatus,
    message: String,
}

#[derive(Default)]
struct ResendState {
    email: String,
    message: String,
}

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    ConfigLoaded(LandingConfig),
    ConfirmationChanged(ConfirmState),
    SubmissionChanged {
        status: SubmissionStatus,
        message: String,
    },
    ResendMessageChanged(String),
}

#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub config: LandingConfig,
    pub form: LeadForm,
    pub submission_status: SubmissionStatus,
    pub submission_message: String,
    pub confirmation: ConfirmState,
    pub resend_email: String,
    pub resend_message: String,
}

/// Client-side state machine for one landing page view.
///
/// Each flow (config load, confirmation check, lead submission, resend) owns
/// its own state cell, so the flows never contend on a common lock. Every
/// async operation derives a child of the lifecycle token and re-checks it
/// after each await; once `close` cancels the lifecycle, late resolutions
/// return without touching state.
pub struct LandingController {
    http: Client,
    gateway_url: String,
    page_url: String,
    config: Mutex<LandingConfig>,
    form: Mutex<LeadForm>,
    submission: Mutex<SubmissionState>,
    confirmation: Mutex<ConfirmState>,
    resend: Mutex<ResendState>,
    events: broadcast::Sender<ControllerEvent>,
    lifecycle: CancellationToken,
}

impl LandingController {
    pub fn new(gateway_url: impl Into<String>, page_url: impl Into<String>) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            http: Client::new(),
            gateway_url: gateway_url.into(),
            page_url: page_url.into(),
            config: Mutex::new(LandingConfig::default()),
            form: Mutex::new(LeadForm::default()),
            submission: Mutex::new(SubmissionState {
                status: SubmissionStatus::Idle,
                message: String::new(),
            }),
            confirmation: Mutex::new(ConfirmState::Idle),
            resend: Mutex::new(ResendState::default()),
            events,
            lifecycle: CancellationToken::new(),
        })
    }

    /// Spawns the page-load work: the config fetch and, when the page URL
    /// carries a `confirm` token, the confirmation check.
    pub fn mount(self: &Arc<Self>) {
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.load_config().await });
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.check_confirmation().await });
    }

    pub async fn load_config(&self) {
        let op = self.lifecycle.child_token();
        if op.is_cancelled() {
            return;
        }
        let fetched = tokio::select! {
            _ = op.cancelled() => return,
            result = self.fetch_config_patch() => result,
        };
        let patch = match fetched {
            Ok(patch) => patch,
            Err(error) => {
                debug!(%error, "landing config fetch failed; keeping defaults");
                return;
            }
        };
        if op.is_cancelled() {
            return;
        }
        let merged = {
            let mut config = self.config.lock().await;
            config.apply(patch);
            config.clone()
        };
        let _ = self.events.send(ControllerEvent::ConfigLoaded(merged));
    }

    async fn fetch_config_patch(&self) -> Result<LandingConfigPatch, reqwest::Error> {
        self.http
            .get(format!("{}/api/landing-config", self.gateway_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    pub async fn check_confirmation(&self) {
        let Some(token) = confirm_token(&self.page_url) else {
            return;
        };
        let op = self.lifecycle.child_token();
        if op.is_cancelled() {
            return;
        }
        {
            let mut state = self.confirmation.lock().await;
            if *state != ConfirmState::Idle {
                return;
            }
            *state = ConfirmState::Loading;
        }
        let _ = self
            .events
            .send(ControllerEvent::ConfirmationChanged(ConfirmState::Loading));

        let outcome = tokio::select! {
            _ = op.cancelled() => return,
            result = self.fetch_confirmation(&token) => result,
        };
        let next = match outcome {
            Ok(()) => ConfirmState::Confirmed,
            Err(error) => {
                warn!(%error, "lead confirmation failed");
                ConfirmState::Error
            }
        };
        if op.is_cancelled() {
            return;
        }
        *self.confirmation.lock().await = next;
        let _ = self.events.send(ControllerEvent::ConfirmationChanged(next));
    }

    async fn fetch_confirmation(&self, token: &str) -> Result<(), reqwest::Error> {
        self.http
            .get(format!("{}/api/leads/confirm", self.gateway_url))
            .query(&[("token", token)])
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;
        Ok(())
    }

    /// Submits the current form. Inert while a submission is already in
    /// flight; the `Submitting` status doubles as the disabled state for the
    /// submit control.
    pub async fn submit_lead(&self) {
        let op = self.lifecycle.child_token();
        if op.is_cancelled() {
            return;
        }
        {
            let mut submission = self.submission.lock().await;
            if submission.status == SubmissionStatus::Submitting {
                return;
            }
            submission.status = SubmissionStatus::Submitting;
            submission.message.clear();
        }
        let _ = self.events.send(ControllerEvent::SubmissionChanged {
            status: SubmissionStatus::Submitting,
            message: String::new(),
        });

        let request = {
            let form = self.form.lock().await;
            LeadSubmitRequest {
                name: form.name.clone(),
                email: form.email.clone(),
                company: Some(form.company.clone()),
                message: Some(form.message.clone()),
                website: Some(form.website.clone()),
                source_url: Some(self.page_url.clone()),
            }
        };

        let posted = tokio::select! {
            _ = op.cancelled() => return,
            result = self.post_lead(&request) => result,
        };
        if op.is_cancelled() {
            return;
        }

        match posted {
            Ok((status, reply)) if status.is_success() => {
                let message = reply
                    .message
                    .unwrap_or_else(|| SUBMIT_ACCEPTED_FALLBACK.to_string());
                self.form.lock().await.clear();
                {
                    let mut resend = self.resend.lock().await;
                    if resend.email.is_empty() {
                        resend.email = request.email.clone();
                    }
                }
                self.finish_submission(SubmissionStatus::Success, message)
                    .await;
            }
            Ok((_, reply)) => {
                let message = reply
                    .detail
                    .or(reply.message)
                    .unwrap_or_else(|| SUBMIT_REJECTED_FALLBACK.to_string());
                self.finish_submission(SubmissionStatus::Error, message).await;
            }
            Err(error) => {
                warn!(%error, "lead submission failed before a response arrived");
                self.finish_submission(SubmissionStatus::Error, SUBMIT_NETWORK_FAILURE.to_string())
                    .await;
            }
        }
    }

    async fn finish_submission(&self, status: SubmissionStatus, message: String) {
        {
            let mut submission = self.submission.lock().await;
            submission.status = status;
            submission.message = message.clone();
        }
        let _ = self
            .events
            .send(ControllerEvent::SubmissionChanged { status, message });
    }

    async fn post_lead(
        &self,
        request: &LeadSubmitRequest,
    ) -> Result<(StatusCode, LeadReply), reqwest::Error> {
        let response = self
            .http
            .post(format!("{}/api/leads/submit", self.gateway_url))
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let reply = response.json::<LeadReply>().await.unwrap_or_default();
        Ok((status, reply))
    }

    /// Resends the confirmation email for the resend address. No-op while the
    /// address is empty: no request and no message change.
    pub async fn resend_confirmation(&self) {
        let op = self.lifecycle.child_token();
        if op.is_cancelled() {
            return;
        }
        let email = {
            let mut resend = self.resend.lock().await;
            if resend.email.is_empty() {
                return;
            }
            resend.message.clear();
            resend.email.clone()
        };

        let request = LeadResendRequest { email };
        let posted = tokio::select! {
            _ = op.cancelled() => return,
            result = self.post_resend(&request) => result,
        };
        if op.is_cancelled() {
            return;
        }

        let message = match posted {
            Ok((status, reply)) if status.is_success() => reply
                .message
                .unwrap_or_else(|| RESEND_ACCEPTED_FALLBACK.to_string()),
            Ok(_) => RESEND_FAILURE.to_string(),
            Err(error) => {
                warn!(%error, "resend confirmation request failed");
                RESEND_FAILURE.to_string()
            }
        };
        self.resend.lock().await.message = message.clone();
        let _ = self.events.send(ControllerEvent::ResendMessageChanged(message));
    }

    async fn post_resend(
        &self,
        request: &LeadResendRequest,
    ) -> Result<(StatusCode, LeadReply), reqwest::Error> {
        let response = self
            .http
            .post(format!("{}/api/leads/resend", self.gateway_url))
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let reply = response.json::<LeadReply>().await.unwrap_or_default();
        Ok((status, reply))
    }

    pub async fn set_field(&self, field: LeadField, value: impl Into<String>) {
        let value = value.into();
        let mut form = self.form.lock().await;
        match field {
            LeadField::Name => form.name = value,
            LeadField::Email => form.email = value,
            LeadField::Company => form.company = value,
            LeadField::Message => form.message = value,
            LeadField::Website => form.website = value,
        }
    }

    pub async fn set_resend_email(&self, value: impl Into<String>) {
        self.resend.lock().await.email = value.into();
    }

    pub async fn snapshot(&self) -> PageSnapshot {
        let config = self.config.lock().await.clone();
        let form = self.form.lock().await.clone();
        let (submission_status, submission_message) = {
            let submission = self.submission.lock().await;
            (submission.status, submission.message.clone())
        };
        let confirmation = *self.confirmation.lock().await;
        let (resend_email, resend_message) = {
            let resend = self.resend.lock().await;
            (resend.email.clone(), resend.message.clone())
        };
        PageSnapshot {
            config,
            form,
            submission_status,
            submission_message,
            confirmation,
            resend_email,
            resend_message,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    /// Marks the page view as torn down. Operations already in flight observe
    /// the cancelled token and return without touching state.
    pub fn close(&self) {
        self.lifecycle.cancel();
    }
}

fn confirm_token(page_url: &str) -> Option<String> {
    let url = Url::parse(page_url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "confirm")
        .map(|(_, value)| value.into_owned())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
