use std::collections::VecDeque;
use std::time::Duration;

use mcphub_api::*;
use tracing::debug;

use crate::error::{ApiError, Result};
use crate::sse::{SseDecoder, SseEvent};

/// Typed HTTP client for the dashboard API.
///
/// The dashboard session is a cookie set by `/api/login`; the underlying
/// `reqwest::Client` keeps it in its cookie store, so every method after a
/// successful [`ApiClient::login`] is authenticated.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Option<Duration>,
}

impl ApiClient {
    /// Create a new client with its own cookie store.
    ///
    /// `request_timeout` bounds every call except the rebuild stream. `None`
    /// leaves requests unbounded.
    pub fn new(base_url: &str, request_timeout: Option<Duration>) -> Result<Self> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout,
        })
    }

    /// Create from an existing `reqwest::Client` (e.g. shared in tests).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Access the underlying `reqwest::Client`.
    pub fn reqwest_client(&self) -> &reqwest::Client {
        &self.client
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn app_path(prefix: &str, name: &str, suffix: &str) -> String {
        format!("{prefix}/{}{suffix}", urlencoding::encode(name))
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.bounded(self.client.get(self.url(path)))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.bounded(self.client.post(self.url(path)))
    }

    fn bounded(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.request_timeout {
            Some(timeout) => req.timeout(timeout),
            None => req,
        }
    }

    // ── Session ───────────────────────────────────────────────────────────

    /// `true` when the session cookie is still accepted.
    pub async fn auth_check(&self) -> Result<bool> {
        let resp = self.get("/auth/check").send().await?;
        Ok(resp.status().is_success())
    }

    /// Submit the dashboard password. A wrong password is not an error: the
    /// body simply lacks `status: "ok"`.
    pub async fn login(&self, password: &str) -> Result<LoginResponse> {
        let resp = self
            .post("/login")
            .json(&LoginRequest {
                password: password.to_string(),
            })
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        match serde_json::from_str::<LoginResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(ApiError::Status { status, body }),
            Err(e) => Err(ApiError::Decode(format!("login response: {e}"))),
        }
    }

    pub async fn logout(&self) -> Result<()> {
        let resp = self.post("/logout").send().await?;
        debug!("logout answered {}", resp.status());
        Ok(())
    }

    // ── Roster ────────────────────────────────────────────────────────────

    pub async fn list_apps(&self) -> Result<Vec<AppSummary>> {
        let resp = self.get("/apps").send().await?;
        parse_response(resp).await
    }

    // ── App actions ───────────────────────────────────────────────────────

    pub async fn deploy(&self, name: &str) -> Result<ActionResponse> {
        self.action("/deploy", name).await
    }

    pub async fn stop(&self, name: &str) -> Result<ActionResponse> {
        self.action("/stop", name).await
    }

    pub async fn delete(&self, name: &str) -> Result<ActionResponse> {
        self.action("/delete", name).await
    }

    pub async fn create(&self, name: &str) -> Result<ActionResponse> {
        self.action("/create", name).await
    }

    async fn action(&self, prefix: &str, name: &str) -> Result<ActionResponse> {
        let resp = self.post(&Self::app_path(prefix, name, "")).send().await?;
        parse_action(resp).await
    }

    // ── Logs / credentials ────────────────────────────────────────────────

    /// Recent container output as plain text.
    pub async fn logs(&self, name: &str) -> Result<String> {
        let resp = self.get(&Self::app_path("/logs", name, "")).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }
        Ok(resp.text().await?)
    }

    pub async fn password(&self, name: &str) -> Result<PasswordResponse> {
        let resp = self.get(&Self::app_path("/password", name, "")).send().await?;
        parse_response(resp).await
    }

    pub async fn reset_password(&self, name: &str) -> Result<PasswordResponse> {
        let resp = self
            .post(&Self::app_path("/password", name, "/reset"))
            .send()
            .await?;
        parse_response(resp).await
    }

    // ── Auth config ───────────────────────────────────────────────────────

    pub async fn auth_config(&self, name: &str) -> Result<AuthConfigResponse> {
        let resp = self.get(&Self::app_path("/apps", name, "/auth")).send().await?;
        parse_response(resp).await
    }

    pub async fn set_auth_config(&self, name: &str, config: &AuthConfig) -> Result<ActionResponse> {
        let resp = self
            .post(&Self::app_path("/apps", name, "/auth"))
            .json(config)
            .send()
            .await?;
        parse_action(resp).await
    }

    // ── Rebuild stream ────────────────────────────────────────────────────

    /// Open the server-push rebuild stream for `name`. The request timeout is
    /// never applied here; dropping the returned stream closes the connection.
    pub async fn rebuild(&self, name: &str) -> Result<RebuildStream> {
        let resp = self
            .client
            .get(self.url(&Self::app_path("/rebuild", name, "")))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }
        Ok(RebuildStream::new(resp))
    }
}

/// An open rebuild event stream.
pub struct RebuildStream {
    response: reqwest::Response,
    decoder: SseDecoder,
    pending: VecDeque<SseEvent>,
}

impl RebuildStream {
    fn new(response: reqwest::Response) -> Self {
        Self {
            response,
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
        }
    }

    /// Next event in arrival order; `Ok(None)` once the server closes the body.
    pub async fn next_event(&mut self) -> Result<Option<SseEvent>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            match self.response.chunk().await {
                Ok(Some(bytes)) => self.pending.extend(self.decoder.push(&bytes)),
                Ok(None) => return Ok(None),
                Err(e) => return Err(ApiError::Stream(e.to_string())),
            }
        }
    }
}

/// Parse an HTTP response: return the deserialized body on 2xx,
/// or an error containing the status and body text.
async fn parse_response<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Status { status, body });
    }
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Actions succeed on any 2xx; an unparseable body is treated as empty.
async fn parse_action(resp: reqwest::Response) -> Result<ActionResponse> {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(ApiError::Status { status, body });
    }
    Ok(serde_json::from_str(&body).unwrap_or_default())
}
