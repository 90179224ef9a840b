//! Scripted in-memory [`Backend`] for tests.
//!
//! Available to other crates with the `testing` feature.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use mcphub_api::{
    ActionResponse, AppSummary, AuthConfig, AuthType, PasswordResponse, REBUILD_DONE_EVENT,
    StoredAuthConfig,
};
use mcphub_api_client::SseEvent;
use tokio::sync::mpsc;

use crate::actions::AppAction;
use crate::backend::{Backend, BuildFeed};
use crate::dashboard::Dashboard;
use crate::error::BackendError;

const WAIT_STEP: Duration = Duration::from_millis(1);
const WAIT_LIMIT: usize = 2_000;

/// Apply completions until none arrives for 50ms.
pub async fn settle<B: Backend>(dash: &mut Dashboard<B>) {
    while let Ok(true) = tokio::time::timeout(Duration::from_millis(50), dash.next_event()).await {}
}

#[derive(Default)]
struct FakeState {
    password: String,
    session_valid: bool,
    unreachable: bool,
    apps: Vec<AppSummary>,
    logs: HashMap<String, String>,
    passwords: HashMap<String, String>,
    auth: HashMap<String, StoredAuthConfig>,
    action_error: Option<BackendError>,
    roster_delay: Option<Duration>,
    roster_in_flight: usize,
    max_roster_in_flight: usize,
    resets: u32,
    calls: Vec<String>,
    feeds: Vec<(String, FeedControl)>,
}

pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new(password: &str) -> Self {
        Self {
            state: Mutex::new(FakeState {
                password: password.to_string(),
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a call and fail it if the backend is marked unreachable.
    fn enter(&self, call: String) -> Result<MutexGuard<'_, FakeState>, BackendError> {
        let mut state = self.state();
        state.calls.push(call);
        if state.unreachable {
            return Err(BackendError::Unreachable("connection refused".to_string()));
        }
        Ok(state)
    }

    // ── Scripting ─────────────────────────────────────────────────────────

    pub fn with_app(self, name: &str, status: &str) -> Self {
        self.state().apps.push(AppSummary {
            name: name.to_string(),
            status: status.to_string(),
            auth_type: AuthType::None,
        });
        self
    }

    pub fn with_logs(self, app: &str, text: &str) -> Self {
        self.set_logs(app, text);
        self
    }

    pub fn with_password(self, app: &str, password: &str) -> Self {
        self.state()
            .passwords
            .insert(app.to_string(), password.to_string());
        self
    }

    pub fn set_logs(&self, app: &str, text: &str) {
        self.state().logs.insert(app.to_string(), text.to_string());
    }

    pub fn set_session_valid(&self, valid: bool) {
        self.state().session_valid = valid;
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.state().unreachable = unreachable;
    }

    pub fn set_action_error(&self, error: Option<BackendError>) {
        self.state().action_error = error;
    }

    pub fn set_roster_delay(&self, delay: Option<Duration>) {
        self.state().roster_delay = delay;
    }

    pub fn set_app_status(&self, app: &str, status: &str) {
        if let Some(entry) = self.state().apps.iter_mut().find(|a| a.name == app) {
            entry.status = status.to_string();
        }
    }

    // ── Inspection ────────────────────────────────────────────────────────

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Calls equal to `call` or starting with `"{call} "`.
    pub fn call_count(&self, call: &str) -> usize {
        let prefix = format!("{call} ");
        self.state()
            .calls
            .iter()
            .filter(|c| *c == call || c.starts_with(&prefix))
            .count()
    }

    pub fn max_roster_in_flight(&self) -> usize {
        self.state().max_roster_in_flight
    }

    pub fn stored_auth(&self, app: &str) -> Option<StoredAuthConfig> {
        self.state().auth.get(app).cloned()
    }

    /// The `nth` (1-based) rebuild stream opened for `app`. Panics if it does
    /// not open within two seconds.
    pub async fn wait_for_feed(&self, app: &str, nth: usize) -> FeedControl {
        for _ in 0..WAIT_LIMIT {
            let found = self
                .state()
                .feeds
                .iter()
                .filter(|(name, _)| name == app)
                .nth(nth - 1)
                .map(|(_, control)| control.clone());
            if let Some(control) = found {
                return control;
            }
            tokio::time::sleep(WAIT_STEP).await;
        }
        panic!("rebuild stream #{nth} for {app} was never opened");
    }
}

impl Backend for FakeBackend {
    type Feed = FakeFeed;

    async fn check_session(&self) -> Result<bool, BackendError> {
        Ok(self.enter("check_session".into())?.session_valid)
    }

    async fn login(&self, password: &str) -> Result<bool, BackendError> {
        let mut state = self.enter("login".into())?;
        if state.password == password {
            state.session_valid = true;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn logout(&self) -> Result<(), BackendError> {
        self.enter("logout".into())?.session_valid = false;
        Ok(())
    }

    async fn list_apps(&self) -> Result<Vec<AppSummary>, BackendError> {
        let delay = {
            let mut state = self.enter("list_apps".into())?;
            if !state.session_valid {
                return Err(BackendError::Unauthorized);
            }
            state.roster_in_flight += 1;
            state.max_roster_in_flight = state.max_roster_in_flight.max(state.roster_in_flight);
            state.roster_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state();
        state.roster_in_flight -= 1;
        Ok(state.apps.clone())
    }

    async fn run_action(&self, action: AppAction, app: &str) -> Result<ActionResponse, BackendError> {
        let mut state = self.enter(format!("{action} {app}"))?;
        if let Some(error) = state.action_error.clone() {
            return Err(error);
        }
        let known = state.apps.iter().any(|a| a.name == app);
        let error = match action {
            AppAction::Create if known => Some("App already exists"),
            AppAction::Create => {
                state.apps.push(AppSummary {
                    name: app.to_string(),
                    status: "Not Started".to_string(),
                    auth_type: AuthType::None,
                });
                None
            }
            _ if !known => Some("App not found"),
            AppAction::Deploy => {
                set_status(&mut state.apps, app, "Up 1 second");
                None
            }
            AppAction::Stop => {
                set_status(&mut state.apps, app, "Exited (0) 1 second ago");
                None
            }
            AppAction::Delete => {
                state.apps.retain(|a| a.name != app);
                None
            }
        };
        Ok(ActionResponse {
            status: error.is_none().then(|| "ok".to_string()),
            error: error.map(str::to_string),
        })
    }

    async fn logs(&self, app: &str) -> Result<String, BackendError> {
        let state = self.enter(format!("logs {app}"))?;
        state.logs.get(app).cloned().ok_or(BackendError::Rejected {
            status: 404,
            message: "No logs".to_string(),
        })
    }

    async fn password(&self, app: &str) -> Result<PasswordResponse, BackendError> {
        let state = self.enter(format!("password {app}"))?;
        let running = state.apps.iter().any(|a| a.name == app && a.is_running());
        Ok(match state.passwords.get(app) {
            Some(password) if running => PasswordResponse {
                password: Some(password.clone()),
                error: None,
            },
            _ => PasswordResponse {
                password: None,
                error: Some("Container not running or config not found".to_string()),
            },
        })
    }

    async fn reset_password(&self, app: &str) -> Result<PasswordResponse, BackendError> {
        let mut state = self.enter(format!("reset_password {app}"))?;
        state.resets += 1;
        let password = format!("reset-{}", state.resets);
        state.passwords.insert(app.to_string(), password.clone());
        Ok(PasswordResponse {
            password: Some(password),
            error: None,
        })
    }

    async fn auth_config(&self, app: &str) -> Result<StoredAuthConfig, BackendError> {
        let state = self.enter(format!("auth_config {app}"))?;
        Ok(state.auth.get(app).cloned().unwrap_or_default())
    }

    async fn save_auth_config(
        &self,
        app: &str,
        config: &AuthConfig,
    ) -> Result<ActionResponse, BackendError> {
        let mut state = self.enter(format!("save_auth_config {app}"))?;
        let stored = match config {
            AuthConfig::None => StoredAuthConfig::default(),
            AuthConfig::ApiKey { api_key } => StoredAuthConfig {
                auth_type: AuthType::ApiKey,
                api_key: Some(api_key.clone()),
                ..Default::default()
            },
            AuthConfig::EntraId {
                tenant_id,
                client_id,
            } => StoredAuthConfig {
                auth_type: AuthType::EntraId,
                tenant_id: Some(tenant_id.clone()),
                client_id: Some(client_id.clone()),
                ..Default::default()
            },
        };
        if let Some(entry) = state.apps.iter_mut().find(|a| a.name == app) {
            entry.auth_type = stored.auth_type;
        }
        state.auth.insert(app.to_string(), stored);
        Ok(ActionResponse {
            status: Some("ok".to_string()),
            error: None,
        })
    }

    async fn open_rebuild(&self, app: &str) -> Result<FakeFeed, BackendError> {
        let mut state = self.enter(format!("rebuild {app}"))?;
        let (tx, rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        let control = FeedControl {
            tx: Arc::new(Mutex::new(Some(tx))),
            closed: Arc::clone(&closed),
        };
        state.feeds.push((app.to_string(), control));
        Ok(FakeFeed { rx, closed })
    }
}

fn set_status(apps: &mut [AppSummary], app: &str, status: &str) {
    if let Some(entry) = apps.iter_mut().find(|a| a.name == app) {
        entry.status = status.to_string();
    }
}

enum FeedItem {
    Event(SseEvent),
    Error(String),
}

/// Server side of a scripted rebuild stream.
#[derive(Clone)]
pub struct FeedControl {
    tx: Arc<Mutex<Option<mpsc::UnboundedSender<FeedItem>>>>,
    closed: Arc<AtomicBool>,
}

impl FeedControl {
    fn push(&self, item: FeedItem) {
        if let Some(tx) = self.tx.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            let _ = tx.send(item);
        }
    }

    pub fn line(&self, data: &str) {
        self.push(FeedItem::Event(SseEvent::message(data)));
    }

    pub fn done(&self, payload: &str) {
        self.push(FeedItem::Event(SseEvent::named(REBUILD_DONE_EVENT, payload)));
    }

    /// Fail the transport mid-stream.
    pub fn fail(&self, reason: &str) {
        self.push(FeedItem::Error(reason.to_string()));
    }

    /// Close the body without a `done` event.
    pub fn hang_up(&self) {
        self.tx.lock().unwrap_or_else(|e| e.into_inner()).take();
    }

    /// The client side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Panics if the client does not close within two seconds.
    pub async fn wait_closed(&self) {
        for _ in 0..WAIT_LIMIT {
            if self.is_closed() {
                return;
            }
            tokio::time::sleep(WAIT_STEP).await;
        }
        panic!("rebuild stream was never closed");
    }
}

/// Client side of a scripted rebuild stream.
pub struct FakeFeed {
    rx: mpsc::UnboundedReceiver<FeedItem>,
    closed: Arc<AtomicBool>,
}

impl BuildFeed for FakeFeed {
    async fn recv(&mut self) -> Result<Option<SseEvent>, BackendError> {
        match self.rx.recv().await {
            Some(FeedItem::Event(event)) => Ok(Some(event)),
            Some(FeedItem::Error(reason)) => Err(BackendError::Unreachable(reason)),
            None => Ok(None),
        }
    }
}

impl Drop for FakeFeed {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
