use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use mcphub_api::{DEFAULT_IDE_PORT, PasswordResponse};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::actions::{AppAction, ConfirmAction, CreateDialog, DUPLICATE_NAME_MESSAGE, Notice};
use crate::auth_editor::{self, AuthConfigDraft, AuthEditor};
use crate::backend::Backend;
use crate::error::BackendError;
use crate::events::{DashEvent, EventReceiver, EventSender};
use crate::rebuild::{self, RebuildController, RebuildEffect, RebuildOutcome};
use crate::reveal::{RevealKind, RevealStore, Revealed, Toggle};
use crate::roster::{self, Roster};
use crate::session::{SessionGate, SessionState};

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub server_url: String,
    pub poll_interval: Duration,
    pub ide_port: u16,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8081".to_string(),
            poll_interval: Duration::from_secs(5),
            ide_port: DEFAULT_IDE_PORT,
        }
    }
}

/// Owner of all dashboard state.
///
/// Operations start background work on the current tokio runtime and return
/// immediately. Completions come back through an internal channel and are
/// applied by [`Dashboard::drain`] or [`Dashboard::next_event`], so state is
/// only ever mutated by the task that owns the dashboard.
pub struct Dashboard<B: Backend> {
    backend: Arc<B>,
    options: DashboardOptions,
    tx: EventSender,
    rx: EventReceiver,
    session: SessionGate,
    roster: Roster,
    logs: RevealStore,
    passwords: RevealStore,
    auth_editor: AuthEditor,
    rebuild: RebuildController,
    in_flight: usize,
    create: Option<CreateDialog>,
    confirm: Option<ConfirmAction>,
    notice: Option<Notice>,
}

impl<B: Backend> Dashboard<B> {
    pub fn new(backend: Arc<B>, options: DashboardOptions) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            backend,
            options,
            tx,
            rx,
            session: SessionGate::new(),
            roster: Roster::default(),
            logs: RevealStore::new(RevealKind::Logs),
            passwords: RevealStore::new(RevealKind::Password),
            auth_editor: AuthEditor::default(),
            rebuild: RebuildController::default(),
            in_flight: 0,
            create: None,
            confirm: None,
            notice: None,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn options(&self) -> &DashboardOptions {
        &self.options
    }

    pub fn session(&self) -> &SessionGate {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn logs(&self) -> &RevealStore {
        &self.logs
    }

    pub fn passwords(&self) -> &RevealStore {
        &self.passwords
    }

    pub fn auth_editor(&self) -> &AuthEditor {
        &self.auth_editor
    }

    pub fn rebuild(&self) -> &RebuildController {
        &self.rebuild
    }

    /// A roster mutation is in flight; every other mutation is refused.
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    pub fn create_dialog(&self) -> Option<&CreateDialog> {
        self.create.as_ref()
    }

    pub fn pending_confirm(&self) -> Option<&ConfirmAction> {
        self.confirm.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    fn reveals_mut(&mut self, kind: RevealKind) -> &mut RevealStore {
        match kind {
            RevealKind::Logs => &mut self.logs,
            RevealKind::Password => &mut self.passwords,
        }
    }

    // ── Event plumbing ────────────────────────────────────────────────────

    fn spawn<F>(&self, work: F)
    where
        F: Future<Output = DashEvent> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(work.await);
        });
    }

    /// Apply every completion that has already arrived. Returns how many.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Wait for the next completion and apply it.
    pub async fn next_event(&mut self) -> bool {
        match self.rx.recv().await {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    pub fn apply(&mut self, event: DashEvent) {
        match event {
            DashEvent::SessionChecked(result) => {
                if self.session.is_authenticated() {
                    return;
                }
                if self.session.finish_check(result) == SessionState::Authenticated {
                    info!("existing dashboard session is valid");
                    self.enter_signed_in();
                }
            }
            DashEvent::LoginFinished(result) => {
                if self.session.finish_login(result) {
                    self.enter_signed_in();
                }
            }
            DashEvent::RosterFetched { seq, result } => self.apply_roster(seq, result),
            DashEvent::ActionFinished {
                action,
                app,
                result,
            } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                if !self.session.is_authenticated() {
                    debug!(%action, %app, "dropping action result after sign-out");
                    return;
                }
                match result {
                    Ok(resp) => {
                        if action == AppAction::Delete {
                            self.logs.evict(&app);
                            self.passwords.evict(&app);
                        }
                        if action == AppAction::Create {
                            self.create = None;
                        }
                        self.notice = Some(match resp.error {
                            Some(error) => Notice::warn(format!("{action} {app}: {error}")),
                            None => Notice::info(format!("{action} {app}: ok")),
                        });
                    }
                    Err(e) => {
                        warn!(%action, %app, "request failed: {e}");
                        self.notice = Some(Notice::error(format!("Failed to {action} {app}: {e}")));
                    }
                }
                self.refresh();
            }
            DashEvent::RevealFetched {
                kind,
                app,
                ticket,
                value,
            } => {
                if !self.reveals_mut(kind).resolve(&app, ticket, value) {
                    debug!(?kind, %app, "dropping reveal result for a collapsed entry");
                }
            }
            DashEvent::PasswordReset { app, result } => self.apply_password_reset(app, result),
            DashEvent::AuthConfigLoaded { ticket, result } => {
                self.auth_editor.loaded(ticket, result);
            }
            DashEvent::AuthConfigSaved { ticket, result } => {
                let body_error = result.as_ref().ok().and_then(|r| r.error.clone());
                let app = self.auth_editor.app().unwrap_or_default().to_string();
                if self.auth_editor.saved(ticket, result.map(|_| ())) {
                    self.notice = Some(match body_error {
                        Some(error) => Notice::warn(format!("auth config {app}: {error}")),
                        None => Notice::info(format!("Auth config for {app} saved")),
                    });
                    self.refresh();
                }
            }
            DashEvent::Rebuild { generation, update } => {
                if let RebuildEffect::Finished(_) = self.rebuild.apply(generation, update) {
                    self.refresh();
                }
            }
        }
    }

    fn apply_roster(&mut self, seq: u64, result: Result<Vec<mcphub_api::AppSummary>, BackendError>) {
        if !self.session.is_authenticated() || !self.roster.is_current(seq) {
            return;
        }
        match result {
            Ok(apps) => {
                self.roster.apply(seq, apps);
            }
            Err(BackendError::Unauthorized) => {
                info!("dashboard session expired");
                self.enter_signed_out();
                self.notice = Some(Notice::warn("Session expired. Log in again."));
            }
            Err(e) => warn!("roster refresh failed: {e}"),
        }
    }

    fn apply_password_reset(&mut self, app: String, result: Result<PasswordResponse, BackendError>) {
        if !self.session.is_authenticated() {
            return;
        }
        match result {
            Ok(PasswordResponse {
                password: Some(password),
                ..
            }) => {
                info!(%app, "password reset");
                self.passwords.put(&app, Revealed::Ok(password));
                self.notice = Some(Notice::info(format!("Password for {app} reset")));
            }
            Ok(PasswordResponse { error, .. }) => {
                let error = error.unwrap_or_else(|| "Error".to_string());
                self.notice = Some(Notice::error(format!("Failed to reset password for {app}: {error}")));
            }
            Err(e) => {
                warn!(%app, "password reset failed: {e}");
                self.notice = Some(Notice::error(format!("Failed to reset password for {app}: {e}")));
            }
        }
    }

    // ── Session ───────────────────────────────────────────────────────────

    pub fn check_session(&mut self) {
        let backend = Arc::clone(&self.backend);
        self.spawn(async move { DashEvent::SessionChecked(backend.check_session().await) });
    }

    pub fn set_login_password(&mut self, password: impl Into<String>) {
        self.session.set_password(password);
    }

    /// Submit the typed password. Returns false when nothing was sent.
    pub fn login(&mut self) -> bool {
        let Some(password) = self.session.begin_login() else {
            return false;
        };
        let backend = Arc::clone(&self.backend);
        self.spawn(async move { DashEvent::LoginFinished(backend.login(&password).await) });
        true
    }

    /// Sign out locally right away; the backend call is fire-and-forget.
    pub fn logout(&mut self) {
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            if let Err(e) = backend.logout().await {
                debug!("logout request failed: {e}");
            }
        });
        info!("signed out");
        self.enter_signed_out();
    }

    fn enter_signed_in(&mut self) {
        self.refresh();
        if !self.roster.is_polling() {
            let handle = roster::spawn_poller(
                Arc::clone(&self.backend),
                self.roster.sequencer(),
                self.tx.clone(),
                self.options.poll_interval,
            );
            self.roster.set_poll(handle);
        }
    }

    fn enter_signed_out(&mut self) {
        self.session.sign_out();
        self.roster.reset();
        self.logs.clear();
        self.passwords.clear();
        self.auth_editor.close();
        self.rebuild.reset();
        self.create = None;
        self.confirm = None;
        self.notice = None;
    }

    // ── Roster ────────────────────────────────────────────────────────────

    /// Out-of-band roster fetch. The newest issued fetch wins.
    pub fn refresh(&mut self) -> bool {
        if !self.session.is_authenticated() {
            return false;
        }
        let seq = self.roster.next_seq();
        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            DashEvent::RosterFetched {
                seq,
                result: backend.list_apps().await,
            }
        });
        true
    }

    // ── Mutations ─────────────────────────────────────────────────────────

    fn run_action(&mut self, action: AppAction, app: String) -> bool {
        if !self.session.is_authenticated() || self.is_busy() {
            return false;
        }
        self.in_flight += 1;
        info!(%action, %app, "sending app action");
        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            let result = backend.run_action(action, &app).await;
            DashEvent::ActionFinished {
                action,
                app,
                result,
            }
        });
        true
    }

    /// Deploy a stopped app or restart a running one.
    pub fn deploy(&mut self, app: &str) -> bool {
        self.roster.contains(app) && self.run_action(AppAction::Deploy, app.to_string())
    }

    pub fn stop(&mut self, app: &str) -> bool {
        self.roster.is_running(app) && self.run_action(AppAction::Stop, app.to_string())
    }

    /// Ask for confirmation before deleting `app`.
    pub fn request_delete(&mut self, app: &str) -> bool {
        if !self.session.is_authenticated() || self.is_busy() || !self.roster.contains(app) {
            return false;
        }
        self.confirm = Some(ConfirmAction::DeleteApp(app.to_string()));
        true
    }

    /// Ask for confirmation before resetting `app`'s password.
    pub fn request_password_reset(&mut self, app: &str) -> bool {
        if !self.session.is_authenticated() || !self.roster.is_running(app) {
            return false;
        }
        self.confirm = Some(ConfirmAction::ResetPassword(app.to_string()));
        true
    }

    pub fn confirm(&mut self) -> bool {
        match self.confirm.take() {
            Some(ConfirmAction::DeleteApp(app)) => self.run_action(AppAction::Delete, app),
            Some(ConfirmAction::ResetPassword(app)) => self.reset_password(app),
            None => false,
        }
    }

    pub fn cancel_confirm(&mut self) -> bool {
        self.confirm.take().is_some()
    }

    fn reset_password(&mut self, app: String) -> bool {
        if !self.session.is_authenticated() || !self.roster.is_running(&app) {
            return false;
        }
        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            let result = backend.reset_password(&app).await;
            DashEvent::PasswordReset { app, result }
        });
        true
    }

    pub fn open_create(&mut self) -> bool {
        if !self.session.is_authenticated() {
            return false;
        }
        self.create = Some(CreateDialog::default());
        true
    }

    pub fn create_dialog_mut(&mut self) -> Option<&mut CreateDialog> {
        self.create.as_mut()
    }

    pub fn close_create(&mut self) {
        self.create = None;
    }

    /// The typed name (trimmed) matches an app already in the roster.
    pub fn create_name_taken(&self) -> bool {
        self.create
            .as_ref()
            .is_some_and(|d| !d.trimmed().is_empty() && self.roster.contains(d.trimmed()))
    }

    /// Inline validation message for the create dialog.
    pub fn create_error(&self) -> Option<&'static str> {
        self.create_name_taken().then_some(DUPLICATE_NAME_MESSAGE)
    }

    pub fn can_submit_create(&self) -> bool {
        self.create
            .as_ref()
            .is_some_and(|d| !d.trimmed().is_empty())
            && !self.create_name_taken()
            && !self.is_busy()
    }

    /// Create the app named in the dialog. Duplicates never reach the backend.
    pub fn submit_create(&mut self) -> bool {
        if !self.can_submit_create() {
            return false;
        }
        let Some(name) = self.create.as_ref().map(|d| d.trimmed().to_string()) else {
            return false;
        };
        self.run_action(AppAction::Create, name)
    }

    // ── Reveals ───────────────────────────────────────────────────────────

    /// Show or hide `app`'s logs. Returns true when a fetch was started.
    pub fn toggle_logs(&mut self, app: &str) -> bool {
        if !self.session.is_authenticated() {
            return false;
        }
        let Toggle::Fetch(ticket) = self.logs.toggle(app) else {
            return false;
        };
        let backend = Arc::clone(&self.backend);
        let app = app.to_string();
        self.spawn(async move {
            let value = Revealed::from_logs(backend.logs(&app).await);
            DashEvent::RevealFetched {
                kind: RevealKind::Logs,
                app,
                ticket,
                value,
            }
        });
        true
    }

    /// Show or hide `app`'s password. Revealing needs a running app;
    /// collapsing never does.
    pub fn toggle_password(&mut self, app: &str) -> bool {
        if !self.session.is_authenticated() {
            return false;
        }
        let shown = self.passwords.is_revealed(app) || self.passwords.is_pending(app);
        if !shown && !self.roster.is_running(app) {
            return false;
        }
        let Toggle::Fetch(ticket) = self.passwords.toggle(app) else {
            return false;
        };
        let backend = Arc::clone(&self.backend);
        let app = app.to_string();
        self.spawn(async move {
            let value = Revealed::from_password(backend.password(&app).await);
            DashEvent::RevealFetched {
                kind: RevealKind::Password,
                app,
                ticket,
                value,
            }
        });
        true
    }

    // ── Auth config ───────────────────────────────────────────────────────

    pub fn open_auth_editor(&mut self, app: &str) -> bool {
        if !self.session.is_authenticated() || !self.roster.contains(app) {
            return false;
        }
        let ticket = self.auth_editor.open(app);
        let backend = Arc::clone(&self.backend);
        let app = app.to_string();
        self.spawn(async move {
            DashEvent::AuthConfigLoaded {
                ticket,
                result: backend.auth_config(&app).await,
            }
        });
        true
    }

    pub fn auth_draft_mut(&mut self) -> Option<&mut AuthConfigDraft> {
        self.auth_editor.draft_mut()
    }

    /// Fill the API key field with a fresh random key.
    pub fn generate_api_key(&mut self) -> bool {
        let Some(draft) = self.auth_editor.draft_mut() else {
            return false;
        };
        match auth_editor::generate_api_key() {
            Ok(key) => {
                draft.api_key = key;
                true
            }
            Err(e) => {
                warn!("random key generation failed: {e}");
                self.notice = Some(Notice::error(format!("Could not generate a key: {e}")));
                false
            }
        }
    }

    pub fn save_auth_config(&mut self) -> bool {
        let Some((app, config, ticket)) = self.auth_editor.begin_save() else {
            return false;
        };
        info!(%app, auth_type = %config.auth_type(), "saving auth config");
        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            DashEvent::AuthConfigSaved {
                ticket,
                result: backend.save_auth_config(&app, &config).await,
            }
        });
        true
    }

    pub fn cancel_auth_editor(&mut self) -> bool {
        if !self.auth_editor.is_open() {
            return false;
        }
        self.auth_editor.close();
        true
    }

    // ── Rebuild ───────────────────────────────────────────────────────────

    /// Open a rebuild stream for `app`, closing any previous one first.
    pub fn start_rebuild(&mut self, app: &str) -> bool {
        if !self.session.is_authenticated() {
            return false;
        }
        let Some(generation) = self.rebuild.begin(app) else {
            return false;
        };
        info!(app, generation, "starting rebuild");
        let handle = tokio::spawn(rebuild::pump(
            Arc::clone(&self.backend),
            app.to_string(),
            generation,
            self.tx.clone(),
        ));
        self.rebuild.attach(handle);
        true
    }

    /// Rebuild the same app again after a failure.
    pub fn retry_rebuild(&mut self) -> bool {
        if !self.rebuild.can_retry() {
            return false;
        }
        let Some(app) = self.rebuild.session().map(|s| s.app_name.clone()) else {
            return false;
        };
        self.start_rebuild(&app)
    }

    /// Close the rebuild overlay. Refused while building.
    pub fn dismiss_rebuild(&mut self) -> bool {
        self.rebuild.dismiss()
    }

    // ── Links ─────────────────────────────────────────────────────────────

    /// Web IDE link, offered only for running apps.
    pub fn ide_url(&self, app: &str) -> Option<String> {
        if !self.roster.is_running(app) {
            return None;
        }
        mcphub_api::ide_url(&self.options.server_url, self.options.ide_port, app)
    }

    /// IDE link for the app whose rebuild just succeeded.
    pub fn rebuild_result_url(&self) -> Option<String> {
        let session = self.rebuild.session()?;
        if session.outcome != RebuildOutcome::Success {
            return None;
        }
        mcphub_api::ide_url(
            &self.options.server_url,
            self.options.ide_port,
            &session.app_name,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::NoticeLevel;
    use crate::auth_editor::EditorPhase;
    use crate::rebuild::CONNECTION_ERROR_LINE;
    use crate::reveal::LOGS_ERROR;
    use crate::session::LoginError;
    use crate::testing::{FakeBackend, settle};
    use mcphub_api::{AuthType, REBUILD_SUCCESS};

    fn fixture() -> Arc<FakeBackend> {
        Arc::new(
            FakeBackend::new("hunter2")
                .with_app("a", "Up 2 hours")
                .with_app("b", "Exited (0) 5 minutes ago")
                .with_logs("a", "a: listening on :3000")
                .with_password("a", "pw-a"),
        )
    }

    async fn signed_in(fake: &Arc<FakeBackend>) -> Dashboard<FakeBackend> {
        let mut dash = Dashboard::new(Arc::clone(fake), DashboardOptions::default());
        dash.set_login_password("hunter2");
        assert!(dash.login());
        settle(&mut dash).await;
        assert!(dash.is_authenticated());
        assert_eq!(dash.roster().apps().len(), 2);
        dash
    }

    #[tokio::test]
    async fn failed_session_check_ends_unauthenticated() {
        let fake = fixture();
        fake.set_unreachable(true);
        let mut dash = Dashboard::new(Arc::clone(&fake), DashboardOptions::default());
        assert_eq!(dash.session().state(), SessionState::Unknown);

        dash.check_session();
        settle(&mut dash).await;

        assert_eq!(dash.session().state(), SessionState::Unauthenticated);
        assert!(dash.roster().apps().is_empty());
        assert!(!dash.roster().is_polling());
        assert!(!dash.refresh());
    }

    #[tokio::test]
    async fn valid_session_loads_roster_and_polls() {
        let fake = fixture();
        fake.set_session_valid(true);
        let mut dash = Dashboard::new(Arc::clone(&fake), DashboardOptions::default());
        dash.check_session();
        settle(&mut dash).await;

        assert!(dash.is_authenticated());
        assert_eq!(dash.roster().apps().len(), 2);
        assert!(dash.roster().is_polling());
    }

    #[tokio::test]
    async fn login_reports_wrong_password_and_unreachable_separately() {
        let fake = fixture();
        let mut dash = Dashboard::new(Arc::clone(&fake), DashboardOptions::default());

        dash.set_login_password("nope");
        assert!(dash.login());
        settle(&mut dash).await;
        assert_eq!(dash.session().login_error(), Some(LoginError::InvalidPassword));
        assert!(!dash.is_authenticated());

        fake.set_unreachable(true);
        assert!(dash.login());
        settle(&mut dash).await;
        assert_eq!(dash.session().login_error(), Some(LoginError::Unreachable));

        fake.set_unreachable(false);
        dash.set_login_password("hunter2");
        assert!(dash.login());
        settle(&mut dash).await;
        assert!(dash.is_authenticated());
        assert!(dash.session().login_error().is_none());
    }

    #[tokio::test]
    async fn log_reveal_refetches_after_collapse() {
        let fake = fixture();
        let mut dash = signed_in(&fake).await;

        assert!(dash.toggle_logs("a"));
        settle(&mut dash).await;
        assert_eq!(
            dash.logs().get("a"),
            Some(&Revealed::Ok("a: listening on :3000".into()))
        );

        fake.set_logs("a", "a: restarted");
        assert!(!dash.toggle_logs("a"));
        assert!(!dash.logs().is_revealed("a"));

        assert!(dash.toggle_logs("a"));
        settle(&mut dash).await;
        assert_eq!(dash.logs().get("a"), Some(&Revealed::Ok("a: restarted".into())));
        assert_eq!(fake.call_count("logs a"), 2);
    }

    #[tokio::test]
    async fn missing_logs_show_placeholder() {
        let fake = fixture();
        let mut dash = signed_in(&fake).await;
        dash.toggle_logs("b");
        settle(&mut dash).await;
        assert_eq!(dash.logs().get("b"), Some(&Revealed::Err(LOGS_ERROR.into())));
    }

    #[tokio::test]
    async fn password_reveal_requires_running_app() {
        let fake = fixture();
        let mut dash = signed_in(&fake).await;

        assert!(!dash.toggle_password("b"));
        assert_eq!(fake.call_count("password b"), 0);

        assert!(dash.toggle_password("a"));
        settle(&mut dash).await;
        assert_eq!(dash.passwords().get("a"), Some(&Revealed::Ok("pw-a".into())));
        assert!(!dash.toggle_password("a"));
        assert!(!dash.passwords().is_revealed("a"));
    }

    #[tokio::test]
    async fn duplicate_create_sends_no_request() {
        let fake = fixture();
        let mut dash = signed_in(&fake).await;

        assert!(dash.open_create());
        if let Some(dialog) = dash.create_dialog_mut() {
            dialog.name = "  a ".into();
        }
        assert!(dash.create_name_taken());
        assert_eq!(dash.create_error(), Some(DUPLICATE_NAME_MESSAGE));
        assert!(!dash.submit_create());
        settle(&mut dash).await;
        assert_eq!(fake.call_count("create"), 0);
    }

    #[tokio::test]
    async fn create_trims_name_and_closes_dialog() {
        let fake = fixture();
        let mut dash = signed_in(&fake).await;

        dash.open_create();
        if let Some(dialog) = dash.create_dialog_mut() {
            dialog.name = " fresh ".into();
        }
        assert!(dash.submit_create());
        assert!(dash.is_busy());
        settle(&mut dash).await;

        assert!(!dash.is_busy());
        assert!(dash.create_dialog().is_none());
        assert_eq!(fake.call_count("create fresh"), 1);
        assert!(dash.roster().contains("fresh"));
    }

    #[tokio::test]
    async fn busy_flag_blocks_concurrent_mutations() {
        let fake = fixture();
        let mut dash = signed_in(&fake).await;

        assert!(dash.deploy("b"));
        assert!(!dash.stop("a"));
        assert!(!dash.request_delete("a"));
        settle(&mut dash).await;

        assert!(!dash.is_busy());
        assert!(dash.roster().is_running("b"));
        assert_eq!(dash.roster().get("b").map(|a| a.deploy_label()), Some("Restart"));
        assert!(dash.stop("a"));
        settle(&mut dash).await;
        assert!(!dash.roster().is_running("a"));
    }

    #[tokio::test]
    async fn stop_requires_running_app() {
        let fake = fixture();
        let mut dash = signed_in(&fake).await;
        assert!(!dash.stop("b"));
        assert!(!dash.is_busy());
    }

    #[tokio::test]
    async fn delete_waits_for_confirmation_and_forgets_reveals() {
        let fake = fixture();
        let mut dash = signed_in(&fake).await;
        dash.toggle_logs("a");
        dash.toggle_password("a");
        settle(&mut dash).await;
        assert!(dash.logs().is_revealed("a"));

        assert!(dash.request_delete("a"));
        assert!(matches!(dash.pending_confirm(), Some(ConfirmAction::DeleteApp(n)) if n == "a"));
        assert!(dash.cancel_confirm());
        settle(&mut dash).await;
        assert_eq!(fake.call_count("delete"), 0);

        dash.request_delete("a");
        assert!(dash.confirm());
        settle(&mut dash).await;

        assert_eq!(fake.call_count("delete a"), 1);
        assert!(!dash.logs().is_revealed("a"));
        assert!(!dash.passwords().is_revealed("a"));
        assert!(!dash.roster().contains("a"));
    }

    #[tokio::test]
    async fn failed_mutation_becomes_notice_and_still_refreshes() {
        let fake = fixture();
        let mut dash = signed_in(&fake).await;
        let fetches = fake.call_count("list_apps");

        fake.set_action_error(Some(BackendError::Rejected {
            status: 500,
            message: "docker daemon unavailable".into(),
        }));
        dash.deploy("a");
        settle(&mut dash).await;

        let notice = dash.notice().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.contains("deploy a"));
        assert!(fake.call_count("list_apps") > fetches);
        assert!(!dash.is_busy());
    }

    #[tokio::test]
    async fn password_reset_replaces_revealed_value() {
        let fake = fixture();
        let mut dash = signed_in(&fake).await;
        dash.toggle_password("a");
        settle(&mut dash).await;

        assert!(!dash.request_password_reset("b"));
        assert!(dash.request_password_reset("a"));
        assert!(dash.confirm());
        settle(&mut dash).await;

        let shown = dash.passwords().get("a").unwrap();
        assert!(shown.is_ok());
        assert_ne!(shown.text(), "pw-a");
    }

    #[tokio::test]
    async fn auth_editor_loads_edits_and_saves() {
        let fake = fixture();
        let mut dash = signed_in(&fake).await;

        assert!(dash.open_auth_editor("a"));
        assert_eq!(dash.auth_editor().phase(), EditorPhase::Loading);
        settle(&mut dash).await;
        assert_eq!(dash.auth_editor().phase(), EditorPhase::Ready);
        assert_eq!(dash.auth_editor().draft().auth_type, AuthType::None);

        if let Some(draft) = dash.auth_draft_mut() {
            draft.auth_type = AuthType::ApiKey;
        }
        assert!(dash.generate_api_key());
        let key = dash.auth_editor().draft().api_key.clone();
        assert_eq!(key.len(), 48);

        assert!(dash.save_auth_config());
        settle(&mut dash).await;

        assert_eq!(dash.auth_editor().phase(), EditorPhase::Closed);
        let stored = fake.stored_auth("a").unwrap();
        assert_eq!(stored.auth_type, AuthType::ApiKey);
        assert_eq!(stored.api_key.as_deref(), Some(key.as_str()));
        assert_eq!(dash.roster().get("a").map(|a| a.auth_type), Some(AuthType::ApiKey));
    }

    #[tokio::test]
    async fn rebuild_stream_runs_to_success() {
        let fake = fixture();
        let mut dash = signed_in(&fake).await;
        let fetches = fake.call_count("list_apps");

        assert!(dash.start_rebuild("a"));
        let feed = fake.wait_for_feed("a", 1).await;
        feed.line("Step 1/3");
        feed.line("Step 2/3");
        settle(&mut dash).await;
        assert!(!dash.dismiss_rebuild());
        assert!(!dash.start_rebuild("a"));

        feed.done(REBUILD_SUCCESS);
        settle(&mut dash).await;

        let session = dash.rebuild().session().unwrap();
        assert_eq!(session.log_lines, vec!["Step 1/3", "Step 2/3"]);
        assert_eq!(session.outcome, RebuildOutcome::Success);
        feed.wait_closed().await;
        assert!(!dash.rebuild().transport_open());
        assert!(fake.call_count("list_apps") > fetches);
        assert_eq!(
            dash.rebuild_result_url().as_deref(),
            Some("http://localhost:8085/a-ide/")
        );
        assert!(dash.dismiss_rebuild());
    }

    #[tokio::test]
    async fn new_rebuild_supersedes_and_closes_the_old_stream() {
        let fake = fixture();
        let mut dash = signed_in(&fake).await;

        dash.start_rebuild("a");
        let first = fake.wait_for_feed("a", 1).await;
        first.line("from a");
        settle(&mut dash).await;

        assert!(dash.start_rebuild("b"));
        first.wait_closed().await;
        first.line("late from a");
        let second = fake.wait_for_feed("b", 1).await;
        second.line("from b");
        settle(&mut dash).await;

        let session = dash.rebuild().session().unwrap();
        assert_eq!(session.app_name, "b");
        assert_eq!(session.log_lines, vec!["from b"]);
        assert_eq!(session.outcome, RebuildOutcome::Building);
    }

    #[tokio::test]
    async fn transport_failure_adds_one_connection_error_line() {
        let fake = fixture();
        let mut dash = signed_in(&fake).await;

        dash.start_rebuild("a");
        let feed = fake.wait_for_feed("a", 1).await;
        feed.line("Step 1/3");
        feed.fail("connection reset by peer");
        settle(&mut dash).await;

        let session = dash.rebuild().session().unwrap();
        assert_eq!(session.outcome, RebuildOutcome::Failed);
        assert_eq!(session.log_lines, vec!["Step 1/3", CONNECTION_ERROR_LINE]);
        assert!(dash.rebuild_result_url().is_none());

        assert!(dash.retry_rebuild());
        let retry = fake.wait_for_feed("a", 2).await;
        settle(&mut dash).await;
        assert!(dash.rebuild().is_building_app("a"));
        assert!(dash.rebuild().session().unwrap().log_lines.is_empty());
        retry.done("failed");
        settle(&mut dash).await;
        assert_eq!(dash.rebuild().session().unwrap().outcome, RebuildOutcome::Failed);
    }

    #[tokio::test]
    async fn stream_closed_without_done_counts_as_failure() {
        let fake = fixture();
        let mut dash = signed_in(&fake).await;

        dash.start_rebuild("a");
        let feed = fake.wait_for_feed("a", 1).await;
        feed.hang_up();
        settle(&mut dash).await;

        let session = dash.rebuild().session().unwrap();
        assert_eq!(session.outcome, RebuildOutcome::Failed);
        assert_eq!(session.log_lines, vec![CONNECTION_ERROR_LINE]);
    }

    #[tokio::test]
    async fn logout_clears_every_component() {
        let fake = fixture();
        let mut dash = signed_in(&fake).await;
        dash.toggle_logs("a");
        dash.toggle_password("a");
        dash.open_auth_editor("b");
        dash.start_rebuild("a");
        let feed = fake.wait_for_feed("a", 1).await;
        settle(&mut dash).await;

        dash.logout();
        assert_eq!(dash.session().state(), SessionState::Unauthenticated);
        assert!(dash.roster().apps().is_empty());
        assert!(!dash.roster().is_polling());
        assert!(dash.logs().is_empty());
        assert!(dash.passwords().is_empty());
        assert!(!dash.auth_editor().is_open());
        assert!(dash.rebuild().session().is_none());

        feed.wait_closed().await;
        settle(&mut dash).await;
        assert_eq!(fake.call_count("logout"), 1);
        assert!(dash.roster().apps().is_empty());
    }

    #[tokio::test]
    async fn action_finishing_after_logout_leaves_no_notice() {
        let fake = fixture();
        let mut dash = signed_in(&fake).await;
        assert!(dash.deploy("a"));
        dash.logout();
        settle(&mut dash).await;

        assert_eq!(fake.call_count("deploy"), 1);
        assert!(dash.notice().is_none());
        assert!(!dash.is_busy());
        assert!(dash.roster().apps().is_empty());
    }

    #[tokio::test]
    async fn ide_link_only_for_running_apps() {
        let fake = fixture();
        let dash = signed_in(&fake).await;
        assert_eq!(dash.ide_url("a").as_deref(), Some("http://localhost:8085/a-ide/"));
        assert!(dash.ide_url("b").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn poll_refreshes_roster_on_interval() {
        let fake = fixture();
        let mut dash = signed_in(&fake).await;
        let before = fake.call_count("list_apps");

        fake.set_app_status("b", "Up 1 second");
        tokio::time::sleep(Duration::from_millis(5_500)).await;
        settle(&mut dash).await;

        assert_eq!(fake.call_count("list_apps"), before + 1);
        assert!(dash.roster().is_running("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_session_stops_polling() {
        let fake = fixture();
        let mut dash = signed_in(&fake).await;

        fake.set_session_valid(false);
        tokio::time::sleep(Duration::from_millis(5_500)).await;
        settle(&mut dash).await;
        assert_eq!(dash.session().state(), SessionState::Unauthenticated);
        assert!(!dash.roster().is_polling());

        let after = fake.call_count("list_apps");
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fake.call_count("list_apps"), after);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_poll_ticks_are_skipped() {
        let fake = fixture();
        let mut dash = signed_in(&fake).await;
        let before = fake.call_count("list_apps");

        fake.set_roster_delay(Some(Duration::from_secs(12)));
        tokio::time::sleep(Duration::from_secs(31)).await;

        // Ticks at 5s and 20s fetch; 10s, 15s, 25s and 30s are skipped.
        assert_eq!(fake.call_count("list_apps"), before + 2);
        assert_eq!(fake.max_roster_in_flight(), 1);
        dash.drain();
    }
}
