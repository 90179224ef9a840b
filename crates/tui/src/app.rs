use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use mcphub_api::{AppSummary, AuthType};
use mcphub_dashboard::{Backend, Dashboard, EditorPhase, Revealed, SessionState};
use ratatui::widgets::ListState;
use tracing::warn;

use crate::follow::FollowTailState;
use crate::platform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Error,
    Info,
}

/// Focused field of the auth-config dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthField {
    #[default]
    Mode,
    ApiKey,
    TenantId,
    ClientId,
}

impl AuthField {
    /// Fields shown for `auth_type`, in tab order.
    pub fn visible(auth_type: AuthType) -> &'static [AuthField] {
        match auth_type {
            AuthType::None => &[AuthField::Mode],
            AuthType::ApiKey => &[AuthField::Mode, AuthField::ApiKey],
            AuthType::EntraId => &[AuthField::Mode, AuthField::TenantId, AuthField::ClientId],
        }
    }
}

/// Which surface receives key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Checking,
    Login,
    Confirm,
    Create,
    AuthEditor,
    Rebuild,
    Roster,
}

pub struct App<B: Backend> {
    pub dash: Dashboard<B>,
    pub list_state: ListState,
    selected_name: Option<String>,
    pub flash_message: Option<(String, FlashLevel)>,
    pub auth_field: AuthField,
    pub rebuild_follow: FollowTailState,
    /// Rows available to the rebuild log on the last frame.
    pub rebuild_viewport: usize,
    /// Wrapped row count of the rebuild log at the last draw.
    pub rebuild_rows: usize,
}

impl<B: Backend> App<B> {
    pub fn new(dash: Dashboard<B>) -> Self {
        Self {
            dash,
            list_state: ListState::default(),
            selected_name: None,
            flash_message: None,
            auth_field: AuthField::Mode,
            rebuild_follow: FollowTailState::default(),
            rebuild_viewport: 10,
            rebuild_rows: 0,
        }
    }

    pub fn screen(&self) -> Screen {
        match self.dash.session().state() {
            SessionState::Unknown => return Screen::Checking,
            SessionState::Unauthenticated => return Screen::Login,
            SessionState::Authenticated => {}
        }
        if self.dash.pending_confirm().is_some() {
            Screen::Confirm
        } else if self.dash.create_dialog().is_some() {
            Screen::Create
        } else if self.dash.auth_editor().is_open() {
            Screen::AuthEditor
        } else if self.dash.rebuild().session().is_some() {
            Screen::Rebuild
        } else {
            Screen::Roster
        }
    }

    // ── Selection ─────────────────────────────────────────────────────

    pub fn selected_app(&self) -> Option<&AppSummary> {
        let index = self.list_state.selected()?;
        self.dash.roster().apps().get(index)
    }

    fn selected_name(&self) -> Option<String> {
        self.selected_app().map(|a| a.name.clone())
    }

    /// Keep the cursor on the same app across roster refreshes.
    pub fn sync_selection(&mut self) {
        let apps = self.dash.roster().apps();
        if apps.is_empty() {
            self.list_state.select(None);
            return;
        }
        let by_name = self
            .selected_name
            .as_deref()
            .and_then(|name| apps.iter().position(|a| a.name == name));
        let index = by_name
            .or(self.list_state.selected())
            .unwrap_or(0)
            .min(apps.len() - 1);
        self.list_state.select(Some(index));
        self.selected_name = Some(apps[index].name.clone());
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.dash.roster().apps().len();
        if len == 0 {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1) as usize;
        self.list_state.select(Some(next));
        self.selected_name = self.dash.roster().apps().get(next).map(|a| a.name.clone());
    }

    // ── Flash ─────────────────────────────────────────────────────────

    pub fn flash_success(&mut self, msg: impl Into<String>) {
        self.flash_message = Some((msg.into(), FlashLevel::Success));
    }

    pub fn flash_error(&mut self, msg: impl Into<String>) {
        self.flash_message = Some((msg.into(), FlashLevel::Error));
    }

    pub fn flash_info(&mut self, msg: impl Into<String>) {
        self.flash_message = Some((msg.into(), FlashLevel::Info));
    }

    // ── Keys ──────────────────────────────────────────────────────────

    /// Returns true if the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }
        self.flash_message = None;

        match self.screen() {
            Screen::Checking => matches!(key.code, KeyCode::Char('q') | KeyCode::Esc),
            Screen::Login => self.handle_login_key(key),
            Screen::Confirm => {
                self.handle_confirm_key(key);
                false
            }
            Screen::Create => {
                self.handle_create_key(key);
                false
            }
            Screen::AuthEditor => {
                self.handle_auth_editor_key(key);
                false
            }
            Screen::Rebuild => {
                self.handle_rebuild_key(key);
                false
            }
            Screen::Roster => self.handle_roster_key(key),
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) -> bool {
        let mut password = self.dash.session().password().to_string();
        match key.code {
            KeyCode::Esc => return true,
            KeyCode::Enter => {
                self.dash.login();
                return false;
            }
            KeyCode::Backspace => {
                password.pop();
            }
            KeyCode::Char(c) => password.push(c),
            _ => return false,
        }
        if !self.dash.session().is_logging_in() {
            self.dash.set_login_password(password);
        }
        false
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.dash.confirm();
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.dash.cancel_confirm();
            }
            _ => {}
        }
    }

    fn handle_create_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.dash.close_create(),
            KeyCode::Enter => {
                self.dash.submit_create();
            }
            KeyCode::Backspace => {
                if let Some(dialog) = self.dash.create_dialog_mut() {
                    dialog.name.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(dialog) = self.dash.create_dialog_mut() {
                    dialog.name.push(c);
                }
            }
            _ => {}
        }
    }

    fn handle_auth_editor_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            self.dash.cancel_auth_editor();
            self.auth_field = AuthField::Mode;
            return;
        }
        if self.dash.auth_editor().phase() != EditorPhase::Ready {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('g') {
            if self.dash.auth_editor().draft().auth_type == AuthType::ApiKey
                && self.dash.generate_api_key()
            {
                self.flash_success("Generated a new API key");
            }
            return;
        }

        let auth_type = self.dash.auth_editor().draft().auth_type;
        let fields = AuthField::visible(auth_type);
        let position = fields.iter().position(|f| *f == self.auth_field).unwrap_or(0);

        match key.code {
            KeyCode::Enter => {
                self.dash.save_auth_config();
            }
            KeyCode::Tab | KeyCode::Down => {
                self.auth_field = fields[(position + 1) % fields.len()];
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.auth_field = fields[(position + fields.len() - 1) % fields.len()];
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if self.auth_field == AuthField::Mode => {
                if let Some(draft) = self.dash.auth_draft_mut() {
                    draft.auth_type = draft.auth_type.cycle();
                }
            }
            KeyCode::Backspace => {
                if let Some(field) = self.focused_text_field() {
                    field.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(field) = self.focused_text_field() {
                    field.push(c);
                }
            }
            _ => {}
        }
    }

    fn focused_text_field(&mut self) -> Option<&mut String> {
        let focus = self.auth_field;
        let draft = self.dash.auth_draft_mut()?;
        match focus {
            AuthField::Mode => None,
            AuthField::ApiKey => Some(&mut draft.api_key),
            AuthField::TenantId => Some(&mut draft.tenant_id),
            AuthField::ClientId => Some(&mut draft.client_id),
        }
    }

    fn handle_rebuild_key(&mut self, key: KeyEvent) {
        let total = self.rebuild_rows;
        let height = self.rebuild_viewport;
        match key.code {
            KeyCode::Char('k') | KeyCode::Up => self.rebuild_follow.scroll_up(1, total, height),
            KeyCode::Char('j') | KeyCode::Down => self.rebuild_follow.scroll_down(1, total, height),
            KeyCode::PageUp => self.rebuild_follow.scroll_up(height, total, height),
            KeyCode::PageDown => self.rebuild_follow.scroll_down(height, total, height),
            KeyCode::End | KeyCode::Char('G') => self.rebuild_follow.reattach(),
            KeyCode::Char('r') => {
                if self.dash.retry_rebuild() {
                    self.rebuild_follow.reset();
                }
            }
            KeyCode::Char('o') => match self.dash.rebuild_result_url() {
                Some(url) => self.open_link(&url),
                None => self.flash_info("The IDE link is available after a successful build"),
            },
            KeyCode::Esc | KeyCode::Char('q') => {
                if self.dash.dismiss_rebuild() {
                    self.rebuild_follow.reset();
                } else {
                    self.flash_info("Build in progress");
                }
            }
            _ => {}
        }
    }

    fn handle_roster_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('q') {
            return true;
        }
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('g') | KeyCode::Home => self.move_selection(isize::MIN / 2),
            KeyCode::Char('G') | KeyCode::End => self.move_selection(isize::MAX / 2),
            KeyCode::Char('r') => {
                self.dash.refresh();
                self.flash_info("Refreshing...");
            }
            KeyCode::Char('n') => {
                self.dash.open_create();
            }
            KeyCode::Char('L') => self.dash.logout(),
            KeyCode::Esc => self.dash.clear_notice(),
            _ => {
                if let Some(name) = self.selected_name() {
                    self.handle_app_key(key, &name);
                }
            }
        }
        false
    }

    fn handle_app_key(&mut self, key: KeyEvent, name: &str) {
        let busy = self.dash.is_busy();
        match key.code {
            KeyCode::Enter | KeyCode::Char('d') => {
                if !self.dash.deploy(name) && busy {
                    self.flash_info("Another action is still running");
                }
            }
            KeyCode::Char('s') => {
                if !self.dash.stop(name) && !busy {
                    self.flash_info(format!("{name} is not running"));
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                self.dash.request_delete(name);
            }
            KeyCode::Char('l') => {
                self.dash.toggle_logs(name);
            }
            KeyCode::Char('p') => {
                let shown = self.dash.passwords().is_revealed(name);
                if !self.dash.toggle_password(name) && !shown && !self.dash.roster().is_running(name) {
                    self.flash_info("Passwords are only available while the app is running");
                }
            }
            KeyCode::Char('P') => {
                if !self.dash.request_password_reset(name) {
                    self.flash_info("Start the app before resetting its password");
                }
            }
            KeyCode::Char('c') => self.copy_password(name),
            KeyCode::Char('a') => {
                if self.dash.open_auth_editor(name) {
                    self.auth_field = AuthField::Mode;
                }
            }
            KeyCode::Char('b') => {
                if self.dash.start_rebuild(name) {
                    self.rebuild_follow.reset();
                }
            }
            KeyCode::Char('o') => match self.dash.ide_url(name) {
                Some(url) => self.open_link(&url),
                None => self.flash_info("The Web IDE is available while the app is running"),
            },
            _ => {}
        }
    }

    fn copy_password(&mut self, name: &str) {
        let Some(Revealed::Ok(password)) = self.dash.passwords().get(name).cloned() else {
            self.flash_info("Reveal the password first (p)");
            return;
        };
        match platform::copy_to_clipboard(&password) {
            Ok(()) => self.flash_success("Password copied to clipboard"),
            Err(e) => {
                warn!("clipboard copy failed: {e:#}");
                self.flash_error(format!("Copy failed: {e}"));
            }
        }
    }

    fn open_link(&mut self, url: &str) {
        match platform::open_url(url) {
            Ok(()) => self.flash_success(format!("Opened {url}")),
            Err(e) => {
                warn!("failed to open {url}: {e:#}");
                self.flash_error(format!("Open {url} manually"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcphub_dashboard::DashboardOptions;
    use mcphub_dashboard::testing::{FakeBackend, settle};
    use std::sync::Arc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text<B: Backend>(app: &mut App<B>, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    async fn signed_in_app() -> (Arc<FakeBackend>, App<FakeBackend>) {
        let fake = Arc::new(
            FakeBackend::new("pw")
                .with_app("alpha", "Up 3 minutes")
                .with_app("beta", "Exited (0)"),
        );
        let mut app = App::new(Dashboard::new(Arc::clone(&fake), DashboardOptions::default()));
        app.dash.check_session();
        settle(&mut app.dash).await;
        assert_eq!(app.screen(), Screen::Login);

        type_text(&mut app, "pw");
        app.handle_key(key(KeyCode::Enter));
        settle(&mut app.dash).await;
        app.sync_selection();
        assert_eq!(app.screen(), Screen::Roster);
        (fake, app)
    }

    #[tokio::test]
    async fn login_screen_collects_password_and_quits_on_esc() {
        let fake = Arc::new(FakeBackend::new("pw"));
        let mut app = App::new(Dashboard::new(fake, DashboardOptions::default()));
        assert_eq!(app.screen(), Screen::Checking);
        app.dash.check_session();
        settle(&mut app.dash).await;

        type_text(&mut app, "pwx");
        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.dash.session().password(), "pw");
        assert!(app.handle_key(key(KeyCode::Esc)));
    }

    #[tokio::test]
    async fn selection_follows_app_across_refresh() {
        let (fake, mut app) = signed_in_app().await;
        app.handle_key(key(KeyCode::Char('j')));
        assert_eq!(app.selected_app().map(|a| a.name.as_str()), Some("beta"));

        fake.set_app_status("beta", "Up 1 second");
        app.handle_key(key(KeyCode::Char('r')));
        settle(&mut app.dash).await;
        app.sync_selection();
        assert_eq!(app.selected_app().map(|a| a.name.as_str()), Some("beta"));
        assert!(app.dash.roster().is_running("beta"));
    }

    #[tokio::test]
    async fn delete_goes_through_confirm_modal() {
        let (fake, mut app) = signed_in_app().await;
        app.handle_key(key(KeyCode::Char('x')));
        assert_eq!(app.screen(), Screen::Confirm);
        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.screen(), Screen::Roster);
        assert_eq!(fake.call_count("delete"), 0);

        app.handle_key(key(KeyCode::Char('x')));
        app.handle_key(key(KeyCode::Char('y')));
        settle(&mut app.dash).await;
        app.sync_selection();
        assert_eq!(fake.call_count("delete alpha"), 1);
        assert_eq!(app.selected_app().map(|a| a.name.as_str()), Some("beta"));
    }

    #[tokio::test]
    async fn create_dialog_shows_duplicate_and_blocks_submit() {
        let (fake, mut app) = signed_in_app().await;
        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.screen(), Screen::Create);
        type_text(&mut app, "beta");
        assert!(app.dash.create_error().is_some());
        app.handle_key(key(KeyCode::Enter));
        settle(&mut app.dash).await;
        assert_eq!(fake.call_count("create"), 0);
        assert_eq!(app.screen(), Screen::Create);

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.screen(), Screen::Roster);
    }

    #[tokio::test]
    async fn auth_editor_tabs_through_mode_fields_and_saves() {
        let (fake, mut app) = signed_in_app().await;
        app.handle_key(key(KeyCode::Char('a')));
        settle(&mut app.dash).await;
        assert_eq!(app.screen(), Screen::AuthEditor);

        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.dash.auth_editor().draft().auth_type, AuthType::ApiKey);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.auth_field, AuthField::ApiKey);
        type_text(&mut app, "k-123");
        app.handle_key(key(KeyCode::Enter));
        settle(&mut app.dash).await;

        assert_eq!(app.screen(), Screen::Roster);
        let stored = fake.stored_auth("alpha").unwrap();
        assert_eq!(stored.api_key.as_deref(), Some("k-123"));
    }

    #[tokio::test]
    async fn rebuild_overlay_cannot_be_dismissed_while_building() {
        let (fake, mut app) = signed_in_app().await;
        app.handle_key(key(KeyCode::Char('b')));
        assert_eq!(app.screen(), Screen::Rebuild);
        let feed = fake.wait_for_feed("alpha", 1).await;

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.screen(), Screen::Rebuild);
        assert!(app.flash_message.is_some());

        feed.done("success");
        settle(&mut app.dash).await;
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.screen(), Screen::Roster);
    }

    #[tokio::test]
    async fn stopped_app_has_no_password_or_ide() {
        let (fake, mut app) = signed_in_app().await;
        app.handle_key(key(KeyCode::Char('j')));
        app.handle_key(key(KeyCode::Char('p')));
        app.handle_key(key(KeyCode::Char('o')));
        settle(&mut app.dash).await;
        assert_eq!(fake.call_count("password"), 0);
        assert!(app.flash_message.is_some());
    }

    #[tokio::test]
    async fn logout_returns_to_login() {
        let (_fake, mut app) = signed_in_app().await;
        app.handle_key(key(KeyCode::Char('L')));
        assert_eq!(app.screen(), Screen::Login);
        app.sync_selection();
        assert!(app.selected_app().is_none());
    }
}
