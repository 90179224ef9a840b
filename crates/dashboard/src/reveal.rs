//! Per-app toggles for logs and passwords.
//!
//! Nothing is cached across toggles: collapsing forgets the value and the
//! next reveal fetches again.

use std::collections::HashMap;

use mcphub_api::PasswordResponse;
use tracing::warn;

use crate::error::BackendError;

pub const LOGS_ERROR: &str = "No logs found or backend error.";
pub const LOGS_FETCH_ERROR: &str = "Error fetching logs.";
pub const PASSWORD_ERROR: &str = "Error";
pub const PASSWORD_FETCH_ERROR: &str = "Error fetching password.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RevealKind {
    Logs,
    Password,
}

/// A revealed value, or the placeholder shown instead of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revealed {
    Ok(String),
    Err(String),
}

impl Revealed {
    pub fn text(&self) -> &str {
        match self {
            Self::Ok(s) | Self::Err(s) => s,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn from_logs(result: Result<String, BackendError>) -> Self {
        match result {
            Ok(text) => Self::Ok(text),
            Err(BackendError::Rejected { status, .. }) => {
                warn!(status, "log fetch rejected");
                Self::Err(LOGS_ERROR.to_string())
            }
            Err(e) => {
                warn!("log fetch failed: {e}");
                Self::Err(LOGS_FETCH_ERROR.to_string())
            }
        }
    }

    pub fn from_password(result: Result<PasswordResponse, BackendError>) -> Self {
        match result {
            Ok(PasswordResponse {
                password: Some(password),
                ..
            }) => Self::Ok(password),
            Ok(PasswordResponse { error, .. }) => {
                Self::Err(error.unwrap_or_else(|| PASSWORD_ERROR.to_string()))
            }
            Err(e) => {
                warn!("password fetch failed: {e}");
                Self::Err(PASSWORD_FETCH_ERROR.to_string())
            }
        }
    }
}

/// Outcome of [`RevealStore::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// The value was shown and is now forgotten.
    Collapsed,
    /// A fetch was in flight; its result will be dropped.
    Cancelled,
    /// Start a fetch tagged with this ticket.
    Fetch(u64),
}

#[derive(Debug)]
pub struct RevealStore {
    kind: RevealKind,
    entries: HashMap<String, Revealed>,
    pending: HashMap<String, u64>,
    next_ticket: u64,
}

impl RevealStore {
    pub fn new(kind: RevealKind) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
            pending: HashMap::new(),
            next_ticket: 0,
        }
    }

    pub fn kind(&self) -> RevealKind {
        self.kind
    }

    pub fn get(&self, app: &str) -> Option<&Revealed> {
        self.entries.get(app)
    }

    pub fn is_revealed(&self, app: &str) -> bool {
        self.entries.contains_key(app)
    }

    pub fn is_pending(&self, app: &str) -> bool {
        self.pending.contains_key(app)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn toggle(&mut self, app: &str) -> Toggle {
        if self.entries.remove(app).is_some() {
            return Toggle::Collapsed;
        }
        if self.pending.remove(app).is_some() {
            return Toggle::Cancelled;
        }
        self.next_ticket += 1;
        self.pending.insert(app.to_string(), self.next_ticket);
        Toggle::Fetch(self.next_ticket)
    }

    /// Store a fetch result if its ticket is still the pending one.
    pub(crate) fn resolve(&mut self, app: &str, ticket: u64, value: Revealed) -> bool {
        if self.pending.get(app) != Some(&ticket) {
            return false;
        }
        self.pending.remove(app);
        self.entries.insert(app.to_string(), value);
        true
    }

    /// Show `value` unconditionally, superseding any pending fetch.
    pub(crate) fn put(&mut self, app: &str, value: Revealed) {
        self.pending.remove(app);
        self.entries.insert(app.to_string(), value);
    }

    pub(crate) fn evict(&mut self, app: &str) {
        self.pending.remove(app);
        self.entries.remove(app);
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_twice_restores_collapsed_state() {
        let mut store = RevealStore::new(RevealKind::Logs);
        let Toggle::Fetch(ticket) = store.toggle("a") else {
            panic!("first toggle should fetch");
        };
        assert!(store.resolve("a", ticket, Revealed::Ok("line".into())));
        assert_eq!(store.get("a").map(Revealed::text), Some("line"));

        assert_eq!(store.toggle("a"), Toggle::Collapsed);
        assert!(!store.is_revealed("a"));
        assert!(matches!(store.toggle("a"), Toggle::Fetch(t) if t != ticket));
    }

    #[test]
    fn collapsing_while_pending_drops_the_late_result() {
        let mut store = RevealStore::new(RevealKind::Password);
        let Toggle::Fetch(ticket) = store.toggle("a") else {
            panic!("expected fetch");
        };
        assert_eq!(store.toggle("a"), Toggle::Cancelled);
        assert!(!store.resolve("a", ticket, Revealed::Ok("pw".into())));
        assert!(store.is_empty());
    }

    #[test]
    fn entries_are_independent_per_app() {
        let mut store = RevealStore::new(RevealKind::Logs);
        let Toggle::Fetch(ta) = store.toggle("a") else { panic!() };
        let Toggle::Fetch(tb) = store.toggle("b") else { panic!() };
        store.resolve("b", tb, Revealed::Ok("b".into()));
        store.resolve("a", ta, Revealed::Err(LOGS_ERROR.into()));
        assert_eq!(store.len(), 2);
        store.evict("a");
        assert!(!store.is_revealed("a"));
        assert!(store.is_revealed("b"));
    }

    #[test]
    fn log_failures_map_to_fixed_placeholders() {
        let rejected = Revealed::from_logs(Err(BackendError::Rejected {
            status: 404,
            message: String::new(),
        }));
        assert_eq!(rejected, Revealed::Err(LOGS_ERROR.into()));

        let unreachable = Revealed::from_logs(Err(BackendError::Unreachable("reset".into())));
        assert_eq!(unreachable, Revealed::Err(LOGS_FETCH_ERROR.into()));
    }

    #[test]
    fn password_body_error_is_shown_verbatim() {
        let value = Revealed::from_password(Ok(PasswordResponse {
            password: None,
            error: Some("Container not running".into()),
        }));
        assert_eq!(value, Revealed::Err("Container not running".into()));

        let bare = Revealed::from_password(Ok(PasswordResponse::default()));
        assert_eq!(bare, Revealed::Err(PASSWORD_ERROR.into()));
    }
}
