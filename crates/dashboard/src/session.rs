//! Session gate: whether the operator holds a valid dashboard cookie.

use tracing::{info, warn};

use crate::error::BackendError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Before the first session check resolves.
    Unknown,
    Authenticated,
    Unauthenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginError {
    InvalidPassword,
    Unreachable,
}

impl LoginError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidPassword => "Incorrect password.",
            Self::Unreachable => "Cannot connect to the server.",
        }
    }
}

#[derive(Debug)]
pub struct SessionGate {
    state: SessionState,
    password: String,
    error: Option<LoginError>,
    logging_in: bool,
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionGate {
    pub fn new() -> Self {
        Self {
            state: SessionState::Unknown,
            password: String::new(),
            error: None,
            logging_in: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    pub fn login_error(&self) -> Option<LoginError> {
        self.error
    }

    pub fn is_logging_in(&self) -> bool {
        self.logging_in
    }

    pub fn can_submit(&self) -> bool {
        !self.logging_in && !self.password.is_empty() && !self.is_authenticated()
    }

    /// Any failure, transport included, lands in `Unauthenticated`.
    pub(crate) fn finish_check(&mut self, result: Result<bool, BackendError>) -> SessionState {
        self.state = match result {
            Ok(true) => SessionState::Authenticated,
            Ok(false) => SessionState::Unauthenticated,
            Err(e) => {
                warn!("session check failed: {e}");
                SessionState::Unauthenticated
            }
        };
        self.state
    }

    /// Hands out the credential to submit, or `None` when a login is already
    /// in flight or nothing was typed.
    pub(crate) fn begin_login(&mut self) -> Option<String> {
        if !self.can_submit() {
            return None;
        }
        self.logging_in = true;
        self.error = None;
        Some(self.password.clone())
    }

    /// Returns true when the login just authenticated the session.
    pub(crate) fn finish_login(&mut self, result: Result<bool, BackendError>) -> bool {
        self.logging_in = false;
        match result {
            Ok(true) => {
                info!("dashboard login succeeded");
                self.state = SessionState::Authenticated;
                self.password.clear();
                self.error = None;
                true
            }
            Ok(false) | Err(BackendError::Unauthorized | BackendError::Rejected { .. }) => {
                self.state = SessionState::Unauthenticated;
                self.error = Some(LoginError::InvalidPassword);
                false
            }
            Err(e) => {
                warn!("login request failed: {e}");
                self.state = SessionState::Unauthenticated;
                self.error = Some(LoginError::Unreachable);
                false
            }
        }
    }

    pub(crate) fn sign_out(&mut self) {
        self.state = SessionState::Unauthenticated;
        self.password.clear();
        self.error = None;
        self.logging_in = false;
    }
}
