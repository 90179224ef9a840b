//! Per-app authentication config dialog.

use mcphub_api::{AuthConfig, AuthType, StoredAuthConfig};
use tracing::warn;

use crate::error::BackendError;

/// Random bytes behind a generated API key (hex-encoded, 48 characters).
pub const GENERATED_KEY_BYTES: usize = 24;

/// Hex-encoded key from the OS cryptographic RNG.
pub fn generate_api_key() -> Result<String, getrandom::Error> {
    let mut bytes = [0u8; GENERATED_KEY_BYTES];
    getrandom::getrandom(&mut bytes)?;
    Ok(hex::encode(bytes))
}

/// Editable copy of an app's auth config. Fields of the unselected modes are
/// kept while editing but never submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthConfigDraft {
    pub auth_type: AuthType,
    pub api_key: String,
    pub tenant_id: String,
    pub client_id: String,
}

impl AuthConfigDraft {
    pub fn from_stored(stored: StoredAuthConfig) -> Self {
        Self {
            auth_type: stored.auth_type,
            api_key: stored.api_key.unwrap_or_default(),
            tenant_id: stored.tenant_id.unwrap_or_default(),
            client_id: stored.client_id.unwrap_or_default(),
        }
    }

    pub fn to_config(&self) -> AuthConfig {
        match self.auth_type {
            AuthType::None => AuthConfig::None,
            AuthType::ApiKey => AuthConfig::ApiKey {
                api_key: self.api_key.clone(),
            },
            AuthType::EntraId => AuthConfig::EntraId {
                tenant_id: self.tenant_id.clone(),
                client_id: self.client_id.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorPhase {
    Closed,
    Loading,
    Ready,
    Saving,
}

#[derive(Debug)]
pub struct AuthEditor {
    app: Option<String>,
    phase: EditorPhase,
    draft: AuthConfigDraft,
    error: Option<String>,
    ticket: u64,
}

impl Default for AuthEditor {
    fn default() -> Self {
        Self {
            app: None,
            phase: EditorPhase::Closed,
            draft: AuthConfigDraft::default(),
            error: None,
            ticket: 0,
        }
    }
}

impl AuthEditor {
    pub fn phase(&self) -> EditorPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase != EditorPhase::Closed
    }

    pub fn app(&self) -> Option<&str> {
        self.app.as_deref()
    }

    pub fn draft(&self) -> &AuthConfigDraft {
        &self.draft
    }

    /// Only a loaded, idle dialog is editable.
    pub fn draft_mut(&mut self) -> Option<&mut AuthConfigDraft> {
        (self.phase == EditorPhase::Ready).then_some(&mut self.draft)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn open(&mut self, app: &str) -> u64 {
        self.ticket += 1;
        self.app = Some(app.to_string());
        self.phase = EditorPhase::Loading;
        self.draft = AuthConfigDraft::default();
        self.error = None;
        self.ticket
    }

    /// A failed load leaves the dialog open on the default draft.
    pub(crate) fn loaded(&mut self, ticket: u64, result: Result<StoredAuthConfig, BackendError>) -> bool {
        if ticket != self.ticket || self.phase != EditorPhase::Loading {
            return false;
        }
        match result {
            Ok(stored) => self.draft = AuthConfigDraft::from_stored(stored),
            Err(e) => warn!(app = ?self.app, "failed to load auth config: {e}"),
        }
        self.phase = EditorPhase::Ready;
        true
    }

    pub(crate) fn begin_save(&mut self) -> Option<(String, AuthConfig, u64)> {
        if self.phase != EditorPhase::Ready {
            return None;
        }
        let app = self.app.clone()?;
        self.ticket += 1;
        self.phase = EditorPhase::Saving;
        self.error = None;
        Some((app, self.draft.to_config(), self.ticket))
    }

    /// Returns true when the save succeeded and the dialog closed.
    pub(crate) fn saved(&mut self, ticket: u64, result: Result<(), BackendError>) -> bool {
        if ticket != self.ticket || self.phase != EditorPhase::Saving {
            return false;
        }
        match result {
            Ok(()) => {
                self.close();
                true
            }
            Err(e) => {
                warn!(app = ?self.app, "failed to save auth config: {e}");
                self.phase = EditorPhase::Ready;
                self.error = Some(format!("Failed to save: {e}"));
                false
            }
        }
    }

    /// Close without saving. Any result still in flight is ignored.
    pub(crate) fn close(&mut self) {
        self.ticket += 1;
        self.app = None;
        self.phase = EditorPhase::Closed;
        self.draft = AuthConfigDraft::default();
        self.error = None;
    }
}
