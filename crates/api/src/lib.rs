//! Shared API types for the mcphub dashboard backend.
//!
//! This crate is the **single source of truth** for request/response shapes
//! exchanged with the orchestrator's `/api` surface. The HTTP client, the
//! dashboard state machines and the CLI all speak these types.

use serde::{Deserialize, Serialize};

/// Raw status prefix the orchestrator reports for a live container (`Up 2 hours`).
pub const RUNNING_STATUS_PREFIX: &str = "Up";

/// Name of the server-push event that ends a rebuild stream.
pub const REBUILD_DONE_EVENT: &str = "done";

/// `done` payload that marks a successful rebuild. Anything else is a failure.
pub const REBUILD_SUCCESS: &str = "success";

/// Port the reverse proxy publishes app IDEs on when nothing else is configured.
pub const DEFAULT_IDE_PORT: u16 = 8085;

/// An app is running iff its raw status text begins with `Up`.
pub fn is_running(status: &str) -> bool {
    status.starts_with(RUNNING_STATUS_PREFIX)
}

// ─── Shared Enums ────────────────────────────────────────────────────────────

/// Per-app authentication mode enforced by the reverse proxy.
///
/// Serialized as the backend's raw strings. Unknown values read as [`AuthType::None`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuthType {
    #[default]
    None,
    /// Shared secret passed in the `X-API-Key` header.
    ApiKey,
    /// Federated identity (Microsoft Entra ID bearer tokens).
    EntraId,
}

impl AuthType {
    pub const ALL: [AuthType; 3] = [AuthType::None, AuthType::ApiKey, AuthType::EntraId];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ApiKey => "api_key",
            Self::EntraId => "entra_id",
        }
    }

    /// Badge text shown next to an app. `None` has no badge.
    pub fn badge(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::ApiKey => Some("API Key"),
            Self::EntraId => Some("Entra ID"),
        }
    }

    /// Human-readable label used by mode pickers.
    pub fn display(&self) -> &'static str {
        match self {
            Self::None => "No auth (public)",
            Self::ApiKey => "API Key",
            Self::EntraId => "Microsoft Entra ID (JWT)",
        }
    }

    pub fn cycle(&self) -> Self {
        match self {
            Self::None => Self::ApiKey,
            Self::ApiKey => Self::EntraId,
            Self::EntraId => Self::None,
        }
    }
}

impl From<&str> for AuthType {
    fn from(value: &str) -> Self {
        match value {
            "api_key" => Self::ApiKey,
            "entra_id" => Self::EntraId,
            _ => Self::None,
        }
    }
}

impl From<String> for AuthType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<AuthType> for String {
    fn from(value: AuthType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for AuthType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Roster ──────────────────────────────────────────────────────────────────

/// One entry of `GET /api/apps`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSummary {
    pub name: String,
    /// Raw container status text, displayed verbatim when not running.
    pub status: String,
    #[serde(default)]
    pub auth_type: AuthType,
}

impl AppSummary {
    pub fn is_running(&self) -> bool {
        is_running(&self.status)
    }

    /// Status badge text: `Running` for live containers, the raw status otherwise.
    pub fn status_label(&self) -> &str {
        if self.is_running() {
            "Running"
        } else {
            &self.status
        }
    }

    /// Label of the deploy action for this app.
    pub fn deploy_label(&self) -> &'static str {
        if self.is_running() { "Restart" } else { "Deploy" }
    }
}

// ─── Auth ────────────────────────────────────────────────────────────────────

/// Dashboard login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// `{"status":"ok"}` on success, `{"error": ...}` otherwise.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoginResponse {
    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("ok")
    }
}

// ─── App actions ─────────────────────────────────────────────────────────────

/// Body returned by deploy/stop/delete/create. Only the HTTP status decides
/// success; `error` is informational.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response of `GET /api/password/{name}` and its reset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PasswordResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ─── Per-app auth config ─────────────────────────────────────────────────────

/// Body of `POST /api/apps/{name}/auth`; only the fields of the selected mode
/// are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "auth_type")]
pub enum AuthConfig {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "api_key")]
    ApiKey { api_key: String },
    #[serde(rename = "entra_id")]
    EntraId { tenant_id: String, client_id: String },
}

impl AuthConfig {
    pub fn auth_type(&self) -> AuthType {
        match self {
            Self::None => AuthType::None,
            Self::ApiKey { .. } => AuthType::ApiKey,
            Self::EntraId { .. } => AuthType::EntraId,
        }
    }
}

/// Envelope of `GET /api/apps/{name}/auth`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfigResponse {
    #[serde(default)]
    pub auth: StoredAuthConfig,
}

/// Stored config as the backend reports it. Every field may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredAuthConfig {
    #[serde(default)]
    pub auth_type: AuthType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

// ─── Deep links ──────────────────────────────────────────────────────────────

/// Build the "Open Web IDE" link for `app`: the backend's host, the proxy port,
/// and the `/{app}-ide/` route.
pub fn ide_url(server_url: &str, ide_port: u16, app: &str) -> Option<String> {
    let parsed = url::Url::parse(server_url).ok()?;
    // `host_str` keeps the brackets around IPv6 literals.
    let host = parsed.host_str()?;
    Some(format!("http://{host}:{ide_port}/{app}-ide/"))
}
