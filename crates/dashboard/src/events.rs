use mcphub_api::{ActionResponse, AppSummary, PasswordResponse, StoredAuthConfig};
use tokio::sync::mpsc;

use crate::actions::AppAction;
use crate::error::BackendError;
use crate::reveal::{RevealKind, Revealed};

pub type EventSender = mpsc::UnboundedSender<DashEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<DashEvent>;

/// Completion of background work, applied on the owning task by
/// `Dashboard::apply`. Results tagged with a stale sequence number, ticket
/// or generation are dropped there.
#[derive(Debug)]
pub enum DashEvent {
    SessionChecked(Result<bool, BackendError>),
    LoginFinished(Result<bool, BackendError>),
    RosterFetched {
        seq: u64,
        result: Result<Vec<AppSummary>, BackendError>,
    },
    ActionFinished {
        action: AppAction,
        app: String,
        result: Result<ActionResponse, BackendError>,
    },
    RevealFetched {
        kind: RevealKind,
        app: String,
        ticket: u64,
        value: Revealed,
    },
    PasswordReset {
        app: String,
        result: Result<PasswordResponse, BackendError>,
    },
    AuthConfigLoaded {
        ticket: u64,
        result: Result<StoredAuthConfig, BackendError>,
    },
    AuthConfigSaved {
        ticket: u64,
        result: Result<ActionResponse, BackendError>,
    },
    Rebuild {
        generation: u64,
        update: RebuildUpdate,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildUpdate {
    /// One unnamed `data` frame.
    Line(String),
    /// The terminal `done` frame and its payload.
    Done(String),
    /// The connection failed or closed before `done`.
    TransportError(String),
}
