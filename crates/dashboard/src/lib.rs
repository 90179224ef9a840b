//! Client-side state for the mcphub dashboard: session gate, app roster with
//! periodic refresh, log and password reveals, the per-app auth-config
//! editor, and rebuild log streaming.
//!
//! The state machines are plain structs. [`Dashboard`] owns them, starts
//! backend work as tokio tasks, and applies completions one at a time.

pub mod actions;
pub mod auth_editor;
pub mod backend;
mod dashboard;
pub mod error;
pub mod events;
pub mod rebuild;
pub mod reveal;
pub mod roster;
pub mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use actions::{AppAction, ConfirmAction, CreateDialog, Notice, NoticeLevel};
pub use auth_editor::{AuthConfigDraft, AuthEditor, EditorPhase};
pub use backend::{ApiBackend, Backend, BuildFeed};
pub use dashboard::{Dashboard, DashboardOptions};
pub use error::BackendError;
pub use rebuild::{RebuildController, RebuildOutcome, RebuildSession};
pub use reveal::{RevealKind, RevealStore, Revealed};
pub use roster::Roster;
pub use session::{LoginError, SessionGate, SessionState};
