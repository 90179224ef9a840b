//! Rebuild log streaming.
//!
//! At most one rebuild session exists. Starting another closes the previous
//! transport before the new one opens, and every event is tagged with the
//! generation that opened it so a late frame from a closed stream never
//! touches the current session.

use std::sync::Arc;

use mcphub_api::{REBUILD_DONE_EVENT, REBUILD_SUCCESS};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::{Backend, BuildFeed};
use crate::events::{DashEvent, EventSender, RebuildUpdate};

/// Appended to the log when the transport fails mid-build.
pub const CONNECTION_ERROR_LINE: &str = "Connection error";
pub const WAITING_FOR_OUTPUT: &str = "Waiting for build output...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    Building,
    Success,
    Failed,
}

impl RebuildOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Building)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Building => "Building...",
            Self::Success => "Build succeeded",
            Self::Failed => "Build failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildSession {
    pub app_name: String,
    pub log_lines: Vec<String>,
    pub outcome: RebuildOutcome,
}

/// What applying an update did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildEffect {
    Ignored,
    Appended,
    /// The session reached a terminal outcome; refresh the roster.
    Finished(RebuildOutcome),
}

#[derive(Debug, Default)]
pub struct RebuildController {
    session: Option<RebuildSession>,
    transport: Option<JoinHandle<()>>,
    generation: u64,
}

impl RebuildController {
    pub fn session(&self) -> Option<&RebuildSession> {
        self.session.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_building(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.outcome == RebuildOutcome::Building)
    }

    pub fn is_building_app(&self, app: &str) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.outcome == RebuildOutcome::Building && s.app_name == app)
    }

    /// True while a stream task is still attached and running.
    pub fn transport_open(&self) -> bool {
        self.transport.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn can_retry(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.outcome == RebuildOutcome::Failed)
    }

    pub fn can_dismiss(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.outcome.is_terminal())
    }

    /// Supersede any previous session. Returns the generation for the new
    /// stream, or `None` when `app` is already building.
    pub(crate) fn begin(&mut self, app: &str) -> Option<u64> {
        if self.is_building_app(app) {
            return None;
        }
        self.close_transport();
        self.generation += 1;
        self.session = Some(RebuildSession {
            app_name: app.to_string(),
            log_lines: Vec::new(),
            outcome: RebuildOutcome::Building,
        });
        Some(self.generation)
    }

    pub(crate) fn attach(&mut self, handle: JoinHandle<()>) {
        self.close_transport();
        self.transport = Some(handle);
    }

    pub(crate) fn apply(&mut self, generation: u64, update: RebuildUpdate) -> RebuildEffect {
        if generation != self.generation {
            debug!(generation, current = self.generation, "dropping rebuild event from closed stream");
            return RebuildEffect::Ignored;
        }
        let Some(session) = self.session.as_mut() else {
            return RebuildEffect::Ignored;
        };
        if session.outcome.is_terminal() {
            return RebuildEffect::Ignored;
        }

        let outcome = match update {
            RebuildUpdate::Line(line) => {
                session.log_lines.push(line);
                return RebuildEffect::Appended;
            }
            RebuildUpdate::Done(payload) => {
                let outcome = if payload == REBUILD_SUCCESS {
                    RebuildOutcome::Success
                } else {
                    RebuildOutcome::Failed
                };
                info!(app = %session.app_name, %payload, "rebuild finished");
                outcome
            }
            RebuildUpdate::TransportError(reason) => {
                warn!(app = %session.app_name, "rebuild stream failed: {reason}");
                session.log_lines.push(CONNECTION_ERROR_LINE.to_string());
                RebuildOutcome::Failed
            }
        };
        session.outcome = outcome;
        self.close_transport();
        RebuildEffect::Finished(outcome)
    }

    /// Close the overlay. Refused while the build is running.
    pub(crate) fn dismiss(&mut self) -> bool {
        if !self.can_dismiss() {
            return false;
        }
        self.close_transport();
        self.session = None;
        true
    }

    /// Drop the session and its transport unconditionally (logout).
    pub(crate) fn reset(&mut self) {
        self.close_transport();
        self.generation += 1;
        self.session = None;
    }

    fn close_transport(&mut self) {
        if let Some(handle) = self.transport.take() {
            handle.abort();
        }
    }
}

impl Drop for RebuildController {
    fn drop(&mut self) {
        self.close_transport();
    }
}

/// Forward one rebuild stream into the event channel until `done`, a
/// transport failure, or the receiver goes away. The feed is dropped on
/// return, which closes the connection.
pub(crate) async fn pump<B: Backend>(backend: Arc<B>, app: String, generation: u64, tx: EventSender) {
    let send = |update: RebuildUpdate| tx.send(DashEvent::Rebuild { generation, update }).is_ok();

    let mut feed = match backend.open_rebuild(&app).await {
        Ok(feed) => feed,
        Err(e) => {
            send(RebuildUpdate::TransportError(e.to_string()));
            return;
        }
    };

    loop {
        match feed.recv().await {
            Ok(Some(event)) if event.is_named(REBUILD_DONE_EVENT) => {
                send(RebuildUpdate::Done(event.data));
                return;
            }
            Ok(Some(event)) if event.is_message() => {
                if !send(RebuildUpdate::Line(event.data)) {
                    return;
                }
            }
            Ok(Some(event)) => debug!(event = ?event.event, "ignoring unknown rebuild event"),
            Ok(None) => {
                send(RebuildUpdate::TransportError(
                    "stream closed before completion".to_string(),
                ));
                return;
            }
            Err(e) => {
                send(RebuildUpdate::TransportError(e.to_string()));
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(app: &str) -> (RebuildController, u64) {
        let mut ctl = RebuildController::default();
        let generation = ctl.begin(app).unwrap();
        (ctl, generation)
    }

    #[test]
    fn lines_append_in_order_until_done() {
        let (mut ctl, g) = started("a");
        assert_eq!(ctl.apply(g, RebuildUpdate::Line("one".into())), RebuildEffect::Appended);
        assert_eq!(ctl.apply(g, RebuildUpdate::Line("two".into())), RebuildEffect::Appended);
        assert_eq!(
            ctl.apply(g, RebuildUpdate::Done(REBUILD_SUCCESS.into())),
            RebuildEffect::Finished(RebuildOutcome::Success)
        );
        let session = ctl.session().unwrap();
        assert_eq!(session.log_lines, vec!["one", "two"]);
        assert_eq!(session.outcome, RebuildOutcome::Success);
    }

    #[test]
    fn any_other_done_payload_is_failure() {
        for payload in ["failed", "", "Success", "error: exit 1"] {
            let (mut ctl, g) = started("a");
            assert_eq!(
                ctl.apply(g, RebuildUpdate::Done(payload.into())),
                RebuildEffect::Finished(RebuildOutcome::Failed)
            );
        }
    }

    #[test]
    fn transport_error_appends_one_marker_and_is_sticky() {
        let (mut ctl, g) = started("a");
        ctl.apply(g, RebuildUpdate::Line("step".into()));
        ctl.apply(g, RebuildUpdate::TransportError("reset".into()));
        ctl.apply(g, RebuildUpdate::TransportError("again".into()));
        ctl.apply(g, RebuildUpdate::Line("late".into()));

        let session = ctl.session().unwrap();
        assert_eq!(session.outcome, RebuildOutcome::Failed);
        assert_eq!(session.log_lines, vec!["step", CONNECTION_ERROR_LINE]);
    }

    #[test]
    fn dismiss_refused_while_building() {
        let (mut ctl, g) = started("a");
        assert!(!ctl.can_dismiss());
        assert!(!ctl.dismiss());
        assert!(ctl.session().is_some());

        ctl.apply(g, RebuildUpdate::Done("failed".into()));
        assert!(ctl.can_retry());
        assert!(ctl.dismiss());
        assert!(ctl.session().is_none());
    }

    #[test]
    fn restarting_the_same_building_app_is_refused() {
        let (mut ctl, _) = started("a");
        assert!(ctl.begin("a").is_none());
        assert!(ctl.begin("b").is_some());
    }

    #[test]
    fn superseded_generation_is_ignored() {
        let (mut ctl, old) = started("a");
        let new = ctl.begin("b").unwrap();
        assert_eq!(ctl.apply(old, RebuildUpdate::Line("stale".into())), RebuildEffect::Ignored);
        assert_eq!(ctl.apply(old, RebuildUpdate::Done(REBUILD_SUCCESS.into())), RebuildEffect::Ignored);
        let session = ctl.session().unwrap();
        assert_eq!(session.app_name, "b");
        assert!(session.log_lines.is_empty());
        assert_eq!(session.outcome, RebuildOutcome::Building);
        ctl.apply(new, RebuildUpdate::Line("fresh".into()));
        assert_eq!(ctl.session().unwrap().log_lines, vec!["fresh"]);
    }
}
