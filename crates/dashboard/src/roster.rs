//! App roster and its periodic refresh.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use mcphub_api::AppSummary;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::backend::Backend;
use crate::events::{DashEvent, EventSender};

/// Issues strictly increasing fetch sequence numbers. Shared between the
/// dashboard and its poll task so both draw from one counter.
#[derive(Debug, Clone, Default)]
pub struct FetchSequencer(Arc<AtomicU64>);

impl FetchSequencer {
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn issued(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
pub struct Roster {
    apps: Vec<AppSummary>,
    sequencer: FetchSequencer,
    /// Fetches numbered at or below this are stale.
    applied: u64,
    poll: Option<PollHandle>,
}

impl Roster {
    pub fn apps(&self) -> &[AppSummary] {
        &self.apps
    }

    pub fn get(&self, name: &str) -> Option<&AppSummary> {
        self.apps.iter().find(|a| a.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.get(name).is_some_and(AppSummary::is_running)
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_some()
    }

    pub(crate) fn sequencer(&self) -> FetchSequencer {
        self.sequencer.clone()
    }

    pub(crate) fn next_seq(&self) -> u64 {
        self.sequencer.next()
    }

    pub(crate) fn is_current(&self, seq: u64) -> bool {
        seq > self.applied
    }

    /// Replace the roster wholesale if `seq` is newer than the last applied
    /// fetch. Returns false for stale results.
    pub(crate) fn apply(&mut self, seq: u64, apps: Vec<AppSummary>) -> bool {
        if !self.is_current(seq) {
            debug!(seq, applied = self.applied, "dropping stale roster fetch");
            return false;
        }
        self.applied = seq;
        self.apps = apps;
        true
    }

    pub(crate) fn set_poll(&mut self, handle: PollHandle) {
        self.poll = Some(handle);
    }

    /// Stop polling, empty the roster and invalidate every fetch issued so far.
    pub(crate) fn reset(&mut self) {
        self.poll = None;
        self.apps.clear();
        self.applied = self.sequencer.issued();
    }
}

/// Owns the poll task; dropping it stops polling.
#[derive(Debug)]
pub struct PollHandle(JoinHandle<()>);

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Fetch the roster every `period`, measured from tick start. A tick that
/// fires while the previous fetch is still outstanding is skipped.
pub(crate) fn spawn_poller<B: Backend>(
    backend: Arc<B>,
    sequencer: FetchSequencer,
    tx: EventSender,
    period: Duration,
) -> PollHandle {
    PollHandle(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; the caller already fetched.
        ticker.tick().await;

        let mut outstanding: Option<JoinHandle<()>> = None;
        loop {
            ticker.tick().await;
            if tx.is_closed() {
                break;
            }
            if outstanding.as_ref().is_some_and(|h| !h.is_finished()) {
                debug!("skipping roster poll: previous fetch still outstanding");
                continue;
            }
            let seq = sequencer.next();
            let backend = Arc::clone(&backend);
            let tx = tx.clone();
            outstanding = Some(tokio::spawn(async move {
                let result = backend.list_apps().await;
                let _ = tx.send(DashEvent::RosterFetched { seq, result });
            }));
        }
    }))
}
