use anyhow::{bail, Result};
use mcphub_api::{REBUILD_DONE_EVENT, REBUILD_SUCCESS};
use mcphub_api_client::SseEvent;
use tracing::debug;

use crate::connect::Session;

#[derive(Debug, PartialEq, Eq)]
enum Step {
    Line(String),
    Done { success: bool },
    Skip,
}

fn classify(event: SseEvent) -> Step {
    if event.is_named(REBUILD_DONE_EVENT) {
        Step::Done {
            success: event.data == REBUILD_SUCCESS,
        }
    } else if event.is_message() {
        Step::Line(event.data)
    } else {
        Step::Skip
    }
}

/// Stream build output to stdout. Succeeds only when the backend reports
/// `success`; a stream that ends early counts as a failure.
pub async fn run(session: &Session, app: &str) -> Result<()> {
    let mut stream = session.client.rebuild(app).await?;
    eprintln!("Rebuilding {app}...");
    loop {
        let Some(event) = stream.next_event().await? else {
            bail!("Connection error: stream closed before the build finished");
        };
        match classify(event) {
            Step::Line(line) => println!("{line}"),
            Step::Done { success: true } => {
                eprintln!("Build succeeded");
                return Ok(());
            }
            Step::Done { success: false } => bail!("Build failed for {app}"),
            Step::Skip => debug!("ignoring unknown rebuild event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unnamed_events_are_log_lines() {
        assert_eq!(
            classify(SseEvent::message("Step 1/4")),
            Step::Line("Step 1/4".to_string())
        );
    }

    #[test]
    fn done_payload_decides_outcome() {
        assert_eq!(
            classify(SseEvent::named("done", "success")),
            Step::Done { success: true }
        );
        assert_eq!(
            classify(SseEvent::named("done", "error")),
            Step::Done { success: false }
        );
        assert_eq!(classify(SseEvent::named("ping", "")), Step::Skip);
    }
}
