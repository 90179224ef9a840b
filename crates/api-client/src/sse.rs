//! Incremental decoder for `text/event-stream` bodies.
//!
//! Bytes arrive in arbitrary chunks; complete events are returned in arrival
//! order. Only the `event` and `data` fields matter to the dashboard, `id` and
//! `retry` are accepted and ignored.

/// One dispatched server-push event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// `None` for unnamed events (delivered as `message` by browsers).
    pub event: Option<String>,
    pub data: String,
}

impl SseEvent {
    pub fn message(data: impl Into<String>) -> Self {
        Self {
            event: None,
            data: data.into(),
        }
    }

    pub fn named(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: Some(event.into()),
            data: data.into(),
        }
    }

    pub fn is_message(&self) -> bool {
        matches!(self.event.as_deref(), None | Some("message"))
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.event.as_deref() == Some(name)
    }
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    /// Prefix of `buf` already known to hold no line terminator.
    scanned: usize,
    /// The last line ended in `\r` at a chunk boundary; a leading `\n` in
    /// the next chunk belongs to it.
    skip_lf: bool,
    event: Option<String>,
    data: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect every event it completes. Lines end in
    /// `\n`, `\r\n` or a lone `\r`.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut chunk = chunk;
        if self.skip_lf && !chunk.is_empty() {
            self.skip_lf = false;
            if chunk[0] == b'\n' {
                chunk = &chunk[1..];
            }
        }
        self.buf.extend_from_slice(chunk);

        let mut out = Vec::new();
        let mut start = 0;
        while let Some(rel) = self.buf[self.scanned..]
            .iter()
            .position(|b| matches!(b, b'\n' | b'\r'))
        {
            let end = self.scanned + rel;
            let mut next = end + 1;
            if self.buf[end] == b'\r' {
                match self.buf.get(next) {
                    Some(b'\n') => next += 1,
                    Some(_) => {}
                    None => self.skip_lf = true,
                }
            }
            let line = String::from_utf8_lossy(&self.buf[start..end]).into_owned();
            start = next;
            self.scanned = next;
            if let Some(event) = self.process_line(&line) {
                out.push(event);
            }
        }
        self.buf.drain(..start);
        self.scanned = self.buf.len();
        out
    }

    /// Bytes buffered after the last complete line. A trailing event without
    /// its blank-line terminator is never dispatched.
    pub fn has_partial(&self) -> bool {
        !self.buf.is_empty() || self.data.is_some()
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => match self.data {
                Some(ref mut data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.data = Some(value.to_string()),
            },
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take().filter(|name| !name.is_empty());
        let data = self.data.take()?;
        Some(SseEvent { event, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unnamed_and_named_events_in_order() {
        let mut decoder = SseDecoder::new();
        let events =
            decoder.push(b"data: Step 1/5\n\ndata: Step 2/5\n\nevent: done\ndata: success\n\n");
        assert_eq!(
            events,
            vec![
                SseEvent::message("Step 1/5"),
                SseEvent::message("Step 2/5"),
                SseEvent::named("done", "success"),
            ]
        );
        assert!(events[0].is_message());
        assert!(events[2].is_named("done"));
        assert!(!decoder.has_partial());
    }

    #[test]
    fn events_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"da").is_empty());
        assert!(decoder.push(b"ta: hel").is_empty());
        assert!(decoder.push(b"lo\r\n").is_empty());
        assert!(decoder.has_partial());
        assert_eq!(decoder.push(b"\r\n"), vec![SseEvent::message("hello")]);
    }

    #[test]
    fn lone_carriage_returns_end_lines() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: one\r\revent: done\rdata: success\r\r");
        assert_eq!(
            events,
            vec![SseEvent::message("one"), SseEvent::named("done", "success")]
        );
    }

    #[test]
    fn crlf_split_between_chunks_is_one_break() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: a\r").is_empty());
        assert!(decoder.push(b"\ndata: b\r").is_empty());
        assert!(decoder.push(b"\n").is_empty());
        assert_eq!(decoder.push(b"\r\n"), vec![SseEvent::message("a\nb")]);
    }

    #[test]
    fn long_line_across_many_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: ").is_empty());
        for _ in 0..2000 {
            assert!(decoder.push(b"xxxxxxxx").is_empty());
        }
        let events = decoder.push(b"\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data.len(), 16_000);
        assert!(!decoder.has_partial());
    }

    #[test]
    fn comments_and_unknown_fields_are_ignored() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b": keep-alive\nid: 7\nretry: 1000\ndata:x\n\n");
        assert_eq!(events, vec![SseEvent::message("x")]);
    }

    #[test]
    fn multiline_data_joins_with_newline() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: a\ndata: b\n\n");
        assert_eq!(events, vec![SseEvent::message("a\nb")]);
    }

    #[test]
    fn empty_data_line_is_still_an_event() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data:\n\n\n");
        assert_eq!(events, vec![SseEvent::message("")]);
    }

    #[test]
    fn blank_line_without_data_dispatches_nothing() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: done\n\n").is_empty());
        // The dangling event name must not leak into the next event.
        assert_eq!(decoder.push(b"data: x\n\n"), vec![SseEvent::message("x")]);
    }

    #[test]
    fn data_keeps_inner_colons_and_extra_spaces() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data:  #5 [2/4] RUN pip install: ok\n\n");
        assert_eq!(events, vec![SseEvent::message(" #5 [2/4] RUN pip install: ok")]);
    }
}
