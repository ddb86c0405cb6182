use std::io::BufRead;
use std::sync::Arc;

use crate::error::ReplayError;
use crate::events::BuildEvent;
use crate::sink::{BuildEventSink, EventSource};

/// Iterator over JSON-lines encoded [`BuildEvent`]s.
///
/// Blank lines and lines starting with `#` are skipped. Line numbers in
/// errors are 1-based.
pub struct EventReader<R> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl<R: BufRead> EventReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for EventReader<R> {
    type Item = Result<BuildEvent, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(ReplayError::Io(e))),
            }
            self.line_no += 1;

            let line = self.buf.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            return Some(
                serde_json::from_str(line).map_err(|source| ReplayError::Parse {
                    line: self.line_no,
                    source,
                }),
            );
        }
    }
}

/// An [`EventSource`] that replays a recorded event stream.
///
/// Events are delivered in file order, on the calling thread, to every
/// subscribed sink.
pub struct ReplaySource<R> {
    events: EventReader<R>,
    sinks: Vec<Arc<dyn BuildEventSink>>,
}

impl<R: BufRead> ReplaySource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            events: EventReader::new(reader),
            sinks: Vec::new(),
        }
    }

    /// Deliver every event. Stops at the first unreadable line; events
    /// before it have already been delivered. Returns the number of events
    /// delivered.
    pub fn run(mut self) -> Result<usize, ReplayError> {
        let mut delivered = 0;
        for event in self.events.by_ref() {
            let event = event?;
            for sink in &self.sinks {
                sink.dispatch(event.clone());
            }
            delivered += 1;
        }
        tracing::debug!(delivered, sinks = self.sinks.len(), "replay complete");
        Ok(delivered)
    }
}

impl<R: BufRead> EventSource for ReplaySource<R> {
    fn subscribe(&mut self, sink: Arc<dyn BuildEventSink>) {
        self.sinks.push(sink);
    }
}
