use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;

use buildlog_core::diagnostic::Diagnostic;
use buildlog_core::events::BuildEvent;
use buildlog_core::sink::{BuildEventSink, EventSource};

/// Create a spinner for builds whose project count is not known up front.
///
/// Uses a consistent style: `{spinner} {pos} projects finished {msg}`
pub fn create_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {pos} projects finished {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb
}

/// Sink that shows progress as a live spinner and forwards every callback
/// to an inner sink. The inner logger should have inline markers disabled.
pub struct BarProgress {
    inner: Arc<dyn BuildEventSink>,
    pb: ProgressBar,
}

impl BarProgress {
    pub fn new(inner: Arc<dyn BuildEventSink>) -> Self {
        Self {
            inner,
            pb: create_spinner(),
        }
    }
}

impl BuildEventSink for BarProgress {
    fn build_started(&self, message: &str) {
        self.inner.build_started(message);
        self.pb.enable_steady_tick(Duration::from_millis(100));
    }

    fn build_finished(&self, succeeded: bool) {
        // Clear the spinner first so the summary is not drawn over.
        self.pb.finish_and_clear();
        self.inner.build_finished(succeeded);
    }

    fn project_finished(&self, succeeded: bool) {
        self.inner.project_finished(succeeded);
        self.pb.inc(1);
        if !succeeded {
            self.pb.set_message("(with failures)");
        }
    }

    fn error_raised(&self, diagnostic: Diagnostic) {
        self.inner.error_raised(diagnostic);
    }

    fn warning_raised(&self, diagnostic: Diagnostic) {
        self.inner.warning_raised(diagnostic);
    }
}

/// Event source fed from a channel and delivered by concurrent workers.
///
/// Project and diagnostic events are handed to up to `jobs` tasks at once,
/// the way a parallel build host calls its loggers from many worker threads.
/// Build start and finish are barriers: every in-flight event is delivered
/// before them.
pub struct ChannelSource {
    rx: mpsc::UnboundedReceiver<BuildEvent>,
    sinks: Vec<Arc<dyn BuildEventSink>>,
    jobs: usize,
}

/// What a dispatch run observed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub delivered: usize,
    /// Outcome reported by the last build-finished event, if any.
    pub build_succeeded: Option<bool>,
}

impl ChannelSource {
    pub fn new(rx: mpsc::UnboundedReceiver<BuildEvent>, jobs: usize) -> Self {
        Self {
            rx,
            sinks: Vec::new(),
            jobs: jobs.max(1),
        }
    }

    /// Deliver events until the channel closes.
    pub async fn run(mut self) -> Result<DispatchOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.jobs));
        let sinks: Arc<[Arc<dyn BuildEventSink>]> = self.sinks.into();
        let mut in_flight = JoinSet::new();
        let mut outcome = DispatchOutcome::default();

        while let Some(event) = self.rx.recv().await {
            outcome.delivered += 1;

            if event.is_boundary() {
                while let Some(joined) = in_flight.join_next().await {
                    joined?;
                }
                if let BuildEvent::BuildFinished { succeeded } = event {
                    outcome.build_succeeded = Some(succeeded);
                }
                deliver(&sinks, event);
                continue;
            }

            while let Some(joined) = in_flight.try_join_next() {
                joined?;
            }
            let permit = Arc::clone(&semaphore).acquire_owned().await?;
            let sinks = Arc::clone(&sinks);
            in_flight.spawn(async move {
                deliver(&sinks, event);
                drop(permit);
            });
        }

        while let Some(joined) = in_flight.join_next().await {
            joined?;
        }
        Ok(outcome)
    }
}

impl EventSource for ChannelSource {
    fn subscribe(&mut self, sink: Arc<dyn BuildEventSink>) {
        self.sinks.push(sink);
    }
}

fn deliver(sinks: &[Arc<dyn BuildEventSink>], event: BuildEvent) {
    for sink in sinks {
        sink.dispatch(event.clone());
    }
}
