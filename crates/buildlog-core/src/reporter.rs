use std::fmt::Write as _;
use std::io::Write;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use colored::Colorize;

use crate::clock::{Clock, SystemClock};
use crate::config::{LoggerConfig, ProgressMode};
use crate::diagnostic::{Diagnostic, Severity};
use crate::sink::{self, BuildEventSink, EventSource};
use crate::state::{RunSnapshot, RunState};
use crate::summary::Summary;

/// Lifecycle of a [`BuildLogger`]. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Uninitialized = 0,
    Initialized = 1,
    Running = 2,
    Summarized = 3,
}

impl Phase {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Phase::Uninitialized,
            1 => Phase::Initialized,
            2 => Phase::Running,
            _ => Phase::Summarized,
        }
    }
}

/// Console build logger.
///
/// Aggregates project outcomes and diagnostics as callbacks arrive, writes an
/// inline progress marker per finished project, and prints a summary when
/// the build finishes. All callbacks take `&self`; share the logger across
/// host threads with an `Arc`.
pub struct BuildLogger<W: Write + Send> {
    state: RunState,
    out: Mutex<W>,
    config: LoggerConfig,
    color: bool,
    clock: Box<dyn Clock>,
    phase: AtomicU8,
}

impl<W: Write + Send> BuildLogger<W> {
    pub fn new(out: W, config: LoggerConfig, color: bool) -> Self {
        Self::with_clock(out, config, color, Box::new(SystemClock))
    }

    pub fn with_clock(out: W, config: LoggerConfig, color: bool, clock: Box<dyn Clock>) -> Self {
        Self {
            state: RunState::new(),
            out: Mutex::new(out),
            config,
            color,
            clock,
            phase: AtomicU8::new(Phase::Uninitialized as u8),
        }
    }

    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    /// Move forward to `next`; never moves backwards. Returns the previous phase.
    fn advance(&self, next: Phase) -> Phase {
        Phase::from_u8(self.phase.fetch_max(next as u8, Ordering::SeqCst))
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn snapshot(&self) -> RunSnapshot {
        self.state.snapshot()
    }

    /// Consume the logger and hand back its writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    /// Format `at` with the configured time format, falling back to
    /// `%H:%M:%S` when the format string is invalid.
    fn timestamp(&self, at: DateTime<Local>) -> String {
        let mut out = String::new();
        if write!(out, "{}", at.format(&self.config.time_format)).is_err() {
            return at.format("%H:%M:%S").to_string();
        }
        out
    }

    /// Write to the output stream. Output is best-effort: a closed or broken
    /// stream never disturbs aggregation.
    fn emit(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        let written = out.write_all(text.as_bytes());
        if let Err(e) = written.and_then(|()| out.flush()) {
            tracing::debug!(error = %e, "failed to write build output");
        }
    }

    fn marker(&self, succeeded: bool) -> String {
        let marker = if succeeded {
            self.config.success_marker.as_str()
        } else {
            self.config.failure_marker.as_str()
        };
        match (self.color, succeeded) {
            (false, _) => marker.to_string(),
            (true, true) => marker.green().to_string(),
            (true, false) => marker.red().to_string(),
        }
    }

    /// Render and write the end-of-run summary.
    pub fn print_summary(&self, build_succeeded: bool) -> Summary {
        let summary = Summary::from_snapshot(self.state.snapshot(), build_succeeded);
        let text = summary.render(&self.timestamp(self.clock.now()));
        self.emit(&text);
        summary
    }
}

impl<W: Write + Send + 'static> BuildLogger<W> {
    /// Subscribe this logger to `source`. A missing source leaves the logger
    /// uninitialized and is otherwise a no-op.
    pub fn initialize(self: &Arc<Self>, source: Option<&mut dyn EventSource>) -> bool {
        self.initialize_with(source, Arc::clone(self) as Arc<dyn BuildEventSink>)
    }

    /// Like [`initialize`](Self::initialize), but subscribes `front` in this
    /// logger's place. `front` is expected to forward events to this logger,
    /// e.g. a progress display that wraps it.
    pub fn initialize_with(
        self: &Arc<Self>,
        source: Option<&mut dyn EventSource>,
        front: Arc<dyn BuildEventSink>,
    ) -> bool {
        let subscribed = sink::initialize(source, front);
        if subscribed {
            self.advance(Phase::Initialized);
        }
        subscribed
    }
}

impl<W: Write + Send> BuildEventSink for BuildLogger<W> {
    fn build_started(&self, message: &str) {
        let now = self.clock.now();
        self.state.mark_started(now);
        self.advance(Phase::Running);
        tracing::debug!(%message, "build started");
        self.emit(&format!("\n{} > {}\n", self.timestamp(now), message));
    }

    fn build_finished(&self, succeeded: bool) {
        if self.advance(Phase::Summarized) == Phase::Summarized {
            tracing::warn!("build finished reported more than once, ignoring");
            return;
        }
        self.state.mark_finished(self.clock.now());
        tracing::debug!(succeeded, "build finished");
        self.print_summary(succeeded);
    }

    fn project_finished(&self, succeeded: bool) {
        let total = self.state.record_project(succeeded);
        tracing::trace!(succeeded, total, "project finished");
        if self.config.progress == ProgressMode::Dots {
            self.emit(&self.marker(succeeded));
        }
    }

    fn error_raised(&self, diagnostic: Diagnostic) {
        tracing::trace!(code = %diagnostic.code, "error raised");
        self.state.record_diagnostic(Severity::Error, &diagnostic);
    }

    fn warning_raised(&self, diagnostic: Diagnostic) {
        tracing::trace!(code = %diagnostic.code, "warning raised");
        self.state.record_diagnostic(Severity::Warning, &diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::thread;

    use chrono::{Local, TimeDelta, TimeZone};

    use super::*;
    use crate::clock::ManualClock;
    use crate::events::BuildEvent;

    /// Writer shared between the logger and the test so output can be read
    /// while the logger is still behind an `Arc`.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn manual_logger(buf: SharedBuf) -> (Arc<BuildLogger<SharedBuf>>, Arc<ManualClock>) {
        let start = Local.with_ymd_and_hms(2024, 3, 1, 9, 15, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let logger = BuildLogger::with_clock(
            buf,
            LoggerConfig::default(),
            false,
            Box::new(Arc::clone(&clock)),
        );
        (Arc::new(logger), clock)
    }

    #[test]
    fn test_build_started_writes_status_line() {
        let buf = SharedBuf::default();
        let (logger, _) = manual_logger(buf.clone());
        logger.build_started("Build X");
        assert_eq!(buf.text(), "\n09:15:00 > Build X\n");
        assert_eq!(logger.phase(), Phase::Running);
    }

    #[test]
    fn test_project_markers_have_no_newline() {
        let buf = SharedBuf::default();
        let (logger, _) = manual_logger(buf.clone());
        logger.project_finished(true);
        logger.project_finished(true);
        logger.project_finished(false);
        assert_eq!(buf.text(), "..X");
    }

    #[test]
    fn test_progress_none_suppresses_markers() {
        let config = LoggerConfig {
            progress: ProgressMode::None,
            ..LoggerConfig::default()
        };
        let logger = BuildLogger::new(Vec::new(), config, false);
        logger.project_finished(true);
        logger.project_finished(false);
        assert_eq!(logger.state().succeeded(), 1);
        assert_eq!(logger.state().failed(), 1);
        assert!(logger.into_inner().is_empty());
    }

    #[test]
    fn test_full_run_summary() {
        let buf = SharedBuf::default();
        let (logger, clock) = manual_logger(buf.clone());

        logger.dispatch(BuildEvent::BuildStarted {
            message: "Build X".into(),
        });
        for _ in 0..3 {
            logger.project_finished(true);
        }
        logger.project_finished(false);
        logger.error_raised(Diagnostic::new("E1", "p.proj", "f.cs", 10, 2, "bad syntax"));
        clock.advance(TimeDelta::milliseconds(2500));
        logger.build_finished(false);

        let text = buf.text();
        assert!(text.contains("09:15:02 > Build failed (00:00:02.5000000)."));
        assert!(text.contains("3 of 4 projects succeeded, 1 error, 0 warnings"));
        assert!(text.contains("ERROR E1:\n\tp.proj\n\tf.cs; (10|2).\n\tbad syntax\n"));
        assert_eq!(logger.phase(), Phase::Summarized);
    }

    #[test]
    fn test_summary_without_diagnostics_has_no_detail_block() {
        let buf = SharedBuf::default();
        let (logger, _) = manual_logger(buf.clone());
        logger.build_started("b");
        logger.project_finished(true);
        logger.build_finished(true);

        let text = buf.text();
        assert!(text.ends_with("1 of 1 projects succeeded, 0 errors, 0 warnings\n"));
        assert!(text.contains("Build finished successfully"));
    }

    #[test]
    fn test_warnings_print_before_errors() {
        let buf = SharedBuf::default();
        let (logger, _) = manual_logger(buf.clone());
        logger.build_started("b");
        logger.error_raised(Diagnostic::new("E9", "", "", 0, 0, ""));
        logger.warning_raised(Diagnostic::new("W1", "", "", 0, 0, ""));
        logger.warning_raised(Diagnostic::new("W2", "", "", 0, 0, ""));
        logger.build_finished(false);

        let text = buf.text();
        assert!(text.contains("0 of 0 projects succeeded, 1 error, 2 warnings"));
        let w = text.find("Warning W1").unwrap();
        let e = text.find("ERROR E9").unwrap();
        assert!(w < e);
    }

    #[test]
    fn test_second_build_finished_is_ignored() {
        let buf = SharedBuf::default();
        let (logger, _) = manual_logger(buf.clone());
        logger.build_started("b");
        logger.build_finished(true);
        let first = buf.text();
        logger.build_finished(false);
        assert_eq!(buf.text(), first);
    }

    #[test]
    fn test_broken_output_does_not_affect_counts() {
        let logger = BuildLogger::new(BrokenPipe, LoggerConfig::default(), false);
        logger.build_started("b");
        logger.project_finished(true);
        logger.build_finished(true);
        assert_eq!(logger.state().succeeded(), 1);
    }

    #[test]
    fn test_invalid_time_format_falls_back() {
        let buf = SharedBuf::default();
        let start = Local.with_ymd_and_hms(2024, 3, 1, 9, 15, 0).unwrap();
        let config = LoggerConfig {
            time_format: "%Q".into(),
            ..LoggerConfig::default()
        };
        let logger =
            BuildLogger::with_clock(buf.clone(), config, false, Box::new(ManualClock::new(start)));
        logger.build_started("b");
        assert_eq!(buf.text(), "\n09:15:00 > b\n");
    }

    #[test]
    fn test_custom_markers() {
        let config = LoggerConfig {
            success_marker: "+".into(),
            failure_marker: "-".into(),
            ..LoggerConfig::default()
        };
        let logger = BuildLogger::new(Vec::new(), config, false);
        logger.project_finished(false);
        logger.project_finished(true);
        assert_eq!(logger.into_inner(), b"-+");
    }

    #[test]
    fn test_concurrent_projects_counted_exactly() {
        const THREADS: usize = 100;
        let buf = SharedBuf::default();
        let (logger, _) = manual_logger(buf.clone());
        logger.build_started("stress");

        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let logger = Arc::clone(&logger);
                thread::spawn(move || logger.project_finished(i % 4 != 0))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        logger.build_finished(true);

        let snap = logger.snapshot();
        assert_eq!(snap.total(), THREADS);
        assert_eq!(snap.failed, THREADS / 4);
        let text = buf.text();
        assert_eq!(text.matches('X').count(), THREADS / 4);
        assert!(text.contains("75 of 100 projects succeeded"));
    }

    #[test]
    fn test_initialize_without_source_stays_uninitialized() {
        let logger = Arc::new(BuildLogger::new(Vec::new(), LoggerConfig::default(), false));
        assert!(!logger.initialize(None));
        assert_eq!(logger.phase(), Phase::Uninitialized);
    }

    struct OneShot(Vec<Arc<dyn BuildEventSink>>);

    impl EventSource for OneShot {
        fn subscribe(&mut self, sink: Arc<dyn BuildEventSink>) {
            self.0.push(sink);
        }
    }

    #[test]
    fn test_initialize_with_wrapper_subscribes_wrapper() {
        let logger = Arc::new(BuildLogger::new(Vec::new(), LoggerConfig::default(), false));
        let mut source = OneShot(Vec::new());
        let front: Arc<dyn BuildEventSink> = logger.clone();
        assert!(logger.initialize_with(Some(&mut source), front));
        assert_eq!(logger.phase(), Phase::Initialized);
        assert_eq!(source.0.len(), 1);

        source.0[0].build_started("via wrapper");
        assert_eq!(logger.phase(), Phase::Running);
    }
}
