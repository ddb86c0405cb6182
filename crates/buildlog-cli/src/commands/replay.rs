use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::sync::mpsc;

use buildlog_core::config::{LoggerConfig, ProgressMode};
use buildlog_core::error::ReplayError;
use buildlog_core::replay::EventReader;
use buildlog_core::reporter::BuildLogger;
use buildlog_core::sink::EventSource;

use crate::cli::ProgressArg;
use crate::render::{BarProgress, ChannelSource, DispatchOutcome};

/// Arguments for the `replay` command
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON-lines event log to replay ("-" or omitted reads stdin)
    pub input: Option<PathBuf>,

    /// Number of concurrent workers delivering project and diagnostic events
    #[arg(short = 'j', long, default_value_t = 4)]
    pub jobs: usize,

    /// Progress display (overrides the `progress` config key)
    #[arg(long, value_enum)]
    pub progress: Option<ProgressArg>,
}

fn open_input(input: Option<&Path>) -> Result<Box<dyn BufRead + Send>> {
    match input {
        None => Ok(Box::new(BufReader::new(io::stdin()))),
        Some(path) if path == Path::new("-") => Ok(Box::new(BufReader::new(io::stdin()))),
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open event log {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
    }
}

/// Create the logger for the chosen progress mode and subscribe it to
/// `source`. In bar mode the logger's inline markers are turned off and a
/// spinner wrapping the logger is subscribed in its place.
fn subscribe_logger<W: Write + Send + 'static>(
    out: W,
    mut config: LoggerConfig,
    color: bool,
    source: &mut dyn EventSource,
) -> Arc<BuildLogger<W>> {
    match config.progress {
        ProgressMode::Bar => {
            config.progress = ProgressMode::None;
            let logger = Arc::new(BuildLogger::new(out, config, color));
            let bar = Arc::new(BarProgress::new(logger.clone()));
            logger.initialize_with(Some(source), bar);
            logger
        }
        ProgressMode::Dots | ProgressMode::None => {
            let logger = Arc::new(BuildLogger::new(out, config, color));
            logger.initialize(Some(source));
            logger
        }
    }
}

/// Replay an event log through the console logger.
///
/// Events are read on a blocking thread and delivered by `jobs` concurrent
/// workers. Events read before a malformed line are still delivered; the
/// parse error is returned afterwards.
pub async fn run(args: ReplayArgs, mut config: LoggerConfig, color: bool) -> Result<DispatchOutcome> {
    if let Some(progress) = args.progress {
        config.progress = progress.into();
    }
    let reader = open_input(args.input.as_deref())?;

    let (tx, rx) = mpsc::unbounded_channel();
    let producer = tokio::task::spawn_blocking(move || -> Result<usize, ReplayError> {
        let mut read = 0;
        for event in EventReader::new(reader) {
            if tx.send(event?).is_err() {
                break;
            }
            read += 1;
        }
        Ok(read)
    });

    let mut source = ChannelSource::new(rx, args.jobs);
    let logger = subscribe_logger(io::stdout(), config, color, &mut source);
    tracing::debug!(phase = ?logger.phase(), "logger subscribed");
    let outcome = source.run().await?;

    let read = producer.await?.context("Failed to replay event log")?;
    tracing::debug!(read, delivered = outcome.delivered, "replay finished");

    if outcome.build_succeeded.is_none() {
        tracing::warn!("event stream ended without a build_finished event; no summary printed");
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use buildlog_core::events::BuildEvent;
    use buildlog_core::reporter::Phase;
    use tempfile::NamedTempFile;

    use super::*;

    fn config(progress: ProgressMode) -> LoggerConfig {
        LoggerConfig {
            progress,
            ..LoggerConfig::default()
        }
    }

    #[test]
    fn test_logger_reaches_initialized_in_every_mode() {
        for mode in [ProgressMode::Dots, ProgressMode::Bar, ProgressMode::None] {
            let (_tx, rx) = mpsc::unbounded_channel::<BuildEvent>();
            let mut source = ChannelSource::new(rx, 1);
            let logger = subscribe_logger(Vec::new(), config(mode), false, &mut source);
            assert_eq!(logger.phase(), Phase::Initialized, "mode {mode:?}");
        }
    }

    #[tokio::test]
    async fn test_bar_mode_suppresses_inline_markers() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut source = ChannelSource::new(rx, 2);
        let logger = subscribe_logger(Vec::new(), config(ProgressMode::Bar), false, &mut source);

        tx.send(BuildEvent::BuildStarted { message: "b".into() }).unwrap();
        tx.send(BuildEvent::ProjectFinished { project: None, succeeded: false }).unwrap();
        tx.send(BuildEvent::BuildFinished { succeeded: false }).unwrap();
        drop(tx);
        source.run().await.unwrap();

        assert_eq!(logger.phase(), Phase::Summarized);
        let logger = Arc::try_unwrap(logger).ok().unwrap();
        let text = String::from_utf8(logger.into_inner()).unwrap();
        assert!(!text.contains("\nX"));
        assert!(text.contains("0 of 1 projects succeeded"));
    }

    #[test]
    fn test_open_missing_file_fails_with_path() {
        let err = open_input(Some(Path::new("/definitely/not/here.jsonl")))
            .err()
            .expect("missing file should fail");
        assert!(err.to_string().contains("/definitely/not/here.jsonl"));
    }

    #[test]
    fn test_open_file_reads_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{\"event\":\"build_finished\",\"succeeded\":true}}").unwrap();
        let reader = open_input(Some(file.path())).unwrap();
        let events: Vec<_> = EventReader::new(reader).collect::<Result<_, _>>().unwrap();
        assert_eq!(events.len(), 1);
    }
}
