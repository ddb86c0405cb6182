use chrono::TimeDelta;

use crate::state::RunSnapshot;

/// End-of-run report built from a [`RunSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub build_succeeded: bool,
    pub elapsed: TimeDelta,
    pub succeeded: usize,
    pub total: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// `"1 error"`, `"2 errors"`, `"0 errors"`.
pub fn count_noun(count: usize, singular: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {singular}s")
    }
}

/// Format a duration the way .NET prints a `TimeSpan`:
/// `[-][d.]hh:mm:ss[.fffffff]`. The day prefix only appears from 24 hours
/// on, and the 7-digit fraction (100 ns ticks) only when it is non-zero.
pub fn format_elapsed(elapsed: TimeDelta) -> String {
    let sign = if elapsed < TimeDelta::zero() { "-" } else { "" };
    let elapsed = elapsed.abs();
    let total_secs = elapsed.num_seconds();
    let days = total_secs / 86_400;
    let ticks = elapsed.subsec_nanos() / 100;

    let mut out = String::from(sign);
    if days > 0 {
        out.push_str(&format!("{days}."));
    }
    out.push_str(&format!(
        "{:02}:{:02}:{:02}",
        (total_secs / 3600) % 24,
        (total_secs / 60) % 60,
        total_secs % 60
    ));
    if ticks > 0 {
        out.push_str(&format!(".{ticks:07}"));
    }
    out
}

impl Summary {
    pub fn from_snapshot(snapshot: RunSnapshot, build_succeeded: bool) -> Self {
        Self {
            build_succeeded,
            elapsed: snapshot.elapsed(),
            succeeded: snapshot.succeeded,
            total: snapshot.total(),
            errors: snapshot.errors,
            warnings: snapshot.warnings,
        }
    }

    /// `Build finished successfully (00:00:01.5000000).`
    pub fn status_line(&self) -> String {
        let outcome = if self.build_succeeded {
            "finished successfully"
        } else {
            "failed"
        };
        format!("Build {} ({}).", outcome, format_elapsed(self.elapsed))
    }

    /// `- 3 of 4 projects succeeded, 1 error, 0 warnings`
    pub fn counts_line(&self) -> String {
        format!(
            "\t- {} of {} projects succeeded, {}, {}",
            self.succeeded,
            self.total,
            count_noun(self.errors.len(), "error"),
            count_noun(self.warnings.len(), "warning"),
        )
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.errors.is_empty() || !self.warnings.is_empty()
    }

    /// The detail block: a blank line, every warning, every error, a blank
    /// line. Empty when no diagnostics were recorded.
    pub fn details(&self) -> String {
        if !self.has_diagnostics() {
            return String::new();
        }
        let mut out = String::from("\n");
        for entry in self.warnings.iter().chain(self.errors.iter()) {
            out.push_str(entry);
            out.push('\n');
        }
        out.push('\n');
        out
    }

    /// Full summary text with `timestamp` as the status-line prefix.
    pub fn render(&self, timestamp: &str) -> String {
        format!(
            "\n\n{} > {}\n{}\n{}",
            timestamp,
            self.status_line(),
            self.counts_line(),
            self.details()
        )
    }
}
