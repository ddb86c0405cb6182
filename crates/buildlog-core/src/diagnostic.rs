use std::fmt;

use serde::{Deserialize, Serialize};

/// An error or warning reported by the build, with its source location.
///
/// Every field defaults when absent so that incomplete host payloads are
/// still displayed as-is rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub project_file: String,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: i32,
    #[serde(default)]
    pub column: i32,
    #[serde(default)]
    pub message: String,
}

/// Which collection a diagnostic is recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    /// Prefix written in front of each recorded diagnostic.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "Warning",
        }
    }
}

impl Diagnostic {
    pub fn new(
        code: impl Into<String>,
        project_file: impl Into<String>,
        file: impl Into<String>,
        line: i32,
        column: i32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            project_file: project_file.into(),
            file: file.into(),
            line,
            column,
            message: message.into(),
        }
    }

    /// Render the diagnostic as the block stored in the run's error or
    /// warning collection, e.g. `ERROR E1:\n\tp.proj\n\tf.cs; (10|2).\n\tbad syntax\n`.
    pub fn render(&self, severity: Severity) -> String {
        format!("{} {}", severity.label(), self)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:\n\t{}\n\t{}; ({}|{}).\n\t{}\n",
            self.code, self.project_file, self.file, self.line, self.column, self.message
        )
    }
}
