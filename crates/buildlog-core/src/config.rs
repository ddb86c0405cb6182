use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name searched for when discovering configuration.
pub const CONFIG_FILE_NAME: &str = "buildlog.yaml";

/// When to emit ANSI colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    /// Color when the environment allows it (`NO_COLOR` unset, terminal output).
    #[default]
    Auto,
    Always,
    Never,
}

/// How per-project progress is shown while the build runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressMode {
    /// One marker character per finished project, no newline.
    #[default]
    Dots,
    /// A live spinner with a finished-project count, drawn by the host
    /// instead of inline markers.
    Bar,
    /// No progress output at all.
    None,
}

/// Presentation settings for the build logger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggerConfig {
    pub color: ColorChoice,
    pub progress: ProgressMode,
    /// Marker written for each succeeded project
    pub success_marker: String,
    /// Marker written for each failed project
    pub failure_marker: String,
    /// chrono format string for status-line timestamps
    pub time_format: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            color: ColorChoice::Auto,
            progress: ProgressMode::Dots,
            success_marker: ".".to_string(),
            failure_marker: "X".to_string(),
            time_format: "%H:%M:%S".to_string(),
        }
    }
}

impl LoggerConfig {
    /// Parse configuration from YAML text. Missing keys take their defaults.
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        yaml_serde::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content, path)
    }

    /// Load the nearest `buildlog.yaml` at or above `start`, falling back to
    /// defaults when none exists. Returns the path that was used, if any.
    pub fn discover(start: &Path) -> Result<(Self, Option<PathBuf>), ConfigError> {
        match find_config(start) {
            Some(path) => {
                let config = Self::load(&path)?;
                Ok((config, Some(path)))
            }
            None => Ok((Self::default(), None)),
        }
    }

    /// Post-parse checks. Returns human-readable warnings; the config is
    /// still usable when warnings are present.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.success_marker.is_empty() {
            warnings.push("successMarker is empty; succeeded projects will not be shown".into());
        }
        if self.failure_marker.is_empty() {
            warnings.push("failureMarker is empty; failed projects will not be shown".into());
        }
        if self.success_marker == self.failure_marker && !self.success_marker.is_empty() {
            warnings.push(format!(
                "successMarker and failureMarker are both '{}'; outcomes are indistinguishable without color",
                self.success_marker
            ));
        }
        if self.time_format.trim().is_empty() {
            warnings.push("timeFormat is empty; timestamps will be blank".into());
        } else if StrftimeItems::new(&self.time_format).any(|item| matches!(item, Item::Error)) {
            warnings.push(format!(
                "timeFormat '{}' is not a valid strftime format; falling back to %H:%M:%S",
                self.time_format
            ));
        }
        warnings
    }

    /// Serialize to YAML, as written by `buildlog init`.
    pub fn to_yaml(&self) -> Result<String, yaml_serde::Error> {
        yaml_serde::to_string(self)
    }
}

/// Walk up from `start` looking for `buildlog.yaml`.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut dir = start;
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
}
