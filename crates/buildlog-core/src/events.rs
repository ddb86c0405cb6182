use serde::{Deserialize, Serialize};

use crate::diagnostic::Diagnostic;

/// Build lifecycle events delivered by a host to the logger.
///
/// These events decouple whatever drives the build from the presentation
/// layer. The serialized form is one JSON object per event, tagged by the
/// `event` field, which is what [`crate::replay::ReplaySource`] reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BuildEvent {
    /// The build has started.
    BuildStarted {
        #[serde(default)]
        message: String,
    },
    /// The whole build has finished.
    BuildFinished { succeeded: bool },
    /// A single project has finished building.
    ProjectFinished {
        /// Project file the host reported, if any. Not used for aggregation.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        project: Option<String>,
        succeeded: bool,
    },
    /// The build emitted an error diagnostic.
    ErrorRaised(Diagnostic),
    /// The build emitted a warning diagnostic.
    WarningRaised(Diagnostic),
}

impl BuildEvent {
    /// Whether this event marks a run boundary (start or finish).
    ///
    /// Concurrent dispatchers must deliver boundary events after every
    /// previously read event has been handled.
    pub fn is_boundary(&self) -> bool {
        matches!(
            self,
            BuildEvent::BuildStarted { .. } | BuildEvent::BuildFinished { .. }
        )
    }

    /// Short name of the event kind, as used in the serialized `event` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            BuildEvent::BuildStarted { .. } => "build_started",
            BuildEvent::BuildFinished { .. } => "build_finished",
            BuildEvent::ProjectFinished { .. } => "project_finished",
            BuildEvent::ErrorRaised(_) => "error_raised",
            BuildEvent::WarningRaised(_) => "warning_raised",
        }
    }
}
