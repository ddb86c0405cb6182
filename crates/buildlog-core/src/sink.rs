use std::sync::Arc;

use crate::diagnostic::Diagnostic;
use crate::events::BuildEvent;

/// Receiver of build lifecycle callbacks.
///
/// A host invokes these methods as the build progresses, possibly from many
/// worker threads at once, so implementations must be safe to share.
pub trait BuildEventSink: Send + Sync {
    fn build_started(&self, message: &str);
    fn build_finished(&self, succeeded: bool);
    fn project_finished(&self, succeeded: bool);
    fn error_raised(&self, diagnostic: Diagnostic);
    fn warning_raised(&self, diagnostic: Diagnostic);

    /// Route a decoded event to the matching callback.
    fn dispatch(&self, event: BuildEvent) {
        match event {
            BuildEvent::BuildStarted { message } => self.build_started(&message),
            BuildEvent::BuildFinished { succeeded } => self.build_finished(succeeded),
            BuildEvent::ProjectFinished { succeeded, .. } => self.project_finished(succeeded),
            BuildEvent::ErrorRaised(d) => self.error_raised(d),
            BuildEvent::WarningRaised(d) => self.warning_raised(d),
        }
    }
}

/// Something that delivers build events to subscribed sinks.
pub trait EventSource {
    fn subscribe(&mut self, sink: Arc<dyn BuildEventSink>);
}

/// Subscribe `sink` to `source`. A missing source is a no-op.
///
/// Returns whether a subscription was made.
pub fn initialize(source: Option<&mut dyn EventSource>, sink: Arc<dyn BuildEventSink>) -> bool {
    match source {
        Some(source) => {
            source.subscribe(sink);
            true
        }
        None => {
            tracing::debug!("no event source supplied, skipping subscription");
            false
        }
    }
}
