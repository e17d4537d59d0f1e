use crate::domain::ports::DebugSink;

/// Collision notices as tracing events; the debug overlay itself lives client-side.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDebugSink;

impl DebugSink for TracingDebugSink {
    fn push(&self, line: &str) {
        tracing::debug!(target: "arena::debug", "{line}");
    }
}
