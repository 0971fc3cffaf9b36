//! Diagnostic sink used by the discovery engine and its filters
//!
//! Purely observational: nothing written here may influence classification.

/// Receives debug messages explaining classification decisions
#[cfg_attr(test, mockall::automock)]
pub trait DiagnosticSink: Send + Sync {
    fn debug(&self, message: &str);
}

/// Forwards diagnostics to `tracing` at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "flux_zombies::collector", "{}", message);
    }
}

/// Discards every diagnostic
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn debug(&self, _message: &str) {}
}
