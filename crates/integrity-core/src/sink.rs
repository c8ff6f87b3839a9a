/// Destination for diagnostic records emitted by the shield.
///
/// Implementations are fire-and-forget: `record` cannot fail back into the
/// engine, and deduplication of repeated calls is the sink's job.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, category: &str, payload: serde_json::Value, subject_id: &str);
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _category: &str, _payload: serde_json::Value, _subject_id: &str) {}
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for std::sync::Arc<T> {
    fn record(&self, category: &str, payload: serde_json::Value, subject_id: &str) {
        (**self).record(category, payload, subject_id)
    }
}
