use std::path::Path;
use std::sync::Arc;

use integrity_core::DiagnosticSink;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use crate::entry::DiagnosticEntry;
use crate::ring::RingLog;
use crate::writer::{DiagnosticLogError, DiagnosticWriter};

const CHANNEL_BUFFER: usize = 1024;

/// Most entries the writer task takes off the channel per file write.
const BATCH_LIMIT: usize = 64;

/// What the writer task did before it exited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub batches: usize,
    pub written: usize,
    /// Entries lost to encode or I/O errors.
    pub failed: usize,
}

/// Deduplicating diagnostic sink backed by a JSON-lines file.
///
/// Every record first goes through an in-memory [`RingLog`]. Only entries
/// the ring accepts are forwarded to the file, so an evaluation that is
/// re-run for the same subject and outcome is stored once, both in memory
/// and on disk. Clones share the ring and the channel.
///
/// [`record`](DiagnosticSink::record) never blocks: when the channel is full
/// or the writer has exited the entry stays in the ring but is dropped from
/// the file, with a warning.
#[derive(Clone)]
pub struct JsonlSink {
    tx: mpsc::Sender<DiagnosticEntry>,
    ring: Arc<RingLog>,
}

impl JsonlSink {
    /// Open `path`, keep the latest `ring_capacity` entries in memory and
    /// spawn the writer task.
    ///
    /// Lifecycle:
    ///
    /// * The task drains up to 64 queued entries at a time, appends them as
    ///   one batch and flushes after each batch. There is no idle timer; an
    ///   entry is on disk as soon as its batch has been written.
    /// * When the last clone of the sink is dropped the channel closes; the
    ///   task writes whatever is still queued and then exits.
    /// * The returned [`JoinHandle`] resolves to the task's [`WriterStats`].
    ///   Await it after dropping the sink to be sure every entry was handed
    ///   to the file.
    ///
    /// Opening the file is the only fallible step; it fails with
    /// [`DiagnosticLogError::Open`]. Must be called inside a tokio runtime.
    ///
    /// # Panics
    ///
    /// The writer task does not panic. A batch that fails to encode or
    /// write is logged with `tracing::error`, counted in
    /// [`WriterStats::failed`] and skipped; later batches are still
    /// attempted.
    pub async fn start(
        path: impl AsRef<Path>,
        ring_capacity: usize,
    ) -> Result<(Self, JoinHandle<WriterStats>), DiagnosticLogError> {
        let writer = DiagnosticWriter::open(path).await?;
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);
        let handle = tokio::spawn(drain(writer, rx));

        let sink = Self {
            tx,
            ring: Arc::new(RingLog::with_capacity(ring_capacity)),
        };
        Ok((sink, handle))
    }

    /// Entries seen recently, after dedup. This is also exactly what has
    /// been queued for the file, minus anything the ring has since evicted.
    pub fn recent(&self) -> &RingLog {
        &self.ring
    }

    /// Store `entry` in the ring and, if it is not a repeat, queue it for
    /// the file. Returns whether the entry was new.
    pub fn submit(&self, entry: DiagnosticEntry) -> bool {
        if !self.ring.push(entry.clone()) {
            return false;
        }
        match self.tx.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(entry)) => tracing::warn!(
                subject_id = %entry.subject_id,
                "diagnostic channel full, entry kept in memory only"
            ),
            Err(TrySendError::Closed(entry)) => tracing::warn!(
                subject_id = %entry.subject_id,
                "diagnostic writer stopped, entry kept in memory only"
            ),
        }
        true
    }
}

impl DiagnosticSink for JsonlSink {
    fn record(&self, category: &str, payload: serde_json::Value, subject_id: &str) {
        self.submit(DiagnosticEntry::new(category, subject_id, payload));
    }
}

async fn drain(mut writer: DiagnosticWriter, mut rx: mpsc::Receiver<DiagnosticEntry>) -> WriterStats {
    let mut stats = WriterStats::default();
    let mut batch = Vec::with_capacity(BATCH_LIMIT);

    // recv_many returns 0 only once the channel is closed and empty.
    while rx.recv_many(&mut batch, BATCH_LIMIT).await > 0 {
        stats.batches += 1;
        match writer.append(&batch).await {
            Ok(n) => stats.written += n,
            Err(err) => {
                stats.failed += batch.len();
                tracing::error!(
                    %err,
                    path = %writer.path().display(),
                    lost = batch.len(),
                    "diagnostic batch not written"
                );
            }
        }
        batch.clear();
    }

    tracing::debug!(
        batches = stats.batches,
        written = stats.written,
        failed = stats.failed,
        "diagnostic writer finished"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn read_entries(path: &Path) -> Vec<DiagnosticEntry> {
        tokio::fs::read_to_string(path)
            .await
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn records_reach_the_file_after_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diag.jsonl");

        let (sink, handle) = JsonlSink::start(&path, 10).await.unwrap();
        sink.record("shield", json!({"score": 88, "shield": "critical"}), "u-1");
        sink.clone().record("shield", json!({"score": 51, "shield": "high"}), "u-2");
        drop(sink);
        let stats = handle.await.unwrap();

        assert_eq!(stats.written, 2);
        assert_eq!(stats.failed, 0);
        let entries = read_entries(&path).await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].subject_id, "u-1");
        assert_eq!(entries[1].payload["shield"], "high");
    }

    #[tokio::test]
    async fn repeats_are_kept_out_of_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diag.jsonl");

        let (sink, handle) = JsonlSink::start(&path, 10).await.unwrap();
        assert!(sink.submit(DiagnosticEntry::new("shield", "u-1", json!({"score": 90}))));
        assert!(!sink.submit(DiagnosticEntry::new("shield", "u-1", json!({"score": 90}))));
        sink.record("shield", json!({"score": 95}), "u-1");
        sink.record("shield", json!({"score": 95}), "u-1");
        assert_eq!(sink.recent().len(), 2);
        drop(sink);
        handle.await.unwrap();

        let scores: Vec<i64> = read_entries(&path)
            .await
            .iter()
            .map(|e| e.payload["score"].as_i64().unwrap())
            .collect();
        assert_eq!(scores, vec![90, 95]);
    }

    #[tokio::test]
    async fn clones_share_the_ring() {
        let dir = tempfile::tempdir().unwrap();
        let (sink, handle) = JsonlSink::start(dir.path().join("diag.jsonl"), 10)
            .await
            .unwrap();
        let other = sink.clone();
        sink.record("shield", json!({}), "u-1");
        other.record("shield", json!({}), "u-1");
        assert_eq!(other.recent().for_subject("u-1").len(), 1);
        drop((sink, other));
        assert_eq!(handle.await.unwrap().written, 1);
    }

    #[tokio::test]
    async fn usable_as_dyn_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diag.jsonl");

        let (sink, handle) = JsonlSink::start(&path, 10).await.unwrap();
        {
            let dyn_sink: &dyn DiagnosticSink = &sink;
            dyn_sink.record("shield", json!({}), "u-9");
        }
        drop(sink);
        handle.await.unwrap();

        let text = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(text.contains("\"subjectId\":\"u-9\""));
    }
}
