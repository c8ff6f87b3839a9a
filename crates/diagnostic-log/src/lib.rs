//! Diagnostic sinks for the trust engine.
//!
//! The engine reports through [`integrity_core::DiagnosticSink`] and never
//! waits on it. This crate supplies the two implementations the platform
//! uses:
//!
//! * [`RingLog`] keeps the latest 200 entries in memory and skips records
//!   that repeat a subject's previous one.
//! * [`JsonlSink`] puts its own [`RingLog`] in front of an append-only
//!   JSON-lines file. Entries the ring rejects as repeats never reach disk;
//!   the rest are written in batches by a background tokio task.
//!
//! ```rust,no_run
//! use diagnostic_log::JsonlSink;
//! use integrity_core::DiagnosticSink;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (sink, handle) = JsonlSink::start("/var/log/trust-engine/diagnostics.jsonl", 200).await?;
//! sink.record("shield", serde_json::json!({"score": 85}), "user-42");
//! sink.record("shield", serde_json::json!({"score": 85}), "user-42"); // repeat, skipped
//! drop(sink);
//! let stats = handle.await?;
//! assert_eq!(stats.written, 1);
//! # Ok(())
//! # }
//! ```

pub mod entry;
pub mod ring;
pub mod sink;
pub mod writer;

pub use entry::DiagnosticEntry;
pub use ring::{RingLog, DEFAULT_CAPACITY};
pub use sink::{JsonlSink, WriterStats};
pub use writer::{DiagnosticLogError, DiagnosticWriter};
