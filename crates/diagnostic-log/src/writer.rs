use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::entry::DiagnosticEntry;

#[derive(Debug, thiserror::Error)]
pub enum DiagnosticLogError {
    #[error("cannot open diagnostic log {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode diagnostic entry {id}: {source}")]
    Encode {
        id: uuid::Uuid,
        #[source]
        source: serde_json::Error,
    },

    #[error("diagnostic log I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// JSON-lines file that receives diagnostics in batches.
///
/// Each [`append`](Self::append) encodes the whole batch before touching the
/// file and flushes once at the end, so a batch that fails to encode leaves
/// no partial lines behind.
pub struct DiagnosticWriter {
    path: PathBuf,
    out: BufWriter<File>,
    encoded: Vec<u8>,
}

impl DiagnosticWriter {
    /// Open `path` for appending, creating it and any missing parent
    /// directories.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, DiagnosticLogError> {
        let path = path.as_ref().to_path_buf();
        let open_err = |source| DiagnosticLogError::Open {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(open_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(open_err)?;

        Ok(Self {
            out: BufWriter::new(file),
            encoded: Vec::new(),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `entries` as one line each and flush. Returns how many lines
    /// were written.
    pub async fn append(&mut self, entries: &[DiagnosticEntry]) -> Result<usize, DiagnosticLogError> {
        if entries.is_empty() {
            return Ok(0);
        }

        self.encoded.clear();
        for entry in entries {
            serde_json::to_writer(&mut self.encoded, entry).map_err(|source| {
                DiagnosticLogError::Encode {
                    id: entry.id,
                    source,
                }
            })?;
            self.encoded.push(b'\n');
        }

        self.out.write_all(&self.encoded).await?;
        self.out.flush().await?;
        Ok(entries.len())
    }
}
