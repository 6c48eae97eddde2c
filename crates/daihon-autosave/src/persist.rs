//! Persistence backends.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use daihon_types::BlockRecord;

/// Errors from a persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Somewhere a script snapshot can be written.
///
/// Saves are write-only: nothing read back from a backend ever flows into
/// the in-memory document.
#[async_trait]
pub trait Persist: Send + Sync + 'static {
    async fn save(&self, records: &[BlockRecord]) -> Result<(), PersistError>;
}

/// Writes the record array as pretty JSON to one file.
///
/// The file is replaced atomically (write to a sibling temp file, then
/// rename), so a reader never sees a half-written script.
#[derive(Clone, Debug)]
pub struct JsonFilePersist {
    path: PathBuf,
}

impl JsonFilePersist {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl Persist for JsonFilePersist {
    async fn save(&self, records: &[BlockRecord]) -> Result<(), PersistError> {
        let bytes = serde_json::to_vec_pretty(records)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!(path = %self.path.display(), blocks = records.len(), "wrote script");
        Ok(())
    }
}
