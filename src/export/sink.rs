use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::errors::{ExportError, ExportResult};

/// Destination for a finished export: one named byte sequence. Durability
/// semantics belong to the implementation; the pipeline only hands over the
/// final bytes, and partial bytes from an aborted export are never written.
pub trait ExportSink: Send + Sync {
    fn write(&self, name: &str, bytes: &[u8]) -> ExportResult<()>;
}

/// Writes exports as files under a fixed directory.
pub struct FileSink {
    directory: PathBuf,
}

impl FileSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl ExportSink for FileSink {
    fn write(&self, name: &str, bytes: &[u8]) -> ExportResult<()> {
        let path = self.directory.join(name);
        std::fs::write(&path, bytes)
            .map_err(|e| ExportError::WriteFailed(format!("{}: {}", path.display(), e)))
    }
}

/// Keeps exports in memory, keyed by file name.
#[derive(Default)]
pub struct MemorySink {
    outputs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self, name: &str) -> Option<Vec<u8>> {
        self.outputs
            .lock()
            .ok()
            .and_then(|outputs| outputs.get(name).cloned())
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.lock().map(|o| o.is_empty()).unwrap_or(true)
    }
}

impl ExportSink for MemorySink {
    fn write(&self, name: &str, bytes: &[u8]) -> ExportResult<()> {
        let mut outputs = self
            .outputs
            .lock()
            .map_err(|_| ExportError::WriteFailed("sink lock poisoned".to_string()))?;
        outputs.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}
