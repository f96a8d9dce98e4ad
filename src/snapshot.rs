use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tempfile::NamedTempFile;

use crate::errors::MenuError;
use crate::menu::Snapshot;

/// The on-disk menu snapshot. Its modification time is the validity token
/// shared between server processes.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Modification time of the snapshot, `None` when the file is missing.
    pub fn mtime(&self) -> Result<Option<SystemTime>, MenuError> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(Some(meta.modified().map_err(|e| self.read_error(e))?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.read_error(e)),
        }
    }

    pub fn read(&self) -> Result<Snapshot, MenuError> {
        let contents = fs::read_to_string(&self.path).map_err(|e| self.read_error(e))?;
        serde_json::from_str(&contents).map_err(|source| MenuError::SnapshotParse {
            path: self.path.display().to_string(),
            source,
        })
    }

    /// Replace the whole document and return the new modification time.
    ///
    /// The payload goes to a temporary file next to the target which is then
    /// renamed over it, so readers see either the old or the new document.
    pub fn write(&self, snapshot: &Snapshot) -> Result<SystemTime, MenuError> {
        let mut payload = serde_json::to_string_pretty(snapshot)?;
        payload.push('\n');

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| self.write_error(e))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| self.write_error(e))?;
        tmp.write_all(payload.as_bytes())
            .map_err(|e| self.write_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.write_error(e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;

        let modified = fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .map_err(|e| self.read_error(e))?;
        Ok(modified)
    }

    fn read_error(&self, source: std::io::Error) -> MenuError {
        MenuError::SnapshotRead {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn write_error(&self, source: std::io::Error) -> MenuError {
        MenuError::SnapshotWrite {
            path: self.path.display().to_string(),
            source,
        }
    }
}
