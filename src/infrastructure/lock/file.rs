use crate::domain::error::DomainError;
use crate::domain::ports::lock_store::{LockStore, RunLockRecord};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Run lock kept as a JSON marker file.
pub struct FileLockStore {
    path: PathBuf,
}

impl FileLockStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LockStore for FileLockStore {
    fn read(&self) -> Result<Option<RunLockRecord>, DomainError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DomainError::Lock(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )))
            }
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                // A half-written marker from a crashed run; treat as abandoned.
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable lock marker");
                Ok(None)
            }
        }
    }

    fn write(&self, record: &RunLockRecord) -> Result<(), DomainError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| DomainError::Lock(format!("cannot create {}: {e}", parent.display())))?;
        }
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| DomainError::Lock(format!("cannot encode lock: {e}")))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)
            .and_then(|_| fs::rename(&tmp, &self.path))
            .map_err(|e| DomainError::Lock(format!("cannot write {}: {e}", self.path.display())))
    }

    fn release(&self) -> Result<(), DomainError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::Lock(format!(
                "cannot remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}
