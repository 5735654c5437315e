pub mod csv;
pub mod markdown;

use crate::domain::error::DomainError;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

/// Canonical export name: `<prefix>-<YYYY-MM-DD>.csv`.
pub fn output_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}-{}.csv", date.format("%Y-%m-%d"))
}

pub(crate) fn write_file(dir: &Path, file_name: &str, contents: &str) -> Result<PathBuf, DomainError> {
    fs::create_dir_all(dir)
        .map_err(|e| DomainError::Export(format!("cannot create {}: {e}", dir.display())))?;
    let path = dir.join(file_name);
    fs::write(&path, contents)
        .map_err(|e| DomainError::Export(format!("cannot write {}: {e}", path.display())))?;
    Ok(path)
}
