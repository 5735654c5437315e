use crate::domain::ports::source_collector::{CollectorError, SourceCollector};
use crate::domain::values::raw_candidate::RawCandidate;
use crate::domain::values::source_kind::SourceKind;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

/// Reads a JSON array of raw records from disk, e.g. a county permit export.
/// Elements are passed through untouched, including malformed ones.
pub struct RecordsFileCollector {
    name: String,
    kind: SourceKind,
    path: PathBuf,
}

impl RecordsFileCollector {
    pub fn new(name: impl Into<String>, kind: SourceKind, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind,
            path: path.into(),
        }
    }

    /// Parse a `KIND:NAME:PATH` spec as given on the command line.
    pub fn from_spec(spec: &str) -> Result<Self, CollectorError> {
        let mut parts = spec.splitn(3, ':');
        let (Some(kind), Some(name), Some(path)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(CollectorError::Config(format!(
                "expected KIND:NAME:PATH, got '{spec}'"
            )));
        };
        let kind: SourceKind = kind.parse().map_err(CollectorError::Config)?;
        if name.trim().is_empty() || path.trim().is_empty() {
            return Err(CollectorError::Config(format!("empty name or path in '{spec}'")));
        }
        Ok(Self::new(name.trim(), kind, path.trim()))
    }
}

#[async_trait]
impl SourceCollector for RecordsFileCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn collect(&self, _location: &str) -> Result<Vec<RawCandidate>, CollectorError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let value: Value = serde_json::from_str(&raw)
            .map_err(|e| CollectorError::Parse(format!("{}: {e}", self.path.display())))?;
        let Value::Array(items) = value else {
            return Err(CollectorError::Parse(format!(
                "{}: expected a JSON array",
                self.path.display()
            )));
        };
        info!(source = %self.name, count = items.len(), "records file loaded");
        Ok(items.into_iter().map(RawCandidate::new).collect())
    }
}
