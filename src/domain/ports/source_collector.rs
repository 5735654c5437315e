use crate::domain::values::raw_candidate::RawCandidate;
use crate::domain::values::source_kind::SourceKind;
use async_trait::async_trait;
use thiserror::Error;

/// An external adapter that produces raw lead candidates from one source.
///
/// "No results" is `Ok(vec![])`. `Err` is reserved for genuine failures
/// (network, auth, unparseable responses); the coordinator recovers from it.
#[async_trait]
pub trait SourceCollector: Send + Sync {
    /// Source tag stamped on every lead, e.g. "Reddit" or "County Permits".
    fn name(&self) -> &str;

    fn kind(&self) -> SourceKind;

    async fn collect(&self, location: &str) -> Result<Vec<RawCandidate>, CollectorError>;
}

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
