use crate::domain::entities::run_session::RunSession;
use crate::domain::error::DomainError;
use async_trait::async_trait;

/// Downstream consumer of a finished run's leads (file export, dashboard).
#[async_trait]
pub trait LeadSink: Send + Sync {
    fn name(&self) -> &str;

    /// Publish the session's leads. Returns a short description of where
    /// they went (a path, a URL).
    async fn publish(&self, session: &RunSession) -> Result<String, DomainError>;
}
