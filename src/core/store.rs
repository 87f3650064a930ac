//! Persistence abstractions for the portfolio state

use crate::core::state::PortfolioState;
use anyhow::Result;
use async_trait::async_trait;

/// A backend answered with a document that exists but is not a readable
/// portfolio. Loading stops on this error rather than falling back.
#[derive(Debug, thiserror::Error)]
#[error("{backend} holds data that cannot be read: {reason}")]
pub struct UnreadableState {
    pub backend: String,
    pub reason: String,
}

/// A place the portfolio state can be read from and written to.
#[async_trait]
pub trait StateBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Returns `None` when nothing has been stored yet, and an
    /// [`UnreadableState`] error when something is stored but cannot be
    /// parsed.
    async fn load(&self) -> Result<Option<PortfolioState>>;

    async fn save(&self, state: &PortfolioState) -> Result<()>;
}
