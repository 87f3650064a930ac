pub mod local;
pub mod remote;

use crate::core::config::AppConfig;
use crate::core::state::PortfolioState;
use crate::core::store::{StateBackend, UnreadableState};
use anyhow::{Context, Result};
use local::LocalStore;
use remote::HttpBackend;
use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where a loaded state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Remote,
    Local,
    Empty,
}

impl Display for LoadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadSource::Remote => write!(f, "remote"),
            LoadSource::Local => write!(f, "local"),
            LoadSource::Empty => write!(f, "empty"),
        }
    }
}

/// Loads and saves the portfolio state across the local store and an
/// optional remote mirror.
///
/// Loading prefers the remote copy and falls back to the local one when the
/// remote is unreachable or empty. A remote copy that exists but cannot be
/// parsed is an error, so it is never overwritten by a later save. Saving
/// always writes locally first; a failed remote write is logged and
/// otherwise ignored.
pub struct Repository {
    local: Box<dyn StateBackend>,
    remote: Option<Box<dyn StateBackend>>,
    default_rate: f64,
}

impl Repository {
    pub fn new(
        local: Box<dyn StateBackend>,
        remote: Option<Box<dyn StateBackend>>,
        default_rate: f64,
    ) -> Self {
        Repository {
            local,
            remote,
            default_rate,
        }
    }

    pub fn from_config(config: &AppConfig, local: LocalStore) -> Result<Self> {
        let remote = match &config.remote {
            Some(remote) => {
                debug!("Using remote mirror at {}", remote.url);
                let backend =
                    HttpBackend::new(&remote.url, Duration::from_secs(remote.timeout_secs))?;
                Some(Box::new(backend) as Box<dyn StateBackend>)
            }
            None => None,
        };
        Ok(Self::new(Box::new(local), remote, config.usd_rate))
    }

    pub async fn load(&self) -> Result<(PortfolioState, LoadSource)> {
        if let Some(remote) = &self.remote {
            match remote.load().await {
                Ok(Some(state)) => {
                    info!("Loaded state from {}", remote.name());
                    return Ok((state.normalized(self.default_rate), LoadSource::Remote));
                }
                Ok(None) => debug!("Remote has no data, trying local store"),
                Err(e) if e.is::<UnreadableState>() => {
                    return Err(e).context(
                        "Remote data could not be read; fix or clear it before making changes",
                    );
                }
                Err(e) => warn!("Failed to load from {}: {:#}", remote.name(), e),
            }
        }

        match self.local.load().await? {
            Some(state) => {
                info!("Loaded state from {}", self.local.name());
                Ok((state.normalized(self.default_rate), LoadSource::Local))
            }
            None => {
                debug!("No stored state, starting empty");
                Ok((PortfolioState::with_rate(self.default_rate), LoadSource::Empty))
            }
        }
    }

    /// Persists locally, then mirrors to the remote. Returns whether the
    /// remote write succeeded, or `None` when no remote is configured.
    pub async fn save(&self, state: &PortfolioState) -> Result<Option<bool>> {
        self.local.save(state).await?;
        debug!("Saved state to {}", self.local.name());

        let Some(remote) = &self.remote else {
            return Ok(None);
        };
        match remote.save(state).await {
            Ok(()) => Ok(Some(true)),
            Err(e) => {
                warn!("Failed to save to {}: {:#}", remote.name(), e);
                Ok(Some(false))
            }
        }
    }
}
