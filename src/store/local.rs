use crate::core::defi::DefiState;
use crate::core::state::PortfolioState;
use crate::core::store::StateBackend;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;
use tracing::debug;

pub const PORTFOLIO_KEY: &str = "AssetManagerData_v2";
pub const DEFI_KEY: &str = "defi_manager_data";

const PARTITION: &str = "local_storage";

/// Key-value store on disk holding JSON documents, one per application.
#[derive(Clone)]
pub struct LocalStore {
    keyspace: Keyspace,
    items: PartitionHandle,
}

impl LocalStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;

        let keyspace = Config::new(path)
            .open()
            .with_context(|| format!("Failed to open local store at {}", path.display()))?;
        let items = keyspace
            .open_partition(PARTITION, PartitionCreateOptions::default())
            .context("Failed to open local storage partition")?;
        debug!("Opened local store at {}", path.display());

        Ok(Self { keyspace, items })
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.items.get(key.as_bytes())? {
            Some(bytes) => {
                debug!("Local store HIT for key: {}", key);
                let value = serde_json::from_slice(&bytes)
                    .with_context(|| format!("Corrupt local data under key {key}"))?;
                Ok(Some(value))
            }
            None => {
                debug!("Local store MISS for key: {}", key);
                Ok(None)
            }
        }
    }

    pub fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.items.insert(key.as_bytes(), bytes)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Local store PUT for key: {}", key);
        Ok(())
    }

    pub fn load_defi(&self) -> Result<DefiState> {
        Ok(self.get_json(DEFI_KEY)?.unwrap_or_default())
    }

    pub fn save_defi(&self, state: &DefiState) -> Result<()> {
        self.put_json(DEFI_KEY, state)
    }
}

#[async_trait]
impl StateBackend for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn load(&self) -> Result<Option<PortfolioState>> {
        self.get_json(PORTFOLIO_KEY)
    }

    async fn save(&self, state: &PortfolioState) -> Result<()> {
        self.put_json(PORTFOLIO_KEY, state)
    }
}
