mod blobs;
mod prompt;
mod purge;
mod spaces;
mod uploads;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use blobdeck_core::config::{BlobdeckConfig, load_config_or_default};
use blobdeck_core::doctor::{DoctorReport, run_doctor};
use blobdeck_core::env::EnvLayer;
use blobdeck_core::memory::MemoryStore;
use blobdeck_core::store::StoreService;

pub use blobs::{BlobPresenter, BlobSource, DeleteBlobRequest};
pub use prompt::{
    PromptError, check_confirmation, concurrency_from_input, page_size_from_input, require_input,
};
pub use purge::{PurgeRequest, PurgeTarget, bulk_event_line};
pub use spaces::{RateLimitReport, UsageReport};
pub use uploads::{DeleteError, DeleteUploadRequest, UploadPresenter, UploadSource};

#[derive(Clone)]
pub struct App {
    pub store: Arc<dyn StoreService>,
    pub config: BlobdeckConfig,
}

impl App {
    pub fn new(store: Arc<dyn StoreService>, config: BlobdeckConfig) -> Self {
        Self { store, config }
    }

    /// Builds the app over the in-memory store named by `config`.
    pub fn from_config(config: BlobdeckConfig) -> Result<Self> {
        let Some(snapshot) = config.store.snapshot.clone() else {
            bail!(
                "no store snapshot configured\nSet store.snapshot in ~/.config/blobdeck/config.toml or BLOBDECK_SNAPSHOT."
            );
        };
        let store = MemoryStore::from_snapshot_path(&snapshot)
            .with_context(|| format!("failed to open store snapshot {}", snapshot.display()))?;
        tracing::info!(snapshot = %snapshot.display(), "opened memory store");
        Ok(Self::new(Arc::new(store), config))
    }

    pub fn doctor(config_path: &Path, env: &EnvLayer) -> DoctorReport {
        run_doctor(config_path, env)
    }

    /// Loads the config (defaults when absent) with environment overrides applied.
    pub fn ensure_config_ready(config_path: &Path, env: &EnvLayer) -> Result<BlobdeckConfig> {
        let mut config = load_config_or_default(config_path).map_err(|error| {
            anyhow!(
                "invalid config at {}: {error}\nFix the config and retry.",
                config_path.display()
            )
        })?;
        config.apply_env(env);
        Ok(config)
    }

    pub fn store(&self) -> Arc<dyn StoreService> {
        Arc::clone(&self.store)
    }

    pub fn agent_header(&self) -> Result<String> {
        let info = self
            .store
            .agent_info()
            .context("failed to read agent info")?;
        Ok(format!(
            "{}  |  Profile: {}",
            info.header_line(),
            self.config.profile_label()
        ))
    }
}
