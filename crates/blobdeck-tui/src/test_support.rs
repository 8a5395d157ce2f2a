use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

use blobdeck_app::App;
use blobdeck_core::config::BlobdeckConfig;
use blobdeck_core::memory::{MemoryStore, Snapshot, SnapshotSpace};
use blobdeck_core::store::{Blob, Shard, StoreService, Upload};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::ui::log_view::{Job, JobEvent, JobSpawner, run_job};

pub(crate) const SPACE: &str = "did:key:z6MkSpace";

pub(crate) fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

/// One named space with `uploads` uploads, each backed by a 1 KiB blob.
pub(crate) fn seeded_store(uploads: usize) -> Arc<MemoryStore> {
    let mut space = SnapshotSpace::new(SPACE);
    space.name = Some("primary".to_string());
    space.access = Some("public".to_string());
    space.uploads = (1..=uploads)
        .map(|index| Upload {
            root: format!("bafyupload{index:02}"),
            shards: vec![Shard {
                cid: format!("bagshard{index:02}"),
                size: None,
                digest: Some(format!("zQmblob{index:02}")),
            }],
            size: None,
            inserted_at: None,
        })
        .collect();
    space.blobs = (1..=uploads)
        .map(|index| Blob {
            digest: format!("zQmblob{index:02}"),
            size: Some(1024),
            cause: None,
            inserted_at: None,
        })
        .collect();
    Arc::new(MemoryStore::from_snapshot(Snapshot {
        agent: Some("did:key:agent".to_string()),
        spaces: vec![space],
        ..Snapshot::default()
    }))
}

pub(crate) fn empty_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::from_snapshot(Snapshot::default()))
}

pub(crate) fn app_over(store: Arc<MemoryStore>) -> App {
    let store: Arc<dyn StoreService> = store;
    App::new(store, BlobdeckConfig::default())
}

/// Runs jobs to completion on the calling thread.
pub(crate) struct InlineSpawner;

impl JobSpawner for InlineSpawner {
    fn spawn(&self, job: Job) -> Receiver<JobEvent> {
        let (sender, receiver) = mpsc::channel();
        run_job(job, &sender);
        receiver
    }
}
