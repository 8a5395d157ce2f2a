use std::sync::{Arc, Mutex};

use blobdeck_app::App;
use blobdeck_core::config::BlobdeckConfig;
use blobdeck_core::memory::{MemoryStore, Snapshot, SnapshotSpace};
use blobdeck_core::store::{Blob, Shard, Space, StoreService, Upload};

pub const SPACE: &str = "did:key:z6MkSpace";

#[allow(dead_code)]
pub fn upload(index: usize) -> Upload {
    Upload {
        root: format!("bafyupload{index:02}"),
        shards: vec![Shard {
            cid: format!("bagshard{index:02}"),
            size: None,
            digest: Some(format!("zQmblob{index:02}")),
        }],
        size: None,
        inserted_at: Some("2025-01-02T03:04:05Z".to_string()),
    }
}

pub fn blob(index: usize) -> Blob {
    Blob {
        digest: format!("zQmblob{index:02}"),
        size: Some(1024 * (index as u64 + 1)),
        cause: Some("bafycause".to_string()),
        inserted_at: None,
    }
}

/// One space holding `uploads` uploads (numbered from 1) and their blobs.
pub fn seeded_store(uploads: usize) -> MemoryStore {
    let mut space = SnapshotSpace::new(SPACE);
    space.name = Some("primary".to_string());
    space.access = Some("public".to_string());
    space.uploads = (1..=uploads).map(upload).collect();
    space.blobs = (1..=uploads).map(blob).collect();
    MemoryStore::from_snapshot(Snapshot {
        agent: Some("did:key:agent".to_string()),
        accounts: vec!["did:mailto:example.com:ops".to_string()],
        spaces: vec![space],
        ..Snapshot::default()
    })
}

pub fn app_over(store: Arc<MemoryStore>) -> App {
    let store: Arc<dyn StoreService> = store;
    App::new(store, BlobdeckConfig::default())
}

#[allow(dead_code)]
pub fn space() -> Space {
    Space {
        did: SPACE.to_string(),
        name: Some("primary".to_string()),
        access: Some("public".to_string()),
    }
}

#[allow(dead_code)]
#[derive(Default)]
pub struct LogCapture {
    lines: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl LogCapture {
    pub fn push(&self, line: String) {
        self.lines.lock().expect("log lock").push(line);
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("log lock").clone()
    }

    pub fn count_prefixed(&self, prefix: &str) -> usize {
        self.lines()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }
}
