use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::page::{Cursor, Page, RemoteError, clamp_page_size};
use crate::store::{AgentInfo, Blob, RateLimit, Removed, Space, StoreService, Upload};

/// Seed document for [`MemoryStore`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Snapshot {
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(default)]
    pub rate_limits: Option<SnapshotRateLimits>,
    #[serde(default)]
    pub spaces: Vec<SnapshotSpace>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SnapshotRateLimits {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub entries: Vec<SnapshotRateLimit>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnapshotRateLimit {
    pub subject: String,
    pub id: String,
    pub limit: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SnapshotSpace {
    pub did: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub usage: Option<u64>,
    #[serde(default)]
    pub uploads: Vec<Upload>,
    #[serde(default)]
    pub blobs: Vec<Blob>,
}

impl SnapshotSpace {
    pub fn new(did: impl Into<String>) -> Self {
        Self {
            did: did.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read store snapshot at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse store snapshot at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid store snapshot: {message}")]
    Validation { message: String },
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot, SnapshotError> {
    let raw = fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let snapshot: Snapshot = toml::from_str(&raw).map_err(|source| SnapshotError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_snapshot(&snapshot)?;
    Ok(snapshot)
}

fn validate_snapshot(snapshot: &Snapshot) -> Result<(), SnapshotError> {
    let mut seen = HashSet::new();
    for (index, space) in snapshot.spaces.iter().enumerate() {
        if space.did.trim().is_empty() {
            return Err(SnapshotError::Validation {
                message: format!("spaces[{index}] did must be non-empty"),
            });
        }
        if !seen.insert(space.did.as_str()) {
            return Err(SnapshotError::Validation {
                message: format!("spaces[{index}] repeats did {}", space.did),
            });
        }
    }
    Ok(())
}

struct SpaceState {
    space: Space,
    usage: Option<u64>,
    uploads: BTreeMap<String, Upload>,
    blobs: BTreeMap<String, Blob>,
}

#[derive(Default)]
struct Faults {
    removals: HashSet<String>,
    list_calls: HashSet<usize>,
}

/// Thread-safe store kept entirely in memory.
///
/// Cursors are the key of the last item on a page and the next page starts
/// strictly after it, so removing already listed items never hides unseen ones.
pub struct MemoryStore {
    agent: AgentInfo,
    rate_limits: Option<SnapshotRateLimits>,
    spaces: Mutex<Vec<SpaceState>>,
    faults: Mutex<Faults>,
    removal_delay: Option<Duration>,
    list_calls: AtomicUsize,
    remove_calls: AtomicUsize,
    removals_in_flight: AtomicUsize,
    peak_removals: AtomicUsize,
}

impl MemoryStore {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let spaces = snapshot
            .spaces
            .into_iter()
            .map(|seed| SpaceState {
                space: Space {
                    did: seed.did,
                    name: seed.name,
                    access: seed.access,
                },
                usage: seed.usage,
                uploads: seed
                    .uploads
                    .into_iter()
                    .map(|upload| (upload.root.clone(), upload))
                    .collect(),
                blobs: seed
                    .blobs
                    .into_iter()
                    .map(|blob| (blob.digest.clone(), blob))
                    .collect(),
            })
            .collect();

        Self {
            agent: AgentInfo {
                did: snapshot
                    .agent
                    .unwrap_or_else(|| "did:key:memory-agent".to_string()),
                accounts: snapshot.accounts,
            },
            rate_limits: snapshot.rate_limits,
            spaces: Mutex::new(spaces),
            faults: Mutex::new(Faults::default()),
            removal_delay: None,
            list_calls: AtomicUsize::new(0),
            remove_calls: AtomicUsize::new(0),
            removals_in_flight: AtomicUsize::new(0),
            peak_removals: AtomicUsize::new(0),
        }
    }

    pub fn from_snapshot_path(path: &Path) -> Result<Self, SnapshotError> {
        load_snapshot(path).map(Self::from_snapshot)
    }

    pub fn with_removal_delay(mut self, delay: Duration) -> Self {
        self.removal_delay = Some(delay);
        self
    }

    /// Makes every removal of `key` (an upload root or blob digest) fail.
    pub fn fail_removal(&self, key: impl Into<String>) {
        self.lock_faults().removals.insert(key.into());
    }

    /// Makes the `call`-th listing request (1-based, across all spaces) fail.
    pub fn fail_list_call(&self, call: usize) {
        self.lock_faults().list_calls.insert(call);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn remove_calls(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    pub fn peak_concurrent_removals(&self) -> usize {
        self.peak_removals.load(Ordering::SeqCst)
    }

    pub fn upload_count(&self, space: &str) -> usize {
        self.with_space(space, |state| state.uploads.len())
            .unwrap_or(0)
    }

    pub fn blob_count(&self, space: &str) -> usize {
        self.with_space(space, |state| state.blobs.len())
            .unwrap_or(0)
    }

    pub fn contains_upload(&self, space: &str, root: &str) -> bool {
        self.with_space(space, |state| state.uploads.contains_key(root))
            .unwrap_or(false)
    }

    fn lock_spaces(&self) -> MutexGuard<'_, Vec<SpaceState>> {
        self.spaces.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_faults(&self) -> MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_space<R>(
        &self,
        did: &str,
        read: impl FnOnce(&mut SpaceState) -> R,
    ) -> Result<R, RemoteError> {
        let mut spaces = self.lock_spaces();
        let state = spaces
            .iter_mut()
            .find(|state| state.space.did == did)
            .ok_or_else(|| RemoteError::not_found(format!("space {did}")))?;
        Ok(read(state))
    }

    fn begin_list(&self, space: &str) -> Result<(), RemoteError> {
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.lock_faults().list_calls.contains(&call) {
            return Err(RemoteError::service(format!(
                "listing request {call} for {space} failed"
            )));
        }
        Ok(())
    }

    fn begin_removal(&self, key: &str) -> Result<RemovalGuard<'_>, RemoteError> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.removals_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_removals.fetch_max(now, Ordering::SeqCst);
        let guard = RemovalGuard(&self.removals_in_flight);

        if let Some(delay) = self.removal_delay {
            thread::sleep(delay);
        }
        if self.lock_faults().removals.contains(key) {
            return Err(RemoteError::service(format!("removal of {key} was rejected")));
        }
        Ok(guard)
    }
}

struct RemovalGuard<'a>(&'a AtomicUsize);

impl Drop for RemovalGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn page_after<V: Clone>(
    entries: &BTreeMap<String, V>,
    cursor: Option<&Cursor>,
    size: usize,
) -> Page<V> {
    let size = clamp_page_size(size);
    let start = match cursor {
        Some(cursor) => Bound::Excluded(cursor.as_str()),
        None => Bound::Unbounded,
    };

    let mut range = entries.range::<str, _>((start, Bound::Unbounded));
    let mut items = Vec::with_capacity(size);
    let mut last_key = None;
    for (key, value) in range.by_ref().take(size) {
        items.push(value.clone());
        last_key = Some(key.as_str());
    }

    let cursor = match (range.next(), last_key) {
        (Some(_), Some(key)) => Some(Cursor::new(key)),
        _ => None,
    };
    Page::new(items, cursor)
}

impl StoreService for MemoryStore {
    fn agent_info(&self) -> Result<AgentInfo, RemoteError> {
        Ok(self.agent.clone())
    }

    fn spaces(&self) -> Result<Vec<Space>, RemoteError> {
        Ok(self
            .lock_spaces()
            .iter()
            .map(|state| state.space.clone())
            .collect())
    }

    fn usage(&self, space: &str) -> Result<u64, RemoteError> {
        self.with_space(space, |state| {
            state.usage.unwrap_or_else(|| {
                state
                    .blobs
                    .values()
                    .filter_map(|blob| blob.size)
                    .sum()
            })
        })
    }

    fn rate_limits(
        &self,
        subject: &str,
        provider: Option<&str>,
    ) -> Result<Vec<RateLimit>, RemoteError> {
        let Some(limits) = &self.rate_limits else {
            return Err(RemoteError::Unsupported {
                capability: "rate-limit".to_string(),
            });
        };

        if let (Some(requested), Some(known)) = (provider, limits.provider.as_deref())
            && requested != known
        {
            return Err(RemoteError::service(format!(
                "provider {requested} does not serve rate limits"
            )));
        }

        Ok(limits
            .entries
            .iter()
            .filter(|entry| entry.subject == subject)
            .map(|entry| RateLimit {
                id: entry.id.clone(),
                limit: entry.limit,
            })
            .collect())
    }

    fn list_uploads(
        &self,
        space: &str,
        cursor: Option<&Cursor>,
        size: usize,
    ) -> Result<Page<Upload>, RemoteError> {
        self.begin_list(space)?;
        self.with_space(space, |state| page_after(&state.uploads, cursor, size))
    }

    fn list_blobs(
        &self,
        space: &str,
        cursor: Option<&Cursor>,
        size: usize,
    ) -> Result<Page<Blob>, RemoteError> {
        self.begin_list(space)?;
        self.with_space(space, |state| page_after(&state.blobs, cursor, size))
    }

    fn remove_upload(
        &self,
        space: &str,
        root: &str,
        remove_shards: bool,
    ) -> Result<Removed, RemoteError> {
        let _guard = self.begin_removal(root)?;
        self.with_space(space, |state| {
            let upload = state
                .uploads
                .remove(root)
                .ok_or_else(|| RemoteError::not_found(format!("upload {root}")))?;
            if !remove_shards {
                return Ok(Removed::default());
            }

            let freed = upload
                .shards
                .iter()
                .filter_map(|shard| shard.digest.as_deref())
                .filter_map(|digest| state.blobs.remove(digest))
                .filter_map(|blob| blob.size)
                .sum();
            Ok(Removed {
                freed_bytes: Some(freed),
            })
        })?
    }

    fn remove_blob(&self, space: &str, digest: &str) -> Result<Removed, RemoteError> {
        let _guard = self.begin_removal(digest)?;
        self.with_space(space, |state| {
            state
                .blobs
                .remove(digest)
                .map(|blob| Removed {
                    freed_bytes: blob.size,
                })
                .ok_or_else(|| RemoteError::not_found(format!("blob {digest}")))
        })?
    }

    fn blob_info(&self, space: &str, digest: &str) -> Result<Blob, RemoteError> {
        self.with_space(space, |state| state.blobs.get(digest).cloned())?
            .ok_or_else(|| RemoteError::not_found(format!("blob {digest}")))
    }
}
