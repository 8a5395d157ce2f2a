use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use blobdeck_core::browser::{Column, ItemPresenter};
use blobdeck_core::format::{format_bytes, upload_size};
use blobdeck_core::modal::{Detail, ModalFrame};
use blobdeck_core::page::{Cursor, Page, PageSource, RemoteError};
use blobdeck_core::store::{Removed, Shard, StoreService, Upload};
use blobdeck_core::time::format_time;
use thiserror::Error;

use crate::App;

/// Uploads of one space, one page at a time.
pub struct UploadSource {
    store: Arc<dyn StoreService>,
    space: String,
}

impl UploadSource {
    pub fn new(store: Arc<dyn StoreService>, space: impl Into<String>) -> Self {
        Self {
            store,
            space: space.into(),
        }
    }
}

impl PageSource<Upload> for UploadSource {
    fn fetch(
        &self,
        cursor: Option<&Cursor>,
        page_size: usize,
    ) -> Result<Page<Upload>, RemoteError> {
        tracing::debug!(space = %self.space, page_size, "listing uploads");
        self.store.list_uploads(&self.space, cursor, page_size)
    }
}

const UPLOAD_COLUMNS: [Column; 5] = [
    Column::new("#", 3),
    Column::new("ROOT", 58),
    Column::new("SIZE", 10),
    Column::new("AT", 22),
    Column::new("SHARDS", 6),
];

const SHARD_LIST_HEADER: &str = "Shard list:";

type SizeCache = Arc<Mutex<HashMap<String, u64>>>;

pub struct UploadPresenter {
    store: Arc<dyn StoreService>,
    space: String,
    sizes: SizeCache,
}

impl UploadPresenter {
    pub fn new(store: Arc<dyn StoreService>, space: impl Into<String>) -> Self {
        Self {
            store,
            space: space.into(),
            sizes: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl ItemPresenter<Upload> for UploadPresenter {
    fn columns(&self) -> &[Column] {
        &UPLOAD_COLUMNS
    }

    fn row(&self, item: &Upload, index: usize) -> Vec<String> {
        vec![
            index.to_string(),
            item.root.clone(),
            format_bytes(upload_size(item)),
            format_time(item.inserted_at.as_deref()),
            item.shards.len().to_string(),
        ]
    }

    fn detail(&self, item: &Upload) -> Option<Detail> {
        let mut lines = vec![
            format!("Root: {}", item.root),
            format!("Size: {}", format_bytes(upload_size(item))),
            format!("At: {}", format_time(item.inserted_at.as_deref())),
            format!("Shards: {}", item.shards.len()),
        ];

        if item.shards.is_empty() {
            return Some(Detail::Frame(ModalFrame::new("Upload Details", lines)));
        }

        lines.push(String::new());
        lines.push(SHARD_LIST_HEADER.to_string());
        let first_shard_line = lines.len();
        lines.extend(item.shards.iter().enumerate().map(|(index, shard)| {
            let size = shard
                .size
                .map(|size| format!(" ({})", format_bytes(Some(size))))
                .unwrap_or_default();
            format!("  {}. {}{size}", index + 1, shard.cid)
        }));

        let lookup = ShardLookup {
            store: Arc::clone(&self.store),
            space: self.space.clone(),
            sizes: Arc::clone(&self.sizes),
            shards: item.shards.clone(),
        };
        let frame = ModalFrame::new("Upload Details", lines).with_handler(move |line: usize| {
            let index = line.checked_sub(first_shard_line)?;
            lookup.shard_detail(index)
        });
        Some(Detail::Frame(frame))
    }

    fn detail_title(&self, _item: &Upload) -> String {
        "Upload Details".to_string()
    }
}

struct ShardLookup {
    store: Arc<dyn StoreService>,
    space: String,
    sizes: SizeCache,
    shards: Vec<Shard>,
}

impl ShardLookup {
    fn shard_detail(&self, index: usize) -> Option<Detail> {
        let shard = self.shards.get(index)?;
        let size = shard.size.or_else(|| {
            shard
                .digest
                .as_deref()
                .and_then(|digest| self.blob_size(digest))
        });

        let mut lines = vec![
            format!(
                "CID: {}",
                if shard.cid.is_empty() { "--" } else { shard.cid.as_str() }
            ),
            format!("Size: {}", format_bytes(size)),
        ];
        if let Some(digest) = shard.digest.as_deref().filter(|digest| !digest.is_empty()) {
            lines.push(format!("Digest: {digest}"));
        }
        Some(Detail::Frame(ModalFrame::new(
            format!("Shard {}", index + 1),
            lines,
        )))
    }

    fn blob_size(&self, digest: &str) -> Option<u64> {
        if let Some(size) = self
            .sizes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(digest)
        {
            return Some(*size);
        }

        match self.store.blob_info(&self.space, digest) {
            Ok(blob) => {
                let size = blob.size?;
                self.sizes
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(digest.to_string(), size);
                Some(size)
            }
            Err(error) => {
                tracing::debug!(%digest, %error, "blob info lookup failed");
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteUploadRequest {
    pub space: String,
    pub root: String,
    pub remove_shards: bool,
}

#[derive(Debug, Error)]
pub enum DeleteError {
    #[error("{what} was not found in space {space}")]
    Missing { what: String, space: String },
    #[error("removal failed: {message}")]
    Rejected { message: String },
}

impl DeleteError {
    pub(crate) fn from_remote(space: &str, error: RemoteError) -> Self {
        match error {
            RemoteError::NotFound { what } => Self::Missing {
                what,
                space: space.to_string(),
            },
            other => Self::Rejected {
                message: other.to_string(),
            },
        }
    }
}

impl App {
    pub fn upload_source(&self, space: &str) -> UploadSource {
        UploadSource::new(self.store(), space)
    }

    pub fn upload_presenter(&self, space: &str) -> UploadPresenter {
        UploadPresenter::new(self.store(), space)
    }

    pub fn delete_upload(&self, request: &DeleteUploadRequest) -> Result<Removed> {
        let removed = self
            .store
            .remove_upload(&request.space, &request.root, request.remove_shards)
            .map_err(|error| DeleteError::from_remote(&request.space, error))?;
        tracing::info!(space = %request.space, root = %request.root, "removed upload");
        Ok(removed)
    }
}
