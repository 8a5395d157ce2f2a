use std::sync::Arc;

use anyhow::Result;
use blobdeck_core::browser::{Column, ItemPresenter};
use blobdeck_core::format::format_bytes;
use blobdeck_core::modal::Detail;
use blobdeck_core::page::{Cursor, Page, PageSource, RemoteError};
use blobdeck_core::store::{Blob, Removed, StoreService};
use blobdeck_core::time::format_time;

use crate::App;
use crate::uploads::DeleteError;

pub struct BlobSource {
    store: Arc<dyn StoreService>,
    space: String,
}

impl BlobSource {
    pub fn new(store: Arc<dyn StoreService>, space: impl Into<String>) -> Self {
        Self {
            store,
            space: space.into(),
        }
    }
}

impl PageSource<Blob> for BlobSource {
    fn fetch(&self, cursor: Option<&Cursor>, page_size: usize) -> Result<Page<Blob>, RemoteError> {
        tracing::debug!(space = %self.space, page_size, "listing blobs");
        self.store.list_blobs(&self.space, cursor, page_size)
    }
}

const BLOB_COLUMNS: [Column; 5] = [
    Column::new("#", 3),
    Column::new("DIGEST", 52),
    Column::new("SIZE", 10),
    Column::new("AT", 22),
    Column::new("CAUSE", 10),
];

/// Blob rows have no drill-down.
pub struct BlobPresenter;

impl ItemPresenter<Blob> for BlobPresenter {
    fn columns(&self) -> &[Column] {
        &BLOB_COLUMNS
    }

    fn row(&self, item: &Blob, index: usize) -> Vec<String> {
        vec![
            index.to_string(),
            item.digest.clone(),
            format_bytes(item.size),
            format_time(item.inserted_at.as_deref()),
            item.cause.clone().unwrap_or_else(|| "--".to_string()),
        ]
    }

    fn detail(&self, _item: &Blob) -> Option<Detail> {
        None
    }

    fn detail_title(&self, item: &Blob) -> String {
        format!("Blob {}", item.digest)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteBlobRequest {
    pub space: String,
    pub digest: String,
}

impl App {
    pub fn blob_source(&self, space: &str) -> BlobSource {
        BlobSource::new(self.store(), space)
    }

    pub fn delete_blob(&self, request: &DeleteBlobRequest) -> Result<Removed> {
        let removed = self
            .store
            .remove_blob(&request.space, &request.digest)
            .map_err(|error| DeleteError::from_remote(&request.space, error))?;
        tracing::info!(space = %request.space, digest = %request.digest, "removed blob");
        Ok(removed)
    }
}
