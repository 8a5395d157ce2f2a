use anyhow::{Context, Result};
use blobdeck_core::bulk::{BulkEvent, BulkOptions, BulkOrchestrator, BulkRun, BulkStop};
use blobdeck_core::executor::{ExecutionResult, ItemOutcome, run_with_concurrency};
use blobdeck_core::format::format_bytes;
use blobdeck_core::page::{PageSource, clamp_page_size};
use blobdeck_core::store::{Blob, Space, Upload};

use crate::App;
use crate::blobs::BlobSource;
use crate::prompt::check_confirmation;
use crate::uploads::UploadSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeTarget {
    UploadsPage,
    UploadsAll,
    BlobsAll,
}

impl PurgeTarget {
    pub fn title(self) -> &'static str {
        match self {
            Self::UploadsPage | Self::UploadsAll => "Purge Uploads",
            Self::BlobsAll => "Purge Blobs",
        }
    }

    pub fn removes_uploads(self) -> bool {
        matches!(self, Self::UploadsPage | Self::UploadsAll)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeRequest {
    pub space: Space,
    pub target: PurgeTarget,
    pub page_size: usize,
    pub concurrency: usize,
    pub remove_shards: bool,
}

impl PurgeRequest {
    pub fn options(&self) -> BulkOptions {
        BulkOptions::new(self.page_size, self.concurrency)
    }

    pub fn space_line(&self) -> String {
        format!(
            "Space: {} ({})",
            self.space.name.as_deref().unwrap_or("(no name)"),
            self.space.did
        )
    }

    pub fn header_lines(&self) -> Vec<String> {
        let options = self.options();
        let mut lines = vec![self.space_line()];
        if self.target.removes_uploads() {
            lines.push(format!(
                "Remove shards: {}",
                if self.remove_shards { "yes" } else { "no" }
            ));
        }
        lines.push(match self.target {
            PurgeTarget::UploadsPage => {
                format!("Mode: current page  concurrency={}", options.concurrency)
            }
            PurgeTarget::UploadsAll | PurgeTarget::BlobsAll => format!(
                "Mode: ALL pages  size={} concurrency={}",
                options.page_size, options.concurrency
            ),
        });
        lines
    }

    pub fn danger_message(&self, token: &str) -> String {
        let what = if self.target.removes_uploads() {
            "uploads"
        } else {
            "blobs"
        };
        format!(
            "Danger: This will purge ALL {what} from space \"{}\" ({}). This is irreversible.\nConfirm: Type {token} then Enter",
            self.space.name.as_deref().unwrap_or("(no name)"),
            self.space.did
        )
    }
}

/// Log lines for one orchestrator event.
pub fn bulk_event_line(event: &BulkEvent) -> Vec<String> {
    match event {
        BulkEvent::PageFetched {
            page,
            items,
            scanned,
        } => vec![format!("Page {page}: {items} item(s), scanned={scanned}")],
        BulkEvent::TargetsSkipped { page, count } => {
            vec![format!("Page {page}: skipped {count} item(s) without an id")]
        }
        BulkEvent::Removed {
            target,
            freed_bytes: Some(freed),
            ..
        } => vec![format!("Removed: {target} freed={}", format_bytes(Some(*freed)))],
        BulkEvent::Removed { target, .. } => vec![format!("Removed: {target}")],
        BulkEvent::ItemFailed { target, error, .. } => vec![format!("Failed: {target} ({error})")],
        BulkEvent::EmptyPage { .. } => vec!["No items found on this page.".to_string()],
        BulkEvent::PageFailed { page, error } => {
            vec![format!("Failed to list page {page}: {error}")]
        }
        BulkEvent::Finished(run) => {
            let mut lines = Vec::new();
            if let Some(BulkStop::PageFailed(_)) = &run.stop {
                lines.push("Stopped early after a listing failure.".to_string());
            }
            if run.failed() > 0 {
                lines.push(format!("Failed items: {}", run.failed()));
            }
            lines.push(run.summary_line());
            lines
        }
    }
}

impl App {
    /// First page of uploads, shown before a current-page purge.
    pub fn preview_upload_page(&self, request: &PurgeRequest) -> Result<Vec<Upload>> {
        let source = UploadSource::new(self.store(), request.space.did.clone());
        let page = source
            .fetch(None, clamp_page_size(request.page_size))
            .with_context(|| format!("failed to list uploads for {}", request.space.did))?;
        Ok(page.items)
    }

    pub fn preview_lines(uploads: &[Upload], page_size: usize) -> Vec<String> {
        let mut lines = vec![format!(
            "Uploads to purge (showing up to {page_size}): {}",
            uploads.len()
        )];
        lines.extend(
            uploads
                .iter()
                .map(|upload| format!("- {} shards={}", upload.root, upload.shards.len())),
        );
        lines
    }

    /// Removes exactly the given roots, without listing further pages.
    pub fn purge_upload_page(
        &self,
        request: &PurgeRequest,
        roots: &[String],
        log: &(dyn Fn(String) + Sync),
    ) -> Result<ExecutionResult<String>> {
        let space = request.space.did.as_str();
        let result = run_with_concurrency(
            roots,
            request.options().concurrency,
            |root| self.store.remove_upload(space, root, request.remove_shards),
            |outcome| match outcome {
                ItemOutcome::Succeeded { item, .. } => log(format!("Removed: {item}")),
                ItemOutcome::Failed { item, error } => log(format!("Failed: {item} ({error})")),
            },
        )
        .context("failed to start purge workers")?;

        log(format!(
            "Purge complete. removed={} failed={}",
            result.succeeded, result.failed
        ));
        Ok(result)
    }

    /// Walks every page of the target collection after the typed token matches.
    pub fn purge_all(
        &self,
        request: &PurgeRequest,
        typed_token: &str,
        log: &(dyn Fn(String) + Sync),
    ) -> Result<BulkRun> {
        check_confirmation(typed_token, &self.config.defaults.confirm_token)?;

        let sink = |event: BulkEvent| {
            for line in bulk_event_line(&event) {
                log(line);
            }
        };
        let space = request.space.did.as_str();

        let run = match request.target {
            PurgeTarget::UploadsAll | PurgeTarget::UploadsPage => {
                let source = UploadSource::new(self.store(), space);
                BulkOrchestrator::new(&source, request.options()).run(
                    |upload: &Upload| Some(upload.root.clone()),
                    |root: &String| self.store.remove_upload(space, root, request.remove_shards),
                    sink,
                )
            }
            PurgeTarget::BlobsAll => {
                let source = BlobSource::new(self.store(), space);
                BulkOrchestrator::new(&source, request.options()).run(
                    |blob: &Blob| {
                        let digest = blob.digest.trim();
                        (!digest.is_empty()).then(|| digest.to_string())
                    },
                    |digest: &String| self.store.remove_blob(space, digest),
                    sink,
                )
            }
        };

        tracing::info!(
            space,
            purge = ?request.target,
            removed = run.removed,
            scanned = run.scanned,
            "purge finished"
        );
        Ok(run)
    }
}
