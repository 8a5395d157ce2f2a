mod support;

use std::sync::Arc;
use std::time::Duration;

use blobdeck_app::{PromptError, PurgeRequest, PurgeTarget};
use blobdeck_core::bulk::BulkStop;

use support::{LogCapture, SPACE, app_over, seeded_store, space};

fn request(target: PurgeTarget, page_size: usize, concurrency: usize) -> PurgeRequest {
    PurgeRequest {
        space: space(),
        target,
        page_size,
        concurrency,
        remove_shards: false,
    }
}

#[test]
fn purge_all_uploads_walks_every_page() {
    let store = Arc::new(seeded_store(10));
    let app = app_over(Arc::clone(&store));
    let log = LogCapture::default();

    let run = app
        .purge_all(&request(PurgeTarget::UploadsAll, 3, 2), "PURGE", &|line: String| {
            log.push(line)
        })
        .expect("purge");

    assert_eq!(run.pages, 4);
    assert_eq!(store.list_calls(), 4);
    assert_eq!(run.scanned, 10);
    assert_eq!(run.removed, 10);
    assert_eq!(run.stop, Some(BulkStop::Exhausted));
    assert_eq!(store.upload_count(SPACE), 0);
    assert_eq!(log.count_prefixed("Removed: "), 10);
    assert_eq!(
        log.lines().last().map(String::as_str),
        Some("Purge complete: removed=10 scanned=10")
    );
}

#[test]
fn failing_item_is_isolated_from_the_rest_of_the_run() {
    let store = Arc::new(seeded_store(10));
    store.fail_removal("bafyupload07");
    let app = app_over(Arc::clone(&store));
    let log = LogCapture::default();

    let run = app
        .purge_all(&request(PurgeTarget::UploadsAll, 3, 2), "PURGE", &|line: String| {
            log.push(line)
        })
        .expect("purge");

    assert_eq!(run.scanned, 10);
    assert_eq!(run.removed, 9);
    assert_eq!(run.failures.len(), 1);
    assert_eq!(run.failures[0].item, "bafyupload07");
    assert!(store.contains_upload(SPACE, "bafyupload07"));
    assert_eq!(log.count_prefixed("Failed: bafyupload07"), 1);
}

#[test]
fn lowercase_confirmation_aborts_without_mutation() {
    let store = Arc::new(seeded_store(10));
    let app = app_over(Arc::clone(&store));
    let log = LogCapture::default();

    let error = app
        .purge_all(&request(PurgeTarget::UploadsAll, 3, 2), "purge", &|line: String| {
            log.push(line)
        })
        .expect_err("mismatch");

    assert_eq!(
        error.downcast_ref::<PromptError>(),
        Some(&PromptError::ConfirmationMismatch {
            expected: "PURGE".to_string()
        })
    );
    assert_eq!(store.list_calls(), 0);
    assert_eq!(store.remove_calls(), 0);
    assert_eq!(store.upload_count(SPACE), 10);
    assert!(log.lines().is_empty());
}

#[test]
fn bulk_removals_respect_concurrency_bound() {
    let store = Arc::new(seeded_store(12).with_removal_delay(Duration::from_millis(5)));
    let app = app_over(Arc::clone(&store));

    let run = app
        .purge_all(&request(PurgeTarget::UploadsAll, 6, 3), "PURGE", &|_: String| {})
        .expect("purge");

    assert_eq!(run.removed, 12);
    assert!(store.peak_concurrent_removals() <= 3);
}

#[test]
fn page_fetch_failure_stops_the_run() {
    let store = Arc::new(seeded_store(10));
    store.fail_list_call(2);
    let app = app_over(Arc::clone(&store));
    let log = LogCapture::default();

    let run = app
        .purge_all(&request(PurgeTarget::UploadsAll, 3, 2), "PURGE", &|line: String| {
            log.push(line)
        })
        .expect("purge");

    assert_eq!(run.scanned, 3);
    assert_eq!(run.removed, 3);
    assert!(matches!(run.stop, Some(BulkStop::PageFailed(_))));
    assert_eq!(store.upload_count(SPACE), 7);
    assert_eq!(log.count_prefixed("Failed to list page 2"), 1);
}

#[test]
fn purge_all_blobs_reports_freed_bytes() {
    let store = Arc::new(seeded_store(3));
    let app = app_over(Arc::clone(&store));
    let log = LogCapture::default();

    let run = app
        .purge_all(&request(PurgeTarget::BlobsAll, 50, 3), "PURGE", &|line: String| {
            log.push(line)
        })
        .expect("purge");

    assert_eq!(run.removed, 3);
    assert_eq!(store.blob_count(SPACE), 0);
    assert!(
        log.lines()
            .contains(&"Removed: zQmblob01 freed=2.00 KB".to_string())
    );
}

#[test]
fn purge_current_page_only_touches_previewed_uploads() {
    let store = Arc::new(seeded_store(5));
    let app = app_over(Arc::clone(&store));
    let log = LogCapture::default();
    let request = request(PurgeTarget::UploadsPage, 2, 2);

    let preview = app.preview_upload_page(&request).expect("preview");
    assert_eq!(preview.len(), 2);
    let lines = blobdeck_app::App::preview_lines(&preview, request.page_size);
    assert_eq!(lines[0], "Uploads to purge (showing up to 2): 2");
    assert_eq!(lines[1], "- bafyupload01 shards=1");

    let roots: Vec<String> = preview.iter().map(|upload| upload.root.clone()).collect();
    let result = app
        .purge_upload_page(&request, &roots, &|line: String| log.push(line))
        .expect("purge");

    assert_eq!(result.succeeded, 2);
    assert_eq!(store.upload_count(SPACE), 3);
    assert_eq!(
        log.lines().last().map(String::as_str),
        Some("Purge complete. removed=2 failed=0")
    );
}

#[test]
fn header_lines_describe_mode() {
    let mut purge = request(PurgeTarget::UploadsAll, 900, 0);
    purge.remove_shards = true;
    assert_eq!(
        purge.header_lines(),
        vec![
            "Space: primary (did:key:z6MkSpace)".to_string(),
            "Remove shards: yes".to_string(),
            "Mode: ALL pages  size=500 concurrency=1".to_string(),
        ]
    );
    assert!(
        purge
            .danger_message("PURGE")
            .contains("Type PURGE then Enter")
    );
}
