mod support;

use std::sync::Arc;

use blobdeck_core::browser::{BrowserSession, ItemPresenter};
use blobdeck_core::modal::Activation;
use blobdeck_core::nav::NavOutcome;
use blobdeck_core::page::PageSource;
use blobdeck_core::store::{StoreService, Upload};

use support::{SPACE, app_over, seeded_store};

fn run_fetch(
    session: &mut BrowserSession<Upload, blobdeck_app::UploadPresenter>,
    source: &dyn PageSource<Upload>,
    outcome: NavOutcome,
) {
    if let NavOutcome::Fetch(request) = outcome {
        session.finish(source.fetch(request.cursor.as_ref(), request.page_size));
    }
}

#[test]
fn next_on_last_page_issues_no_fetch() {
    let store = Arc::new(seeded_store(2));
    let app = app_over(Arc::clone(&store));
    let source = app.upload_source(SPACE);
    let mut session = BrowserSession::new(5, app.upload_presenter(SPACE));

    let outcome = session.start();
    run_fetch(&mut session, &source, outcome);
    assert_eq!(store.list_calls(), 1);
    assert!(session.footer().ends_with("[end]"));

    let cursor_before = session.nav().current_cursor().cloned();
    assert_eq!(session.go_next(), NavOutcome::Bell);
    assert_eq!(store.list_calls(), 1);
    assert_eq!(session.nav().current_cursor().cloned(), cursor_before);
    assert_eq!(session.nav().items().len(), 2);
}

#[test]
fn upload_rows_follow_column_layout() {
    let store = Arc::new(seeded_store(1));
    let app = app_over(store);
    let presenter = app.upload_presenter(SPACE);

    let titles: Vec<&str> = presenter
        .columns()
        .iter()
        .map(|column| column.title)
        .collect();
    assert_eq!(titles, vec!["#", "ROOT", "SIZE", "AT", "SHARDS"]);

    let row = presenter.row(&support::upload(1), 1);
    assert_eq!(
        row,
        vec![
            "1".to_string(),
            "bafyupload01".to_string(),
            "--".to_string(),
            "2025-01-02 03:04:05".to_string(),
            "1".to_string(),
        ]
    );
}

#[test]
fn shard_drill_down_looks_up_blob_size_once() {
    let store = Arc::new(seeded_store(3));
    let app = app_over(Arc::clone(&store));
    let source = app.upload_source(SPACE);
    let mut session = BrowserSession::new(10, app.upload_presenter(SPACE));
    let outcome = session.start();
    run_fetch(&mut session, &source, outcome);

    assert!(session.open_selected());
    let frame = session.modals().top().expect("detail frame");
    assert_eq!(frame.title(), "Upload Details");
    assert_eq!(
        frame.lines(),
        &[
            "Root: bafyupload01".to_string(),
            "Size: --".to_string(),
            "At: 2025-01-02 03:04:05".to_string(),
            "Shards: 1".to_string(),
            String::new(),
            "Shard list:".to_string(),
            "  1. bagshard01".to_string(),
        ]
    );

    session.top_frame_mut().expect("frame").last();
    assert_eq!(session.modals_mut().activate_current(), Activation::Pushed);
    let shard = session.modals().top().expect("shard frame");
    assert_eq!(shard.title(), "Shard 1");
    assert_eq!(
        shard.lines(),
        &[
            "CID: bagshard01".to_string(),
            "Size: 2.00 KB".to_string(),
            "Digest: zQmblob01".to_string(),
        ]
    );

    session.close_modal();
    session.top_frame_mut().expect("frame").last();
    session.modals_mut().activate_current();
    assert_eq!(session.modal_depth(), 2);

    store.remove_blob(SPACE, "zQmblob01").expect("remove blob");
    session.close_modal();
    session.modals_mut().activate_current();
    let cached = session.modals().top().expect("shard frame");
    assert_eq!(cached.lines()[1], "Size: 2.00 KB");
}

#[test]
fn activating_header_line_closes_detail_and_reloads() {
    let store = Arc::new(seeded_store(3));
    let app = app_over(Arc::clone(&store));
    let source = app.upload_source(SPACE);
    let mut session = BrowserSession::new(10, app.upload_presenter(SPACE));
    let outcome = session.start();
    run_fetch(&mut session, &source, outcome);
    session.move_down();

    session.open_selected();
    let outcome = session.activate_modal_line();
    assert!(matches!(outcome, NavOutcome::Fetch(_)));
    run_fetch(&mut session, &source, outcome);

    assert_eq!(session.modal_depth(), 0);
    assert_eq!(session.nav().selection(), 2);
    assert_eq!(store.list_calls(), 2);
}

#[test]
fn blob_browser_has_no_detail_frames() {
    let store = Arc::new(seeded_store(2));
    let app = app_over(store);
    let source = app.blob_source(SPACE);
    let mut session = BrowserSession::new(10, blobdeck_app::BlobPresenter);
    let outcome = session.start();
    if let NavOutcome::Fetch(request) = outcome {
        session.finish(source.fetch(request.cursor.as_ref(), request.page_size));
    }

    assert_eq!(session.rows()[0][1], "zQmblob01");
    assert_eq!(session.rows()[0][4], "bafycause");
    assert!(!session.open_selected());
}
