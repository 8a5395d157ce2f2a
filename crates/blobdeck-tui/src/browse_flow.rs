use std::sync::mpsc::{Receiver, TryRecvError};

use anyhow::Result;
use blobdeck_core::browser::{BrowserSession, ItemPresenter};
use blobdeck_core::nav::{LoadState, NavOutcome};
use blobdeck_core::page::RemoteError;
use crossterm::event::KeyEvent;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::Line;

use crate::UiExit;
use crate::effects::{Effect, Effects};
use crate::keymap;
use crate::theme;
use crate::ui::loading::{LoadingState, PageLoader, PageResult};
use crate::ui::message::apply_frame_key;
use crate::ui::modal::render_frame_modal;
use crate::ui::page_table::{PageTableRender, render_page_table};
use crate::ui::text::{compact_hint, focus_line, key_hint_paragraph};

const MODAL_KEYS: &str =
    "j/k: line    PgUp/PgDn: page    g/G: first/last    y/c: copy line    a: copy all    Enter: open    q/Esc: close";

/// Interactive page browser over one collection.
pub(crate) struct BrowseScreen<T, P> {
    title: String,
    session: BrowserSession<T, P>,
    loader: Box<dyn PageLoader<T>>,
    pending: Option<Receiver<PageResult<T>>>,
    loading: LoadingState,
    effects: Effects,
}

impl<T, P> BrowseScreen<T, P>
where
    P: ItemPresenter<T>,
{
    pub(crate) fn new(
        title: impl Into<String>,
        page_size: usize,
        presenter: P,
        loader: Box<dyn PageLoader<T>>,
    ) -> Self {
        let mut screen = Self {
            title: title.into(),
            session: BrowserSession::new(page_size, presenter),
            loader,
            pending: None,
            loading: LoadingState::default(),
            effects: Effects::default(),
        };
        let outcome = screen.session.start();
        screen.apply(outcome);
        screen
    }

    #[cfg(test)]
    pub(crate) fn session(&self) -> &BrowserSession<T, P> {
        &self.session
    }

    pub(crate) fn take_effects(&mut self) -> Vec<Effect> {
        self.effects.take()
    }

    pub(crate) fn is_fetching(&self) -> bool {
        self.pending.is_some()
    }

    fn apply(&mut self, outcome: NavOutcome) {
        match outcome {
            NavOutcome::Fetch(request) => {
                tracing::debug!(page_size = request.page_size, "fetching page");
                self.pending = Some(self.loader.spawn_fetch(request));
            }
            NavOutcome::Bell => self.effects.push(Effect::Bell),
            NavOutcome::Ignored => {}
        }
    }

    pub(crate) fn on_tick(&mut self) -> Result<()> {
        let Some(receiver) = &self.pending else {
            return Ok(());
        };
        self.loading.next_frame();

        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return Ok(()),
            Err(TryRecvError::Disconnected) => {
                Err(RemoteError::service("page loader ended unexpectedly"))
            }
        };
        self.pending = None;
        if let Err(error) = &result {
            tracing::warn!(%error, "page fetch failed");
        }
        self.session.finish(result);
        Ok(())
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent) -> Result<Option<UiExit>> {
        if self.session.modals().is_active() {
            self.on_modal_key(key);
            return Ok(None);
        }

        if keymap::is_close(key) {
            return Ok(Some(UiExit::BackAtRoot));
        }

        if keymap::is_up(key) {
            self.session.move_up();
        } else if keymap::is_down(key) {
            self.session.move_down();
        } else if keymap::is_prev_page(key) {
            let outcome = self.session.go_prev();
            self.apply(outcome);
        } else if keymap::is_next_page(key) {
            let outcome = self.session.go_next();
            self.apply(outcome);
        } else if keymap::is_confirm(key) {
            self.session.open_selected();
        }
        Ok(None)
    }

    fn on_modal_key(&mut self, key: KeyEvent) {
        if keymap::is_close(key) {
            let outcome = self.session.close_modal();
            self.apply(outcome);
            return;
        }
        if keymap::is_confirm(key) {
            let outcome = self.session.activate_modal_line();
            self.apply(outcome);
            return;
        }
        if let Some(top) = self.session.top_frame_mut() {
            apply_frame_key(top, key, &mut self.effects);
        }
    }

    pub(crate) fn render(&self, frame: &mut ratatui::Frame<'_>) {
        let area = frame.area();
        let [body, footer] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(6), Constraint::Length(3)])
            .areas(area);

        let nav = self.session.nav();
        render_page_table(
            frame,
            body,
            PageTableRender {
                title: focus_line(format!("{}  page {}", self.title, nav.page_number())),
                empty_message: if self.is_fetching() {
                    "Loading..."
                } else {
                    "No items on this page."
                },
                columns: self.session.presenter().columns(),
                rows: self.session.rows(),
                selection: nav.selection(),
            },
        );

        let mut status = self.session.footer();
        if self.is_fetching() {
            status = format!("{} {status}", self.loading.current_frame());
        }
        let style = if matches!(nav.state(), LoadState::Failed(_)) {
            theme::error_prompt()
        } else {
            theme::secondary_text()
        };
        frame.render_widget(
            key_hint_paragraph(Line::styled(status, style)).block(theme::key_block()),
            footer,
        );

        if let Some(top) = self.session.modals().top() {
            let hint = compact_hint(
                area.width,
                MODAL_KEYS,
                "j/k line  g/G ends  y/a copy  Enter open  q close",
                "j/k | y/a | q",
            );
            render_frame_modal(frame, top, hint);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::{self, Receiver};
    use std::sync::{Arc, Mutex};

    use blobdeck_app::{BlobPresenter, UploadPresenter};
    use blobdeck_core::memory::{MemoryStore, Snapshot, SnapshotSpace};
    use blobdeck_core::nav::FetchRequest;
    use blobdeck_core::page::{Cursor, Page, PageSource, RemoteError};
    use blobdeck_core::store::{Blob, Shard, StoreService, Upload};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::BrowseScreen;
    use crate::UiExit;
    use crate::effects::Effect;
    use crate::ui::loading::{PageLoader, PageResult};

    const SPACE: &str = "did:key:space";

    /// Fetches synchronously and records every request it served.
    struct InlineLoader<T> {
        source: Arc<dyn PageSource<T>>,
        requests: Arc<Mutex<Vec<FetchRequest>>>,
    }

    impl<T> PageLoader<T> for InlineLoader<T> {
        fn spawn_fetch(&self, request: FetchRequest) -> Receiver<PageResult<T>> {
            let (sender, receiver) = mpsc::channel();
            self.requests
                .lock()
                .expect("requests")
                .push(request.clone());
            let _ = sender.send(self.source.fetch(request.cursor.as_ref(), request.page_size));
            receiver
        }
    }

    struct FailingSource;

    impl PageSource<Blob> for FailingSource {
        fn fetch(
            &self,
            _cursor: Option<&Cursor>,
            _page_size: usize,
        ) -> Result<Page<Blob>, RemoteError> {
            Err(RemoteError::service("listing denied"))
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn store(uploads: usize) -> Arc<MemoryStore> {
        let mut space = SnapshotSpace::new(SPACE);
        space.uploads = (1..=uploads)
            .map(|index| Upload {
                root: format!("bafy{index:02}"),
                shards: vec![Shard {
                    cid: format!("bag{index:02}"),
                    size: Some(10),
                    digest: None,
                }],
                size: None,
                inserted_at: None,
            })
            .collect();
        Arc::new(MemoryStore::from_snapshot(Snapshot {
            spaces: vec![space],
            ..Snapshot::default()
        }))
    }

    fn upload_screen(
        store: Arc<MemoryStore>,
        page_size: usize,
    ) -> (BrowseScreen<Upload, UploadPresenter>, Arc<Mutex<Vec<FetchRequest>>>) {
        let dyn_store: Arc<dyn StoreService> = store;
        let source = blobdeck_app::UploadSource::new(Arc::clone(&dyn_store), SPACE);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let loader = InlineLoader {
            source: Arc::new(source),
            requests: Arc::clone(&requests),
        };
        let mut screen = BrowseScreen::new(
            "Uploads",
            page_size,
            UploadPresenter::new(dyn_store, SPACE),
            Box::new(loader),
        );
        screen.on_tick().expect("tick");
        (screen, requests)
    }

    #[test]
    fn first_page_loads_on_open() {
        let (screen, requests) = upload_screen(store(3), 2);
        assert_eq!(requests.lock().expect("requests").len(), 1);
        assert_eq!(screen.session().nav().items().len(), 2);
        assert!(!screen.is_fetching());
    }

    #[test]
    fn next_and_prev_pages_follow_cursor_history() {
        let (mut screen, requests) = upload_screen(store(3), 2);

        screen.on_key(key(KeyCode::Char('l'))).expect("next");
        screen.on_tick().expect("tick");
        assert_eq!(screen.session().nav().page_number(), 2);
        assert_eq!(screen.session().nav().items()[0].root, "bafy03");

        screen.on_key(key(KeyCode::Char('h'))).expect("prev");
        screen.on_tick().expect("tick");
        assert_eq!(screen.session().nav().page_number(), 1);
        assert_eq!(requests.lock().expect("requests")[2].cursor, None);
    }

    #[test]
    fn next_on_last_page_rings_bell_without_fetching() {
        let (mut screen, requests) = upload_screen(store(2), 5);

        screen.on_key(key(KeyCode::Right)).expect("next");
        assert_eq!(screen.take_effects(), vec![Effect::Bell]);
        assert_eq!(requests.lock().expect("requests").len(), 1);
    }

    #[test]
    fn page_keys_are_ignored_while_a_frame_is_open() {
        let (mut screen, requests) = upload_screen(store(3), 2);

        screen.on_key(key(KeyCode::Enter)).expect("open");
        assert_eq!(screen.session().modal_depth(), 1);
        screen.on_key(key(KeyCode::Char('l'))).expect("next");
        assert_eq!(requests.lock().expect("requests").len(), 1);
        assert_eq!(screen.session().nav().page_number(), 1);

        screen.on_key(key(KeyCode::Char('q'))).expect("close");
        screen.on_tick().expect("tick");
        assert_eq!(screen.session().modal_depth(), 0);
        assert_eq!(screen.session().nav().selection(), 1);
    }

    #[test]
    fn copy_in_frame_emits_clipboard_effect() {
        let (mut screen, _) = upload_screen(store(1), 2);
        screen.on_key(key(KeyCode::Enter)).expect("open");
        screen.on_key(key(KeyCode::Char('y'))).expect("copy");
        assert_eq!(
            screen.take_effects(),
            vec![Effect::Copy("Root: bafy01".to_string())]
        );
    }

    #[test]
    fn q_outside_frames_returns_home() {
        let (mut screen, _) = upload_screen(store(1), 2);
        assert_eq!(
            screen.on_key(key(KeyCode::Char('q'))).expect("quit"),
            Some(UiExit::BackAtRoot)
        );
    }

    #[test]
    fn failed_fetch_is_shown_in_footer() {
        let loader = InlineLoader {
            source: Arc::new(FailingSource),
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        let mut screen = BrowseScreen::new("Blobs", 10, BlobPresenter, Box::new(loader));
        screen.on_tick().expect("tick");

        let mut terminal = Terminal::new(TestBackend::new(120, 20)).expect("terminal");
        terminal.draw(|frame| screen.render(frame)).expect("draw");
        let output = format!("{}", terminal.backend());
        assert!(output.contains("Failed to load page: listing denied"));
    }

    #[test]
    fn render_shows_rows_and_footer() {
        let (screen, _) = upload_screen(store(2), 5);
        let mut terminal = Terminal::new(TestBackend::new(140, 20)).expect("terminal");
        terminal.draw(|frame| screen.render(frame)).expect("draw");
        let output = format!("{}", terminal.backend());
        assert!(output.contains("ROOT"));
        assert!(output.contains("bafy02"));
        assert!(output.contains("[end]"));
    }
}
