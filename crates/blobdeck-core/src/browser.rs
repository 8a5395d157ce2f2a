use crate::modal::{Activation, Detail, Focus, ModalFrame, ModalStack};
use crate::nav::{LoadState, NavOutcome, Navigator};
use crate::page::{Page, RemoteError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub title: &'static str,
    pub width: u16,
}

impl Column {
    pub const fn new(title: &'static str, width: u16) -> Self {
        Self { title, width }
    }
}

/// Render boundary between a collection and the browser.
pub trait ItemPresenter<T> {
    fn columns(&self) -> &[Column];

    /// Cells for one row. `index` is the one-based row number on the page.
    fn row(&self, item: &T, index: usize) -> Vec<String>;

    fn detail(&self, item: &T) -> Option<Detail>;

    fn detail_title(&self, item: &T) -> String;
}

/// One interactive browse: page navigation plus the modal frames over it.
pub struct BrowserSession<T, P> {
    nav: Navigator<T>,
    modals: ModalStack,
    presenter: P,
}

impl<T, P> BrowserSession<T, P>
where
    P: ItemPresenter<T>,
{
    pub fn new(page_size: usize, presenter: P) -> Self {
        Self {
            nav: Navigator::new(page_size),
            modals: ModalStack::new(),
            presenter,
        }
    }

    pub fn nav(&self) -> &Navigator<T> {
        &self.nav
    }

    pub fn modals(&self) -> &ModalStack {
        &self.modals
    }

    pub fn modals_mut(&mut self) -> &mut ModalStack {
        &mut self.modals
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn modal_depth(&self) -> usize {
        self.modals.depth()
    }

    pub fn start(&mut self) -> NavOutcome {
        self.nav.start()
    }

    pub fn go_next(&mut self) -> NavOutcome {
        if self.modals.is_active() {
            return NavOutcome::Ignored;
        }
        self.nav.go_next()
    }

    pub fn go_prev(&mut self) -> NavOutcome {
        if self.modals.is_active() {
            return NavOutcome::Ignored;
        }
        self.nav.go_prev()
    }

    pub fn move_up(&mut self) {
        if !self.modals.is_active() {
            self.nav.move_up();
        }
    }

    pub fn move_down(&mut self) {
        if !self.modals.is_active() {
            self.nav.move_down();
        }
    }

    pub fn finish(&mut self, result: Result<Page<T>, RemoteError>) {
        self.nav.finish(result);
    }

    /// Opens the detail frame for the selected row, if the row has one.
    pub fn open_selected(&mut self) -> bool {
        if self.modals.is_active() || self.nav.is_loading() {
            return false;
        }
        let Some(item) = self.nav.selected_item() else {
            return false;
        };
        let Some(detail) = self.presenter.detail(item) else {
            return false;
        };

        let title = self.presenter.detail_title(item);
        self.modals.push(
            detail.into_frame(&title),
            Focus::Table {
                selection: self.nav.selection(),
            },
        );
        true
    }

    /// Closes the top frame. Leaving the last frame restores the table
    /// selection and refreshes the page.
    pub fn close_modal(&mut self) -> NavOutcome {
        match self.modals.pop() {
            Some(focus) => self.restore(focus),
            None => NavOutcome::Ignored,
        }
    }

    pub fn activate_modal_line(&mut self) -> NavOutcome {
        match self.modals.activate_current() {
            Activation::Popped(focus) => self.restore(focus),
            Activation::Pushed | Activation::Empty => NavOutcome::Ignored,
        }
    }

    pub fn top_frame_mut(&mut self) -> Option<&mut ModalFrame> {
        self.modals.top_mut()
    }

    fn restore(&mut self, focus: Focus) -> NavOutcome {
        match focus {
            Focus::Table { selection } => {
                self.nav.set_selection(selection);
                self.nav.reload()
            }
            Focus::Frame { .. } => NavOutcome::Ignored,
        }
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.nav
            .items()
            .iter()
            .enumerate()
            .map(|(index, item)| self.presenter.row(item, index + 1))
            .collect()
    }

    pub fn footer(&self) -> String {
        match self.nav.state() {
            LoadState::Idle | LoadState::Loading => "Loading...".to_string(),
            LoadState::Failed(message) => format!("Failed to load page: {message}"),
            LoadState::Loaded => {
                let mut footer = format!(
                    "page {} ({})  j/k or ↑/↓ select  h/← prev  l/→ next  Enter: details  q quit",
                    self.nav.page_number(),
                    self.nav.items().len()
                );
                if !self.nav.has_next() {
                    footer.push_str("  [end]");
                }
                footer
            }
        }
    }
}
