use crate::page::{Cursor, Page, PageSource, RemoteError, clamp_page_size};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Reload,
    Next,
    Prev,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub cursor: Option<Cursor>,
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    /// The caller must run this fetch and hand the result to [`Navigator::finish`].
    Fetch(FetchRequest),
    Bell,
    Ignored,
}

#[derive(Debug, Clone)]
struct Pending {
    direction: Direction,
    cursor: Option<Cursor>,
}

/// Cursor-paginated browsing state.
///
/// `history` holds the cursor each earlier page was fetched with, so its
/// length always equals `page_index`. Selection 0 is the header row; item rows
/// are numbered from 1.
#[derive(Debug, Clone)]
pub struct Navigator<T> {
    page_size: usize,
    current_cursor: Option<Cursor>,
    next_cursor: Option<Cursor>,
    history: Vec<Option<Cursor>>,
    page_index: usize,
    items: Vec<T>,
    selection: usize,
    state: LoadState,
    pending: Option<Pending>,
}

impl<T> Navigator<T> {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: clamp_page_size(page_size),
            current_cursor: None,
            next_cursor: None,
            history: Vec::new(),
            page_index: 0,
            items: Vec::new(),
            selection: 0,
            state: LoadState::Idle,
            pending: None,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Cursor the displayed page was fetched with.
    pub fn current_cursor(&self) -> Option<&Cursor> {
        self.current_cursor.as_ref()
    }

    pub fn next_cursor(&self) -> Option<&Cursor> {
        self.next_cursor.as_ref()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// One-based page number for display.
    pub fn page_number(&self) -> usize {
        self.page_index + 1
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn selection(&self) -> usize {
        self.selection
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn has_next(&self) -> bool {
        self.next_cursor.is_some()
    }

    pub fn has_prev(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.selection
            .checked_sub(1)
            .and_then(|index| self.items.get(index))
    }

    pub fn start(&mut self) -> NavOutcome {
        self.reload()
    }

    /// Refetches the displayed page with its own cursor.
    pub fn reload(&mut self) -> NavOutcome {
        let cursor = self.current_cursor.clone();
        self.begin(Direction::Reload, cursor)
    }

    pub fn go_next(&mut self) -> NavOutcome {
        if self.is_loading() {
            return NavOutcome::Ignored;
        }
        match self.next_cursor.clone() {
            Some(cursor) => self.begin(Direction::Next, Some(cursor)),
            None => NavOutcome::Bell,
        }
    }

    pub fn go_prev(&mut self) -> NavOutcome {
        if self.is_loading() {
            return NavOutcome::Ignored;
        }
        match self.history.last().cloned() {
            Some(cursor) => self.begin(Direction::Prev, cursor),
            None => NavOutcome::Bell,
        }
    }

    fn begin(&mut self, direction: Direction, cursor: Option<Cursor>) -> NavOutcome {
        if self.is_loading() {
            return NavOutcome::Ignored;
        }
        self.state = LoadState::Loading;
        self.pending = Some(Pending {
            direction,
            cursor: cursor.clone(),
        });
        NavOutcome::Fetch(FetchRequest {
            cursor,
            page_size: self.page_size,
        })
    }

    /// Applies the result of the fetch requested by the last [`NavOutcome::Fetch`].
    ///
    /// Cursor, history and items only change when the fetch succeeded.
    pub fn finish(&mut self, result: Result<Page<T>, RemoteError>) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        let page = match result {
            Ok(page) => page,
            Err(error) => {
                self.state = LoadState::Failed(error.to_string());
                return;
            }
        };

        match pending.direction {
            Direction::Reload => {}
            Direction::Next => {
                self.history.push(self.current_cursor.take());
                self.page_index += 1;
            }
            Direction::Prev => {
                self.history.pop();
                self.page_index = self.page_index.saturating_sub(1);
            }
        }

        self.current_cursor = pending.cursor;
        self.next_cursor = page.cursor;
        self.items = page.items;
        self.selection = if self.items.is_empty() {
            0
        } else if self.selection == 0 {
            1
        } else {
            self.selection.min(self.items.len())
        };
        self.state = LoadState::Loaded;
    }

    /// Runs a pending fetch synchronously against `source`.
    pub fn load_with(&mut self, outcome: NavOutcome, source: &dyn PageSource<T>) -> NavOutcome {
        if let NavOutcome::Fetch(request) = &outcome {
            let result = source.fetch(request.cursor.as_ref(), request.page_size);
            self.finish(result);
        }
        outcome
    }

    pub fn move_up(&mut self) {
        if self.selection > 1 {
            self.selection -= 1;
        }
    }

    pub fn move_down(&mut self) {
        if self.selection < self.items.len() {
            self.selection += 1;
        }
    }

    pub fn set_selection(&mut self, selection: usize) {
        self.selection = selection.min(self.items.len());
    }
}
