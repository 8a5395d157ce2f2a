mod action_flow;
mod browse_flow;
mod effects;
mod keymap;
#[cfg(test)]
mod test_support;
mod theme;
mod ui;

use std::io::{Stdout, Write, stdout};
use std::sync::Arc;
use std::time::Duration;

use action_flow::{ActionExit, ActionScreen};
use anyhow::{Context, Result, anyhow};
use blobdeck_app::{App, BlobPresenter, UploadPresenter};
use blobdeck_core::page::PageSource;
use blobdeck_core::store::{Blob, Space, Upload};
use browse_flow::BrowseScreen;
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use effects::{Effect, Effects};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::{Line, Text};
use ratatui::widgets::{List, ListItem, ListState};

use crate::ui::loading::ThreadPageLoader;
use crate::ui::log_view::{JobSpawner, LogView, ThreadJobSpawner};
use crate::ui::message::MessageView;
use crate::ui::modal::{render_error_modal, render_notice_modal};
use crate::ui::text::{
    compact_hint, focus_line, key_hint_height, key_hint_paragraph, wrapped_paragraph,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiExit {
    Completed,
    BackAtRoot,
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootMenuExit {
    Action(RootAction),
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RootAction {
    ListSpaces,
    SpaceUsage,
    RateLimits,
    PurgeUploadsPage,
    PurgeUploadsAll,
    PurgeBlobsAll,
    DeleteUpload,
    DeleteBlob,
    ListUploads,
    ListBlobs,
    Exit,
}

impl RootAction {
    fn title(self) -> &'static str {
        match self {
            Self::ListSpaces => "List spaces",
            Self::SpaceUsage => "Query space usage",
            Self::RateLimits => "Check rate limits (subject)",
            Self::PurgeUploadsPage => "Purge uploads (current page)",
            Self::PurgeUploadsAll => "Purge uploads (ALL pages)",
            Self::PurgeBlobsAll => "Purge blobs (ALL pages)",
            Self::DeleteUpload => "Delete an upload (by root CID)",
            Self::DeleteBlob => "Delete a blob (by digest)",
            Self::ListUploads => "List uploads",
            Self::ListBlobs => "List blobs",
            Self::Exit => "Exit",
        }
    }
}

const ROOT_ACTIONS: [RootAction; 11] = [
    RootAction::ListSpaces,
    RootAction::SpaceUsage,
    RootAction::RateLimits,
    RootAction::PurgeUploadsPage,
    RootAction::PurgeUploadsAll,
    RootAction::PurgeBlobsAll,
    RootAction::DeleteUpload,
    RootAction::DeleteBlob,
    RootAction::ListUploads,
    RootAction::ListBlobs,
    RootAction::Exit,
];

pub(crate) struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    pub(crate) fn enter() -> Result<Self> {
        let terminal = enter_with_ops(
            || enable_raw_mode().context("failed to enable raw mode"),
            || {
                let mut out = stdout();
                execute!(out, EnterAlternateScreen, Hide)
                    .context("failed to enter alternate screen")
            },
            || {
                let backend = CrosstermBackend::new(stdout());
                Terminal::new(backend).context("failed to create terminal backend")
            },
            || {
                let mut out = stdout();
                execute!(out, Show, LeaveAlternateScreen)
                    .context("failed to restore terminal screen during rollback")
            },
            || disable_raw_mode().context("failed to disable raw mode during rollback"),
        )?;
        Ok(Self { terminal })
    }

    pub(crate) fn draw<F>(&mut self, draw_fn: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame<'_>),
    {
        self.terminal
            .draw(draw_fn)
            .context("failed to render terminal")?;
        Ok(())
    }

    pub(crate) fn autoresize(&mut self) -> Result<()> {
        self.terminal
            .autoresize()
            .context("failed to autoresize terminal")?;
        Ok(())
    }

    /// Writes bell and clipboard escapes straight to the terminal.
    pub(crate) fn emit(&mut self, effects: Vec<Effect>) -> Result<()> {
        if effects.is_empty() {
            return Ok(());
        }
        let backend = self.terminal.backend_mut();
        for effect in effects {
            backend
                .write_all(effect.sequence().as_bytes())
                .context("failed to write terminal escape")?;
        }
        backend.flush().context("failed to flush terminal")?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = execute!(self.terminal.backend_mut(), Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

fn enter_with_ops<T, EnableRawMode, EnterAltScreen, CreateTerminal, LeaveAltScreen, DisableRawMode>(
    mut enable_raw_mode_op: EnableRawMode,
    mut enter_alt_screen_op: EnterAltScreen,
    mut create_terminal_op: CreateTerminal,
    mut leave_alt_screen_op: LeaveAltScreen,
    mut disable_raw_mode_op: DisableRawMode,
) -> Result<T>
where
    EnableRawMode: FnMut() -> Result<()>,
    EnterAltScreen: FnMut() -> Result<()>,
    CreateTerminal: FnMut() -> Result<T>,
    LeaveAltScreen: FnMut() -> Result<()>,
    DisableRawMode: FnMut() -> Result<()>,
{
    enable_raw_mode_op()?;

    if let Err(error) = enter_alt_screen_op() {
        return Err(failure_with_rollback(
            error,
            false,
            &mut leave_alt_screen_op,
            &mut disable_raw_mode_op,
        ));
    }

    match create_terminal_op() {
        Ok(terminal) => Ok(terminal),
        Err(error) => Err(failure_with_rollback(
            error,
            true,
            &mut leave_alt_screen_op,
            &mut disable_raw_mode_op,
        )),
    }
}

fn failure_with_rollback<LeaveAltScreen, DisableRawMode>(
    setup_error: anyhow::Error,
    alt_screen_entered: bool,
    leave_alt_screen_op: &mut LeaveAltScreen,
    disable_raw_mode_op: &mut DisableRawMode,
) -> anyhow::Error
where
    LeaveAltScreen: FnMut() -> Result<()>,
    DisableRawMode: FnMut() -> Result<()>,
{
    let mut cleanup_failures = Vec::<String>::new();

    if alt_screen_entered && let Err(error) = leave_alt_screen_op() {
        cleanup_failures.push(format!(
            "failed to restore alternate screen during rollback: {error:#}"
        ));
    }

    if let Err(error) = disable_raw_mode_op() {
        cleanup_failures.push(format!(
            "failed to disable raw mode during rollback: {error:#}"
        ));
    }

    if cleanup_failures.is_empty() {
        setup_error
    } else {
        anyhow!(
            "{setup_error:#}\nterminal rollback cleanup failed: {}",
            cleanup_failures.join("\n")
        )
    }
}

pub(crate) fn is_ctrl_c(key: KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

#[derive(Debug)]
struct RootScreen {
    selected: usize,
}

impl RootScreen {
    fn new() -> Self {
        Self { selected: 0 }
    }

    fn on_key(&mut self, key: KeyEvent) -> Option<RootMenuExit> {
        if keymap::is_close(key) {
            return Some(RootMenuExit::Exit);
        }

        if keymap::is_up(key) {
            self.selected = self.selected.saturating_sub(1);
            return None;
        }

        if keymap::is_down(key) {
            if self.selected + 1 < ROOT_ACTIONS.len() {
                self.selected += 1;
            }
            return None;
        }

        if keymap::is_confirm(key) {
            return match ROOT_ACTIONS[self.selected] {
                RootAction::Exit => Some(RootMenuExit::Exit),
                action => Some(RootMenuExit::Action(action)),
            };
        }

        None
    }

    fn render(&self, frame: &mut ratatui::Frame<'_>, agent_header: &str) {
        let area = frame.area();
        let key_text = compact_hint(
            area.width,
            "Enter: select    Up/Down or j/k: move    Esc/q: exit    Ctrl-C: quit anywhere",
            "Enter: select    j/k: move    Esc/q: exit",
            "Enter | j/k | q exit",
        );
        let footer_height = key_hint_height(area.width, key_text);
        let [header, body, footer] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Min(8),
                Constraint::Length(footer_height),
            ])
            .areas(area);

        let header_text = Text::from(vec![
            Line::from("blobdeck"),
            Line::from(agent_header.to_string()),
            focus_line("Choose what you want to do"),
        ]);
        let title = wrapped_paragraph(header_text).block(theme::chrome("Home"));
        frame.render_widget(title, header);

        let items: Vec<ListItem<'_>> = ROOT_ACTIONS
            .iter()
            .map(|action| ListItem::new(action.title()))
            .collect();
        let list = List::new(items)
            .block(theme::chrome(focus_line("Actions")))
            .highlight_style(theme::table_highlight(theme::ACCENT));

        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, body, &mut state);

        let hints = key_hint_paragraph(key_text).block(theme::key_block());
        frame.render_widget(hints, footer);
    }
}

enum ActiveScreen {
    Menu,
    Action(Box<ActionScreen>),
    Message(MessageView),
    Log(Box<LogView>),
    Uploads(Box<BrowseScreen<Upload, UploadPresenter>>),
    Blobs(Box<BrowseScreen<Blob, BlobPresenter>>),
}

enum Overlay {
    Notice(String),
    Error(String),
}

enum Transition {
    Stay,
    Home,
    Open(RootAction),
    Action(ActionExit),
    Fail(String),
    Return(UiExit),
}

/// Everything the root loop owns between frames.
pub(crate) struct RootState<'a> {
    app: &'a App,
    spawner: Box<dyn JobSpawner>,
    agent_header: String,
    menu: RootScreen,
    active: ActiveScreen,
    overlay: Option<Overlay>,
    effects: Effects,
}

impl<'a> RootState<'a> {
    pub(crate) fn new(app: &'a App, spawner: Box<dyn JobSpawner>) -> Self {
        let agent_header = app
            .agent_header()
            .unwrap_or_else(|error| format!("Agent: unavailable ({error:#})"));
        Self {
            app,
            spawner,
            agent_header,
            menu: RootScreen::new(),
            active: ActiveScreen::Menu,
            overlay: None,
            effects: Effects::default(),
        }
    }

    pub(crate) fn take_effects(&mut self) -> Vec<Effect> {
        let mut effects = self.effects.take();
        match &mut self.active {
            ActiveScreen::Action(screen) => effects.extend(screen.take_effects()),
            ActiveScreen::Uploads(screen) => effects.extend(screen.take_effects()),
            ActiveScreen::Blobs(screen) => effects.extend(screen.take_effects()),
            ActiveScreen::Menu | ActiveScreen::Message(_) | ActiveScreen::Log(_) => {}
        }
        effects
    }

    pub(crate) fn on_tick(&mut self) {
        let result = match &mut self.active {
            ActiveScreen::Uploads(screen) => screen.on_tick(),
            ActiveScreen::Blobs(screen) => screen.on_tick(),
            ActiveScreen::Log(view) => {
                view.on_tick();
                Ok(())
            }
            ActiveScreen::Menu | ActiveScreen::Action(_) | ActiveScreen::Message(_) => Ok(()),
        };
        if let Err(error) = result {
            self.overlay = Some(Overlay::Error(format!("{error:#}")));
        }
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent) -> Option<UiExit> {
        if is_ctrl_c(key) {
            return Some(UiExit::Canceled);
        }

        if self.overlay.is_some() {
            if keymap::is_confirm(key) || keymap::is_close(key) {
                self.overlay = None;
            }
            return None;
        }

        let transition = match &mut self.active {
            ActiveScreen::Menu => match self.menu.on_key(key) {
                Some(RootMenuExit::Action(action)) => Transition::Open(action),
                Some(RootMenuExit::Exit) => Transition::Return(UiExit::Completed),
                None => Transition::Stay,
            },
            ActiveScreen::Action(screen) => {
                match screen.on_key(key, self.app, self.spawner.as_ref()) {
                    Some(exit) => Transition::Action(exit),
                    None => Transition::Stay,
                }
            }
            ActiveScreen::Message(view) => {
                if view.on_key(key, &mut self.effects) {
                    Transition::Home
                } else {
                    Transition::Stay
                }
            }
            ActiveScreen::Log(view) => {
                if view.on_key(key) {
                    Transition::Home
                } else {
                    Transition::Stay
                }
            }
            ActiveScreen::Uploads(screen) => browse_transition(screen.on_key(key)),
            ActiveScreen::Blobs(screen) => browse_transition(screen.on_key(key)),
        };

        match transition {
            Transition::Stay => {}
            Transition::Home => self.go_home(),
            Transition::Open(action) => self.open(action),
            Transition::Action(exit) => self.apply_exit(exit),
            Transition::Fail(message) => self.overlay = Some(Overlay::Error(message)),
            Transition::Return(UiExit::BackAtRoot) => self.go_home(),
            Transition::Return(exit) => return Some(exit),
        }
        None
    }

    fn go_home(&mut self) {
        self.active = ActiveScreen::Menu;
    }

    fn open(&mut self, action: RootAction) {
        tracing::debug!(action = ?action, "opening action");
        let mut screen = ActionScreen::new(action, self.app);
        match screen.advance(self.app, self.spawner.as_ref()) {
            Some(exit) => self.apply_exit(exit),
            None => self.active = ActiveScreen::Action(Box::new(screen)),
        }
    }

    fn apply_exit(&mut self, exit: ActionExit) {
        let effects = self.take_effects();
        for effect in effects {
            self.effects.push(effect);
        }

        match exit {
            ActionExit::Cancelled => self.go_home(),
            ActionExit::Aborted(message) => {
                self.go_home();
                self.overlay = Some(Overlay::Notice(message));
            }
            ActionExit::Failed(message) => {
                self.go_home();
                self.overlay = Some(Overlay::Error(message));
            }
            ActionExit::Show(view) => self.active = ActiveScreen::Message(view),
            ActionExit::Log(view) => self.active = ActiveScreen::Log(Box::new(view)),
            ActionExit::BrowseUploads { space, page_size } => {
                let source: Arc<dyn PageSource<Upload>> =
                    Arc::new(self.app.upload_source(&space.did));
                self.active = ActiveScreen::Uploads(Box::new(BrowseScreen::new(
                    browse_title("Uploads", &space),
                    page_size,
                    self.app.upload_presenter(&space.did),
                    Box::new(ThreadPageLoader::new(source)),
                )));
            }
            ActionExit::BrowseBlobs { space, page_size } => {
                let source: Arc<dyn PageSource<Blob>> = Arc::new(self.app.blob_source(&space.did));
                self.active = ActiveScreen::Blobs(Box::new(BrowseScreen::new(
                    browse_title("Blobs", &space),
                    page_size,
                    BlobPresenter,
                    Box::new(ThreadPageLoader::new(source)),
                )));
            }
        }
    }

    pub(crate) fn render(&self, frame: &mut ratatui::Frame<'_>) {
        match &self.active {
            ActiveScreen::Menu => self.menu.render(frame, &self.agent_header),
            ActiveScreen::Action(screen) => {
                self.menu.render(frame, &self.agent_header);
                screen.render(frame);
            }
            ActiveScreen::Message(view) => {
                self.menu.render(frame, &self.agent_header);
                view.render(frame);
            }
            ActiveScreen::Log(view) => view.render(frame),
            ActiveScreen::Uploads(screen) => screen.render(frame),
            ActiveScreen::Blobs(screen) => screen.render(frame),
        }

        match &self.overlay {
            Some(Overlay::Error(message)) => render_global_error(frame, message),
            Some(Overlay::Notice(message)) => {
                render_notice_modal(frame, "Notice", message, 70, 30, "Enter/Esc: continue")
            }
            None => {}
        }
    }
}

fn browse_transition(result: Result<Option<UiExit>>) -> Transition {
    match result {
        Ok(Some(exit)) => Transition::Return(exit),
        Ok(None) => Transition::Stay,
        Err(error) => Transition::Fail(format!("{error:#}")),
    }
}

fn browse_title(kind: &str, space: &Space) -> String {
    format!("{kind} ({})", space.label())
}

pub fn run_root(app: &App) -> Result<UiExit> {
    let mut session = TerminalSession::enter()?;
    let mut state = RootState::new(app, Box::new(ThreadJobSpawner));
    const TICK_RATE: Duration = Duration::from_millis(120);

    loop {
        session.draw(|frame| state.render(frame))?;
        session.emit(state.take_effects())?;

        let has_event = event::poll(TICK_RATE).context("failed to poll terminal event")?;
        if !has_event {
            state.on_tick();
            continue;
        }

        let event = event::read().context("failed to read terminal event")?;
        let key = match event {
            Event::Resize(_, _) => {
                session.autoresize()?;
                continue;
            }
            Event::Key(key) if matches!(key.kind, KeyEventKind::Press) => key,
            _ => continue,
        };

        if let Some(exit) = state.on_key(key) {
            return Ok(exit);
        }
        state.on_tick();
    }
}

fn render_global_error(frame: &mut ratatui::Frame<'_>, message: &str) {
    let text = format!("Operation failed.\n\n{message}");
    render_error_modal(frame, &text, 88, 72, "Enter/Esc: continue");
}

pub(crate) fn centered_rect(
    percent_x: u16,
    percent_y: u16,
    area: ratatui::layout::Rect,
) -> ratatui::layout::Rect {
    let pct_x = percent_x.min(100);
    let pct_y = percent_y.min(100);

    let [_, vertical, _] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - pct_y) / 2),
            Constraint::Percentage(pct_y),
            Constraint::Percentage((100 - pct_y) / 2),
        ])
        .areas(area);
    let [_, horizontal, _] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - pct_x) / 2),
            Constraint::Percentage(pct_x),
            Constraint::Percentage((100 - pct_x) / 2),
        ])
        .areas(vertical);
    horizontal
}
