use crossterm::event::{KeyCode, KeyEvent};

pub(crate) fn is_back(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Esc)
}

pub(crate) fn is_confirm(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Enter)
}

pub(crate) fn is_up(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Up | KeyCode::Char('k'))
}

pub(crate) fn is_down(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Down | KeyCode::Char('j'))
}

pub(crate) fn is_prev_page(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Left | KeyCode::Char('h'))
}

pub(crate) fn is_next_page(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Right | KeyCode::Char('l'))
}

pub(crate) fn is_page_up(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::PageUp)
}

pub(crate) fn is_page_down(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::PageDown)
}

pub(crate) fn is_first(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('g') | KeyCode::Home)
}

pub(crate) fn is_last(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('G') | KeyCode::End)
}

pub(crate) fn is_copy_line(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('y') | KeyCode::Char('c'))
}

pub(crate) fn is_copy_all(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('a'))
}

pub(crate) fn is_toggle(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char(' ') | KeyCode::Tab)
}

pub(crate) fn is_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q'))
}

/// `q` or `Esc`: close the current view.
pub(crate) fn is_close(key: KeyEvent) -> bool {
    is_back(key) || is_quit(key)
}
