use blobdeck_core::modal::ModalFrame;
use crossterm::event::KeyEvent;
use ratatui::Frame;

use crate::effects::{Effect, Effects};
use crate::keymap;
use crate::ui::modal::render_frame_modal;
use crate::ui::text::compact_hint;

/// Read-only scrollable text with line copy.
#[derive(Debug)]
pub(crate) struct MessageView {
    frame: ModalFrame,
}

impl MessageView {
    pub(crate) fn new(title: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            frame: ModalFrame::new(title, lines),
        }
    }

    #[cfg(test)]
    pub(crate) fn frame(&self) -> &ModalFrame {
        &self.frame
    }

    /// Returns true when the view should close.
    pub(crate) fn on_key(&mut self, key: KeyEvent, effects: &mut Effects) -> bool {
        if keymap::is_close(key) || keymap::is_confirm(key) {
            return true;
        }
        apply_frame_key(&mut self.frame, key, effects);
        false
    }

    pub(crate) fn render(&self, frame: &mut Frame<'_>) {
        let hint = compact_hint(
            frame.area().width,
            "j/k: scroll    PgUp/PgDn: page    g/G: first/last    y: copy line    a: copy all    Enter/q: close",
            "j/k scroll    g/G ends    y copy    a copy all    Enter/q close",
            "j/k | y/a copy | q close",
        );
        render_frame_modal(frame, &self.frame, hint);
    }
}

/// Line movement and copy keys shared by every frame-style view.
pub(crate) fn apply_frame_key(
    frame: &mut ModalFrame,
    key: KeyEvent,
    effects: &mut Effects,
) -> bool {
    if keymap::is_up(key) {
        frame.move_up();
    } else if keymap::is_down(key) {
        frame.move_down();
    } else if keymap::is_page_up(key) {
        frame.page_up();
    } else if keymap::is_page_down(key) {
        frame.page_down();
    } else if keymap::is_first(key) {
        frame.first();
    } else if keymap::is_last(key) {
        frame.last();
    } else if keymap::is_copy_line(key) {
        effects.push(Effect::Copy(frame.selected_line().to_string()));
    } else if keymap::is_copy_all(key) {
        effects.push(Effect::Copy(frame.all_text()));
    } else {
        return false;
    }
    true
}
