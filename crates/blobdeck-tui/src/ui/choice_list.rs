use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::widgets::{Clear, List, ListItem, ListState};

use crate::centered_rect;
use crate::keymap;
use crate::theme;
use crate::ui::text::{focus_line, key_hint_paragraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChoiceSignal {
    Continue,
    Chosen(usize),
    Cancel,
}

#[derive(Debug, Clone)]
pub(crate) struct ChoiceList {
    title: String,
    options: Vec<String>,
    selected: usize,
}

impl ChoiceList {
    pub(crate) fn new(title: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            title: title.into(),
            options,
            selected: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn selected(&self) -> usize {
        self.selected
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent) -> ChoiceSignal {
        if keymap::is_close(key) {
            return ChoiceSignal::Cancel;
        }
        if keymap::is_up(key) {
            self.selected = self.selected.saturating_sub(1);
        } else if keymap::is_down(key) {
            if self.selected + 1 < self.options.len() {
                self.selected += 1;
            }
        } else if keymap::is_first(key) {
            self.selected = 0;
        } else if keymap::is_last(key) {
            self.selected = self.options.len().saturating_sub(1);
        } else if keymap::is_confirm(key) && !self.options.is_empty() {
            return ChoiceSignal::Chosen(self.selected);
        }
        ChoiceSignal::Continue
    }

    pub(crate) fn render(&self, frame: &mut Frame<'_>) {
        let area = centered_rect(80, 60, frame.area());
        let [body, keys] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .areas(area);

        let items: Vec<ListItem<'_>> = self
            .options
            .iter()
            .map(|option| ListItem::new(option.as_str()))
            .collect();
        let list = List::new(items)
            .block(theme::chrome(focus_line(self.title.clone())))
            .highlight_style(theme::table_highlight(theme::ACCENT))
            .highlight_symbol(">> ");

        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_widget(Clear, area);
        frame.render_stateful_widget(list, body, &mut state);
        frame.render_widget(
            key_hint_paragraph("Enter: select    j/k: move    q/Esc: cancel")
                .block(theme::key_block()),
            keys,
        );
    }
}
