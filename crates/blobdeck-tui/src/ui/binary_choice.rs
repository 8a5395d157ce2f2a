use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::text::{Line, Span, Text};

use crate::keymap;
use crate::theme;
use crate::ui::modal::{ModalSpec, render_modal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BinaryChoice {
    pub(crate) yes_selected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryChoiceEvent {
    Continue,
    ConfirmYes,
    ConfirmNo,
    Back,
}

impl BinaryChoice {
    pub(crate) fn new(default_yes: bool) -> Self {
        Self {
            yes_selected: default_yes,
        }
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent) -> BinaryChoiceEvent {
        if keymap::is_close(key) {
            return BinaryChoiceEvent::Back;
        }

        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => return BinaryChoiceEvent::ConfirmYes,
            KeyCode::Char('n') | KeyCode::Char('N') => return BinaryChoiceEvent::ConfirmNo,
            KeyCode::Left | KeyCode::Right => {
                self.yes_selected = !self.yes_selected;
                return BinaryChoiceEvent::Continue;
            }
            _ => {}
        }

        if keymap::is_toggle(key) {
            self.yes_selected = !self.yes_selected;
            return BinaryChoiceEvent::Continue;
        }

        if keymap::is_confirm(key) {
            if self.yes_selected {
                BinaryChoiceEvent::ConfirmYes
            } else {
                BinaryChoiceEvent::ConfirmNo
            }
        } else {
            BinaryChoiceEvent::Continue
        }
    }

    #[cfg(test)]
    pub(crate) fn selected_label(&self) -> &'static str {
        if self.yes_selected { "Yes" } else { "No" }
    }

    pub(crate) fn render(&self, frame: &mut Frame<'_>, title: &str, question: &str) {
        let (yes, no) = if self.yes_selected {
            ("[ Yes ]", "  No  ")
        } else {
            ("  Yes  ", "[ No ]")
        };
        let mut lines: Vec<Line<'static>> = question
            .lines()
            .map(|line| Line::from(line.to_string()))
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(yes, theme::success_prompt()),
            Span::raw("    "),
            Span::styled(no, theme::error_prompt()),
        ]));
        render_modal(
            frame,
            ModalSpec {
                title,
                title_style: Some(theme::focus_prompt()),
                body: Text::from(lines),
                key_hint: Some(
                    "y/n: answer    Space/←/→: toggle    Enter: confirm    Esc/q: cancel",
                ),
                width_pct: 70,
                height_pct: 36,
            },
        );
    }
}
