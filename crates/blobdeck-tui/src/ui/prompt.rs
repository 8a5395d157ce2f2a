use crossterm::event::{Event, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::Line;
use ratatui::widgets::{Clear, Paragraph};
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use crate::centered_rect;
use crate::keymap;
use crate::theme;
use crate::ui::text::{focus_line, key_hint_paragraph, wrapped_paragraph};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PromptSignal {
    Continue,
    Submit(String),
    Cancel,
}

/// Single-line text prompt. `Esc` cancels; `q` is ordinary input here.
#[derive(Debug)]
pub(crate) struct TextPrompt {
    title: String,
    label: String,
    input: Input,
    danger: bool,
}

impl TextPrompt {
    pub(crate) fn new(title: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            label: label.into(),
            input: Input::default(),
            danger: false,
        }
    }

    pub(crate) fn with_initial(mut self, value: impl Into<String>) -> Self {
        self.input = Input::new(value.into());
        self
    }

    /// Styles the prompt as a destructive confirmation.
    pub(crate) fn danger(mut self) -> Self {
        self.danger = true;
        self
    }

    #[cfg(test)]
    pub(crate) fn value(&self) -> &str {
        self.input.value()
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent) -> PromptSignal {
        if keymap::is_back(key) {
            return PromptSignal::Cancel;
        }
        if keymap::is_confirm(key) {
            return PromptSignal::Submit(self.input.value().to_string());
        }
        let _ = self.input.handle_event(&Event::Key(key));
        PromptSignal::Continue
    }

    pub(crate) fn render(&self, frame: &mut Frame<'_>) {
        let label_lines = self.label.lines().count().max(1) as u16;
        let area = centered_rect(76, 50, frame.area());
        let [label_area, input_area, key_area] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(label_lines + 2),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .areas(area);

        let title_style = if self.danger {
            theme::error_prompt()
        } else {
            theme::focus_prompt()
        };
        frame.render_widget(Clear, area);
        frame.render_widget(
            wrapped_paragraph(self.label.clone())
                .block(theme::chrome(Line::styled(self.title.clone(), title_style))),
            label_area,
        );

        let width = input_area.width.saturating_sub(2) as usize;
        let scroll = self.input.visual_scroll(width);
        frame.render_widget(
            Paragraph::new(self.input.value())
                .scroll((0, scroll as u16))
                .block(theme::chrome(focus_line("Input"))),
            input_area,
        );
        if width > 0 {
            let relative = self
                .input
                .visual_cursor()
                .saturating_sub(scroll)
                .min(width.saturating_sub(1));
            frame.set_cursor_position((input_area.x + 1 + relative as u16, input_area.y + 1));
        }

        frame.render_widget(
            key_hint_paragraph("Enter: submit    Esc: cancel").block(theme::key_block()),
            key_area,
        );
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::{PromptSignal, TextPrompt};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_then_enter_submits_value() {
        let mut prompt = TextPrompt::new("Delete Blob", "Blob digest:");
        for ch in "zQm1".chars() {
            assert_eq!(
                prompt.on_key(key(KeyCode::Char(ch))),
                PromptSignal::Continue
            );
        }
        assert_eq!(
            prompt.on_key(key(KeyCode::Enter)),
            PromptSignal::Submit("zQm1".to_string())
        );
    }

    #[test]
    fn q_is_input_and_esc_cancels() {
        let mut prompt = TextPrompt::new("Purge", "Token:");
        prompt.on_key(key(KeyCode::Char('q')));
        assert_eq!(prompt.value(), "q");
        assert_eq!(prompt.on_key(key(KeyCode::Esc)), PromptSignal::Cancel);
    }

    #[test]
    fn initial_value_is_editable() {
        let mut prompt = TextPrompt::new("Purge", "Page size:").with_initial("50");
        prompt.on_key(key(KeyCode::Backspace));
        assert_eq!(prompt.value(), "5");
    }

    #[test]
    fn render_shows_label_and_value() {
        let prompt = TextPrompt::new("Rate Limits", "Subject DID:").with_initial("did:mailto:a");
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).expect("terminal");
        terminal.draw(|frame| prompt.render(frame)).expect("draw");
        let output = format!("{}", terminal.backend());
        assert!(output.contains("Subject DID:"));
        assert!(output.contains("did:mailto:a"));
    }
}
