use ratatui::layout::Alignment;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Wrap};

use crate::theme;

pub(crate) fn wrapped_paragraph<'a, T>(text: T) -> Paragraph<'a>
where
    T: Into<Text<'a>>,
{
    Paragraph::new(text).wrap(Wrap { trim: false })
}

pub(crate) fn key_hint_paragraph<'a, T>(text: T) -> Paragraph<'a>
where
    T: Into<Text<'a>>,
{
    wrapped_paragraph(text).alignment(Alignment::Center)
}

pub(crate) fn key_hint_height(total_width: u16, text: &str) -> u16 {
    let content_width = total_width.saturating_sub(2).max(1) as usize;
    let lines = wrapped_line_count(text, content_width);
    lines.saturating_add(2).max(3)
}

pub(crate) fn compact_hint<'a>(
    width: u16,
    full: &'a str,
    medium: &'a str,
    compact: &'a str,
) -> &'a str {
    if width >= 110 {
        full
    } else if width >= 78 {
        medium
    } else {
        compact
    }
}

pub(crate) fn focus_line(message: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(message.into(), theme::focus_prompt()))
}

fn wrapped_line_count(text: &str, width: usize) -> u16 {
    if text.is_empty() {
        return 1;
    }

    let mut total = 0u16;
    for line in text.split('\n') {
        total = total.saturating_add(wrapped_line_count_single(line, width));
    }

    total.max(1)
}

fn wrapped_line_count_single(line: &str, width: usize) -> u16 {
    if line.is_empty() {
        return 1;
    }

    let mut lines = 1u16;
    let mut used = 0usize;
    for ch in line.chars() {
        let mut remaining = if ch == '\t' { 4 } else { 1 };
        while remaining > 0 {
            let space_left = width.saturating_sub(used);
            if space_left == 0 {
                lines = lines.saturating_add(1);
                used = 0;
                continue;
            }
            if remaining > space_left {
                remaining -= space_left;
                lines = lines.saturating_add(1);
                used = 0;
            } else {
                used += remaining;
                remaining = 0;
            }
        }
    }

    lines.max(1)
}
