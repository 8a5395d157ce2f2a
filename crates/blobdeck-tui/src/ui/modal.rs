use blobdeck_core::modal::ModalFrame;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Clear, List, ListItem, ListState};

use crate::centered_rect;
use crate::theme;
use crate::ui::text::{key_hint_height, key_hint_paragraph, wrapped_paragraph};

pub(crate) struct ModalSpec<'a> {
    pub(crate) title: &'a str,
    pub(crate) title_style: Option<Style>,
    pub(crate) body: Text<'a>,
    pub(crate) key_hint: Option<&'a str>,
    pub(crate) width_pct: u16,
    pub(crate) height_pct: u16,
}

/// Clears a centered area and draws the key hint for it; returns the body area.
fn modal_chrome(
    frame: &mut Frame<'_>,
    width_pct: u16,
    height_pct: u16,
    key_hint: Option<&str>,
) -> Rect {
    let area = centered_rect(width_pct, height_pct, frame.area());
    let mut body_area = area;
    let key_area = if let Some(key_hint) = key_hint {
        let footer_height = key_hint_height(area.width, key_hint);
        choose_key_area(frame.area(), area, footer_height).or_else(|| {
            let [inner_body, inner_key] = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(3), Constraint::Length(footer_height)])
                .areas(area);
            body_area = inner_body;
            Some(inner_key)
        })
    } else {
        None
    };

    frame.render_widget(Clear, body_area);
    if let (Some(key_hint), Some(key_area)) = (key_hint, key_area) {
        frame.render_widget(Clear, key_area);
        frame.render_widget(
            key_hint_paragraph(key_hint.to_string()).block(theme::key_block()),
            key_area,
        );
    }
    body_area
}

fn styled_title(title: &str, style: Option<Style>) -> Line<'static> {
    match style {
        Some(style) => Line::from(Span::styled(title.to_string(), style)),
        None => Line::from(title.to_string()),
    }
}

pub(crate) fn render_modal(frame: &mut Frame<'_>, spec: ModalSpec<'_>) {
    let body_area = modal_chrome(frame, spec.width_pct, spec.height_pct, spec.key_hint);
    frame.render_widget(
        wrapped_paragraph(spec.body)
            .block(theme::chrome(styled_title(spec.title, spec.title_style))),
        body_area,
    );
}

/// Draws one detail frame with its selected line highlighted.
pub(crate) fn render_frame_modal(frame: &mut Frame<'_>, detail: &ModalFrame, key_hint: &str) {
    let body_area = modal_chrome(frame, 84, 70, Some(key_hint));
    let title = format!("{}  ({})", detail.title(), detail.hint());
    let items: Vec<ListItem<'_>> = detail
        .lines()
        .iter()
        .map(|line| ListItem::new(line.as_str()))
        .collect();
    let list = List::new(items)
        .block(theme::chrome(styled_title(&title, Some(theme::focus_prompt()))))
        .highlight_style(theme::table_highlight(theme::ACCENT));

    let mut state = ListState::default();
    state.select(Some(detail.selected()));
    frame.render_stateful_widget(list, body_area, &mut state);
}

fn choose_key_area(screen: Rect, body: Rect, footer_height: u16) -> Option<Rect> {
    let screen_top = screen.y;
    let screen_bottom = screen.y.saturating_add(screen.height);
    let below_y = body.y.saturating_add(body.height);
    if below_y.saturating_add(footer_height) <= screen_bottom {
        return Some(Rect::new(body.x, below_y, body.width, footer_height));
    }

    let above_y = body.y.saturating_sub(footer_height);
    if above_y >= screen_top {
        return Some(Rect::new(body.x, above_y, body.width, footer_height));
    }

    None
}

pub(crate) fn render_error_modal(
    frame: &mut Frame<'_>,
    message: &str,
    width_pct: u16,
    height_pct: u16,
    footer: &str,
) {
    render_modal(
        frame,
        ModalSpec {
            title: "Error",
            title_style: Some(theme::error_prompt()),
            body: text_from_message(message),
            key_hint: Some(footer),
            width_pct,
            height_pct,
        },
    );
}

pub(crate) fn render_notice_modal(
    frame: &mut Frame<'_>,
    title: &str,
    message: &str,
    width_pct: u16,
    height_pct: u16,
    footer: &str,
) {
    render_modal(
        frame,
        ModalSpec {
            title,
            title_style: Some(theme::focus_prompt()),
            body: text_from_message(message),
            key_hint: Some(footer),
            width_pct,
            height_pct,
        },
    );
}

pub(crate) fn text_from_message(message: &str) -> Text<'static> {
    let base = message.trim_end();
    let lines: Vec<Line<'static>> = if base.is_empty() {
        vec![Line::from("")]
    } else {
        base.lines()
            .map(|line| Line::from(line.to_string()))
            .collect()
    };
    Text::from(lines)
}
