use blobdeck_core::browser::Column;
use ratatui::Frame;
use ratatui::layout::{Constraint, Margin, Rect};
use ratatui::text::Line;
use ratatui::widgets::{
    Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState, Table, TableState,
};

use crate::theme;

pub(crate) struct PageTableRender<'a> {
    pub(crate) title: Line<'a>,
    pub(crate) empty_message: &'a str,
    pub(crate) columns: &'a [Column],
    pub(crate) rows: Vec<Vec<String>>,
    /// 0 is the header row, item rows start at 1.
    pub(crate) selection: usize,
}

fn width_constraint(column: &Column, last: bool) -> Constraint {
    if last {
        Constraint::Min(column.width)
    } else {
        Constraint::Length(column.width)
    }
}

pub(crate) fn render_page_table(frame: &mut Frame<'_>, area: Rect, render: PageTableRender<'_>) {
    if render.rows.is_empty() {
        let empty = Paragraph::new(render.empty_message).block(theme::chrome(render.title));
        frame.render_widget(empty, area);
        return;
    }

    let row_count = render.rows.len();
    let header = Row::new(render.columns.iter().map(|column| column.title))
        .style(theme::table_header(theme::ACCENT));
    let widths: Vec<Constraint> = render
        .columns
        .iter()
        .enumerate()
        .map(|(index, column)| width_constraint(column, index + 1 == render.columns.len()))
        .collect();
    let table = Table::new(render.rows.into_iter().map(Row::new), widths)
        .header(header)
        .block(theme::chrome(render.title))
        .row_highlight_style(theme::table_highlight(theme::ACCENT))
        .highlight_symbol(">> ");

    let mut state = TableState::new();
    state.select(render.selection.checked_sub(1));
    frame.render_stateful_widget(table, area, &mut state);

    let viewport = area.height.saturating_sub(3) as usize;
    let mut scrollbar_state = ScrollbarState::new(row_count)
        .position(render.selection.saturating_sub(1))
        .viewport_content_length(viewport);
    frame.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(None)
            .end_symbol(None),
        area.inner(Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut scrollbar_state,
    );
}

#[cfg(test)]
mod tests {
    use blobdeck_core::browser::Column;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use ratatui::text::Line;

    use super::{PageTableRender, render_page_table};

    const COLUMNS: [Column; 2] = [Column::new("#", 3), Column::new("DIGEST", 20)];

    fn draw(rows: Vec<Vec<String>>, selection: usize) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 10)).expect("terminal");
        terminal
            .draw(|frame| {
                let area = frame.area();
                render_page_table(
                    frame,
                    area,
                    PageTableRender {
                        title: Line::from("Blobs"),
                        empty_message: "No items on this page.",
                        columns: &COLUMNS,
                        rows,
                        selection,
                    },
                )
            })
            .expect("draw");
        format!("{}", terminal.backend())
    }

    #[test]
    fn rows_render_under_header() {
        let output = draw(vec![vec!["1".to_string(), "zQmone".to_string()]], 1);
        assert!(output.contains("DIGEST"));
        assert!(output.contains(">> 1"));
        assert!(output.contains("zQmone"));
    }

    #[test]
    fn header_selection_highlights_no_row() {
        let output = draw(vec![vec!["1".to_string(), "zQmone".to_string()]], 0);
        assert!(!output.contains(">>"));
    }

    #[test]
    fn empty_page_shows_message() {
        assert!(draw(Vec::new(), 0).contains("No items on this page."));
    }
}
