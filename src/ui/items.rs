use crate::app::{App, ItemLayout};
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Row, Table, TableState},
    Frame,
};
use sheetfeed::feed::FeedRecord;
use sheetfeed::util::{display_width, format_date, strip_control_chars, truncate_to_width};

/// Description lines shown per card.
const CARD_DESCRIPTION_LINES: usize = 2;

/// Render the derived view in the current layout.
pub fn render(f: &mut Frame, app: &App, view: &[&FeedRecord], area: Rect) {
    let title = format!("Items - {}", app.sort_mode.label());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    match app.layout {
        ItemLayout::Cards => render_cards(f, app, view, area, block),
        ItemLayout::Table => render_table(f, app, view, area, block),
    }
}

fn render_cards(f: &mut Frame, app: &App, view: &[&FeedRecord], area: Rect, block: Block) {
    let width = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = view
        .iter()
        .map(|record| {
            let title = strip_control_chars(&record.title);
            let mut lines = vec![
                Line::from(Span::styled(
                    truncate_to_width(&title, width).into_owned(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format_date(record.published_at),
                    Style::default().fg(Color::DarkGray),
                )),
            ];

            let description =
                strip_control_chars(&record.description).replace(['\r', '\n', '\t'], " ");
            lines.extend(
                wrap_description(description.trim(), width)
                    .into_iter()
                    .map(Line::from),
            );

            if !record.link.trim().is_empty() {
                lines.push(Line::from(Span::styled(
                    truncate_to_width(&strip_control_chars(&record.link), width).into_owned(),
                    Style::default().fg(Color::Blue),
                )));
            }
            lines.push(Line::default());

            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White))
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(Some(app.selected_item));
    f.render_stateful_widget(list, area, &mut state);
}

/// Split `text` into at most [`CARD_DESCRIPTION_LINES`] lines of `width`
/// columns; the last line gets an ellipsis if text remains.
fn wrap_description(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rest = text;

    while !rest.is_empty() && lines.len() < CARD_DESCRIPTION_LINES {
        if lines.len() + 1 == CARD_DESCRIPTION_LINES || display_width(rest) <= width {
            lines.push(truncate_to_width(rest, width).into_owned());
            break;
        }
        let head = take_prefix(rest, width);
        if head.is_empty() {
            break;
        }
        lines.push(head.trim_end().to_string());
        rest = rest[head.len()..].trim_start();
    }
    lines
}

/// Longest prefix of `s` no wider than `width` columns.
fn take_prefix(s: &str, width: usize) -> &str {
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let next = idx + c.len_utf8();
        if display_width(&s[..next]) > width {
            break;
        }
        end = next;
    }
    &s[..end]
}

/// Width of the date column: "Sep 30, 2024".
const DATE_COLUMN_WIDTH: u16 = 12;

fn render_table(f: &mut Frame, app: &App, view: &[&FeedRecord], area: Rect, block: Block) {
    // Borders plus the two column gaps.
    let available = area.width.saturating_sub(4 + DATE_COLUMN_WIDTH);
    let title_width = available / 2;
    let description_width = available - title_width;

    let rows: Vec<Row> = view
        .iter()
        .map(|record| {
            let description =
                strip_control_chars(&record.description).replace(['\r', '\n', '\t'], " ");
            Row::new(vec![
                truncate_to_width(&strip_control_chars(&record.title), title_width as usize)
                    .into_owned(),
                truncate_to_width(&description, description_width as usize).into_owned(),
                format_date(record.published_at),
            ])
        })
        .collect();

    let header = Row::new(vec!["Title", "Description", "Date"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let table = Table::new(
        rows,
        [
            Constraint::Length(title_width),
            Constraint::Length(description_width),
            Constraint::Length(DATE_COLUMN_WIDTH),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut state = TableState::default().with_selected(Some(app.selected_item));
    f.render_stateful_widget(table, area, &mut state);
}
