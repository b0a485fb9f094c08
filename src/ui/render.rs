//! Render functions for the TUI.
//!
//! The screen is a fixed vertical stack: header with the current selectors,
//! feed heading, optional error alert, the item panel and the status bar.

use crate::app::App;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use sheetfeed::refresh::interval_label;
use sheetfeed::util::{format_distance_to_now, strip_control_chars};

use super::{items, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 12;

/// Main render function.
pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    // Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let error = app.controller.error();
    let alert_height = if error.is_some() { 3 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Length(alert_height),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    render_heading(f, app, chunks[1]);
    if let Some(message) = error {
        render_alert(f, message, chunks[2]);
    }
    render_body(f, app, chunks[3]);
    status::render(f, app, chunks[4]);
}

/// Dashboard title plus the spreadsheet, sheet, sort and refresh selectors.
fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::Cyan);

    let refresh = if app.auto_refresh {
        format!("on, {}", interval_label(app.refresh_interval_secs).to_lowercase())
    } else {
        "off".to_string()
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("Spreadsheet: ", label),
            Span::styled(app.current_spreadsheet().name.as_str(), value),
            Span::styled("  Sheet: ", label),
            Span::styled(app.current_sheet().name.as_str(), value),
        ]),
        Line::from(vec![
            Span::styled("Sort: ", label),
            Span::styled(app.sort_mode.label(), value),
            Span::styled("  Auto-refresh: ", label),
            Span::styled(refresh, value),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            app.config.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        ));

    f.render_widget(Paragraph::new(lines).block(block), area);
}

/// `Feed Items (N) • Search: "q"` on the left, last update on the right.
fn render_heading(f: &mut Frame, app: &App, area: Rect) {
    let count = app.view().len();
    let mut heading = format!("Feed Items ({})", count);
    if !app.search_query.is_empty() {
        heading.push_str(&format!(
            " • Search: \"{}\"",
            strip_control_chars(&app.search_query)
        ));
    }
    if app.search_mode {
        heading.push('_');
    }

    let mut updated = match app.controller.last_updated_at() {
        Some(at) => format!("Updated {}", format_distance_to_now(at)),
        None => String::new(),
    };
    if app.controller.is_auto_refreshing() {
        updated.push_str(" • Refreshing...");
    }

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    f.render_widget(
        Paragraph::new(heading).style(Style::default().add_modifier(Modifier::BOLD)),
        halves[0],
    );
    f.render_widget(
        Paragraph::new(updated)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Right),
        halves[1],
    );
}

fn render_alert(f: &mut Frame, message: &str, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title("Error");
    let paragraph = Paragraph::new(message)
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true })
        .block(block);
    f.render_widget(paragraph, area);
}

/// Items, or the loading/empty placeholder.
fn render_body(f: &mut Frame, app: &App, area: Rect) {
    let view = app.view();

    if view.is_empty() {
        let text = if app.controller.is_loading() {
            "Loading feed data..."
        } else if !app.search_query.is_empty() {
            "No matching items found"
        } else {
            "No feed items found"
        };
        let placeholder = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(placeholder, area);
        return;
    }

    items::render(f, app, &view, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::App;
    use chrono::Utc;
    use ratatui::{backend::TestBackend, Terminal};
    use sheetfeed::config::Config;
    use sheetfeed::feed::{FeedRecord, FetchedFeed, SheetsClient};
    use sheetfeed::refresh::RefreshEvent;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn test_app() -> App {
        let (tx, _rx) = mpsc::channel(32);
        let client = SheetsClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        App::new(Config::default(), client, tx, 0, 0)
    }

    fn screen(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..height {
            for x in 0..width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[tokio::test]
    async fn test_empty_feed_placeholder() {
        let app = test_app();
        let text = screen(&app, 100, 30);
        assert!(text.contains("Feed Items (0)"));
        assert!(text.contains("No feed items found"));
        assert!(text.contains("Biomedical Alerts"));
    }

    #[tokio::test]
    async fn test_header_shows_refresh_schedule() {
        let mut app = test_app();
        let text = screen(&app, 100, 30);
        let header = text.lines().nth(2).unwrap_or_default();
        assert!(header.contains("Sort: Newest First"), "{header}");
        assert!(header.contains("Auto-refresh: on, every minute "), "{header}");
        assert!(!text.contains("every Every"));

        app.refresh_interval_secs = 300;
        let text = screen(&app, 100, 30);
        assert!(text.contains("Auto-refresh: on, every 5 minutes"));

        app.auto_refresh = false;
        let text = screen(&app, 100, 30);
        assert!(text.contains("Auto-refresh: off"));
    }

    #[tokio::test]
    async fn test_records_and_search_heading() {
        let mut app = test_app();
        let source = app.source_key();
        app.handle_refresh_event(RefreshEvent::Completed {
            source,
            manual: true,
            result: Ok(FetchedFeed {
                records: vec![FeedRecord {
                    title: "Heart valve recall".to_string(),
                    description: "Class I".to_string(),
                    link: String::new(),
                    published_at: None,
                }],
                fetched_at: Utc::now(),
            }),
        });

        let text = screen(&app, 100, 30);
        assert!(text.contains("Feed Items (1)"));
        assert!(text.contains("Heart valve recall"));
        assert!(text.contains("Updated just now"));

        app.push_search_char('z');
        let text = screen(&app, 100, 30);
        assert!(text.contains("Search: \"z\""));
        assert!(text.contains("No matching items found"));
    }

    #[tokio::test]
    async fn test_small_terminal_message() {
        let app = test_app();
        let text = screen(&app, 40, 8);
        assert!(text.contains("Terminal too small"));
    }
}
