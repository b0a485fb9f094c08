//! Input handling for the TUI.
//!
//! Keys are dispatched to search-mode editing while the search prompt is
//! open, and to dashboard commands otherwise.

use crate::app::App;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use sheetfeed::util::validate_link;

use super::Action;

/// Main input dispatch function.
pub(super) fn handle_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<Action> {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Ok(Action::Quit);
    }

    if app.search_mode {
        handle_search_input(app, code);
        return Ok(Action::Continue);
    }

    match code {
        KeyCode::Char('q') => return Ok(Action::Quit),
        KeyCode::Esc => {
            // First Esc drops an active filter, the next one quits.
            if app.search_query.is_empty() {
                return Ok(Action::Quit);
            }
            app.clear_search();
        }
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('/') => app.search_mode = true,
        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Char('a') => app.toggle_auto_refresh(),
        KeyCode::Char('i') => app.cycle_interval(),
        KeyCode::Tab => app.next_sheet(),
        KeyCode::BackTab => app.prev_sheet(),
        KeyCode::Char('S') => app.next_spreadsheet(),
        KeyCode::Char('v') => app.toggle_layout(),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),
        KeyCode::Char('o') | KeyCode::Enter => open_selected(app),
        _ => {}
    }

    Ok(Action::Continue)
}

/// Edit the search query. Enter keeps the filter, Esc discards it.
fn handle_search_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.clear_search(),
        KeyCode::Enter => app.search_mode = false,
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Char(c) if !c.is_control() => app.push_search_char(c),
        _ => {}
    }
}

/// Open the selected item's link in the system browser.
fn open_selected(app: &mut App) {
    let Some(link) = app.selected_record().map(|r| r.link.clone()) else {
        return;
    };

    // SEC: sheet cells are untrusted; only http(s) links reach open::that()
    match validate_link(&link) {
        Ok(url) => {
            if let Err(e) = open::that(url.as_str()) {
                tracing::warn!(error = %e, url = %url, "Failed to open browser");
                app.set_status(format!("Failed to open browser: {}", e));
            }
        }
        Err(e) => app.set_status(e.to_string()),
    }
}
