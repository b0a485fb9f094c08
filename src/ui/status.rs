use crate::app::App;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(&**msg)
    } else if app.controller.is_loading() && !app.controller.is_auto_refreshing() {
        Cow::Borrowed("Refreshing...")
    } else if app.search_mode {
        Cow::Borrowed("Type to search | ESC clear | ENTER confirm")
    } else {
        Cow::Borrowed(
            "[r]efresh [/]search [s]ort [a]uto [i]nterval [Tab]sheet [S]preadsheet [v]iew [o]pen [q]uit",
        )
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);

    let paragraph = Paragraph::new(text).style(style);
    f.render_widget(paragraph, area);
}
