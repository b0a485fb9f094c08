use sheetfeed::config::{Config, SheetConfig, SpreadsheetConfig};
use sheetfeed::feed::{derive_view, FeedRecord, SheetsClient, SortMode, SourceKey};
use sheetfeed::refresh::{
    interval_label, next_interval, RefreshController, RefreshEvent, Schedule,
};
use sheetfeed::util::MAX_SEARCH_QUERY_LENGTH;
use std::borrow::Cow;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// How long a status message stays in the status bar.
const STATUS_TTL_SECS: u64 = 3;

/// How feed items are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemLayout {
    /// One bordered card per item with its description.
    Cards,
    /// Compact one-line rows.
    Table,
}

/// Dashboard state: which sheet is shown and how.
///
/// The refresh controller owns the records; everything else here is display
/// state that only lives for the session.
pub struct App {
    pub config: Config,
    pub controller: RefreshController<SheetsClient>,
    pub selected_spreadsheet: usize,
    pub selected_sheet: usize,
    pub sort_mode: SortMode,
    pub search_query: String,
    pub search_mode: bool,
    pub layout: ItemLayout,
    /// Index into the derived view, not into the controller's records.
    pub selected_item: usize,
    pub auto_refresh: bool,
    pub refresh_interval_secs: u64,
    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub needs_redraw: bool,
}

impl App {
    /// Build the dashboard for `config`, starting at the given spreadsheet and
    /// sheet (clamped to what the config offers).
    ///
    /// `Config::load` guarantees at least one spreadsheet with one sheet.
    pub fn new(
        config: Config,
        client: SheetsClient,
        event_tx: mpsc::Sender<RefreshEvent>,
        spreadsheet: usize,
        sheet: usize,
    ) -> Self {
        let selected_spreadsheet = spreadsheet.min(config.spreadsheets.len().saturating_sub(1));
        let sheets = config.spreadsheets[selected_spreadsheet].sheets.len();
        let selected_sheet = sheet.min(sheets.saturating_sub(1));

        let spreadsheet_config = &config.spreadsheets[selected_spreadsheet];
        let source = spreadsheet_config.source_key(&spreadsheet_config.sheets[selected_sheet]);

        let controller =
            RefreshController::new(client, source, event_tx, config.keep_items_on_error);

        Self {
            sort_mode: config.default_sort,
            auto_refresh: config.auto_refresh,
            refresh_interval_secs: config.refresh_interval_seconds,
            config,
            controller,
            selected_spreadsheet,
            selected_sheet,
            search_query: String::new(),
            search_mode: false,
            layout: ItemLayout::Cards,
            selected_item: 0,
            status_message: None,
            needs_redraw: true,
        }
    }

    /// Install the auto-refresh schedule and fetch the first sheet.
    pub fn start(&mut self) {
        self.controller.start(self.schedule());
    }

    pub fn schedule(&self) -> Schedule {
        Schedule {
            enabled: self.auto_refresh,
            interval_secs: self.refresh_interval_secs,
        }
    }

    pub fn current_spreadsheet(&self) -> &SpreadsheetConfig {
        &self.config.spreadsheets[self.selected_spreadsheet]
    }

    pub fn current_sheet(&self) -> &SheetConfig {
        &self.current_spreadsheet().sheets[self.selected_sheet]
    }

    pub fn source_key(&self) -> SourceKey {
        self.current_spreadsheet().source_key(self.current_sheet())
    }

    /// The filtered, sorted list currently on screen.
    pub fn view(&self) -> Vec<&FeedRecord> {
        derive_view(
            self.controller.visible_items(),
            &self.search_query,
            self.sort_mode,
        )
    }

    pub fn selected_record(&self) -> Option<&FeedRecord> {
        self.view().get(self.selected_item).copied()
    }

    // ------------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------------

    pub fn select_next(&mut self) {
        let len = self.view().len();
        if self.selected_item + 1 < len {
            self.selected_item += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected_item = self.selected_item.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected_item = 0;
    }

    pub fn select_last(&mut self) {
        self.selected_item = self.view().len().saturating_sub(1);
    }

    /// Keep the selection inside the view after it shrinks.
    pub fn clamp_selection(&mut self) {
        let len = self.view().len();
        if self.selected_item >= len {
            self.selected_item = len.saturating_sub(1);
        }
    }

    // ------------------------------------------------------------------------
    // Source selection
    // ------------------------------------------------------------------------

    pub fn next_sheet(&mut self) {
        let count = self.current_spreadsheet().sheets.len();
        self.selected_sheet = (self.selected_sheet + 1) % count;
        self.switch_source();
    }

    pub fn prev_sheet(&mut self) {
        let count = self.current_spreadsheet().sheets.len();
        self.selected_sheet = (self.selected_sheet + count - 1) % count;
        self.switch_source();
    }

    /// Move to the next spreadsheet, starting at its first sheet.
    pub fn next_spreadsheet(&mut self) {
        let count = self.config.spreadsheets.len();
        self.selected_spreadsheet = (self.selected_spreadsheet + 1) % count;
        self.selected_sheet = 0;
        self.switch_source();
    }

    fn switch_source(&mut self) {
        let source = self.source_key();
        if &source == self.controller.source() {
            return;
        }
        self.selected_item = 0;
        self.controller.set_source(source);
        self.set_status(format!(
            "Viewing: {} / {}",
            self.current_spreadsheet().name,
            self.current_sheet().name
        ));
    }

    // ------------------------------------------------------------------------
    // Display options
    // ------------------------------------------------------------------------

    pub fn cycle_sort(&mut self) {
        self.sort_mode = self.sort_mode.next();
        self.selected_item = 0;
        self.set_status(format!("Sort: {}", self.sort_mode.label()));
    }

    pub fn toggle_layout(&mut self) {
        self.layout = match self.layout {
            ItemLayout::Cards => ItemLayout::Table,
            ItemLayout::Table => ItemLayout::Cards,
        };
    }

    pub fn toggle_auto_refresh(&mut self) {
        self.auto_refresh = !self.auto_refresh;
        self.controller
            .configure(self.auto_refresh, self.refresh_interval_secs);
        self.set_status(if self.auto_refresh {
            "Auto-refresh on"
        } else {
            "Auto-refresh off"
        });
    }

    pub fn cycle_interval(&mut self) {
        self.refresh_interval_secs = next_interval(self.refresh_interval_secs);
        self.controller
            .configure(self.auto_refresh, self.refresh_interval_secs);
        self.set_status(format!(
            "Refresh interval: {}",
            interval_label(self.refresh_interval_secs)
        ));
    }

    pub fn refresh(&mut self) {
        if !self.controller.refresh_now() {
            self.set_status("Refresh already in progress");
        }
    }

    // ------------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------------

    pub fn push_search_char(&mut self, c: char) {
        if self.search_query.chars().count() >= MAX_SEARCH_QUERY_LENGTH {
            self.set_status(format!(
                "Search query too long (max {} chars)",
                MAX_SEARCH_QUERY_LENGTH
            ));
            return;
        }
        self.search_query.push(c);
        self.selected_item = 0;
    }

    pub fn pop_search_char(&mut self) {
        self.search_query.pop();
        self.selected_item = 0;
    }

    pub fn clear_search(&mut self) {
        self.search_query.clear();
        self.search_mode = false;
        self.selected_item = 0;
    }

    // ------------------------------------------------------------------------
    // Events and status
    // ------------------------------------------------------------------------

    /// Apply a refresh event from a background task.
    pub fn handle_refresh_event(&mut self, event: RefreshEvent) {
        if self.controller.handle_event(event) {
            self.clamp_selection();
            self.needs_redraw = true;
        }
    }

    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear the status message once it has expired.
    /// Returns true if a message was actually cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}
