use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

mod app;
mod ui;

use app::App;
use sheetfeed::config::Config;
use sheetfeed::feed::{derive_view, SheetsClient, SortMode};
use sheetfeed::refresh::RefreshEvent;
use sheetfeed::util::{format_date, strip_control_chars};

/// Get the config directory path (~/.config/sheetfeed/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("sheetfeed"))
}

#[derive(Parser, Debug)]
#[command(
    name = "sheetfeed",
    about = "Terminal dashboard for alert feeds published as spreadsheets"
)]
struct Args {
    /// Config file (default: ~/.config/sheetfeed/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Spreadsheet to open, by position in the config (0-based)
    #[arg(long, value_name = "N", default_value_t = 0)]
    spreadsheet: usize,

    /// Sheet to open within the spreadsheet (0-based)
    #[arg(long, value_name = "N", default_value_t = 0)]
    sheet: usize,

    /// Initial sort order (overrides config)
    #[arg(long, value_enum)]
    sort: Option<SortMode>,

    /// Initial search query
    #[arg(long, value_name = "TEXT")]
    search: Option<String>,

    /// Auto-refresh interval in seconds (overrides config, 0 disables)
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// Start with auto-refresh turned off
    #[arg(long)]
    no_auto_refresh: bool,

    /// Fetch the sheet once, print it and exit instead of starting the TUI
    #[arg(long)]
    once: bool,
}

impl Args {
    /// Fold command-line overrides into the loaded config.
    fn apply_to(&self, config: &mut Config) {
        if let Some(sort) = self.sort {
            config.default_sort = sort;
        }
        if let Some(interval) = self.interval {
            config.refresh_interval_seconds = interval;
        }
        if self.no_auto_refresh {
            config.auto_refresh = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never tear the TUI on stdout
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_dir()?.join("config.toml"),
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    args.apply_to(&mut config);

    let Some(spreadsheet) = config.spreadsheets.get(args.spreadsheet) else {
        bail!(
            "--spreadsheet {} is out of range (config has {})",
            args.spreadsheet,
            config.spreadsheets.len()
        );
    };
    let Some(sheet) = spreadsheet.sheets.get(args.sheet) else {
        bail!(
            "--sheet {} is out of range ('{}' has {})",
            args.sheet,
            spreadsheet.name,
            spreadsheet.sheets.len()
        );
    };
    let source = spreadsheet.source_key(sheet);

    let client = SheetsClient::new(
        &config.export_base_url,
        Duration::from_secs(config.request_timeout_seconds),
    )
    .context("Invalid export_base_url in config")?;

    tracing::info!(
        source = %source,
        schedule = ?config.schedule(),
        "Starting sheetfeed"
    );

    if args.once {
        let feed = client
            .fetch(&source)
            .await
            .with_context(|| format!("Failed to fetch {}", source))?;
        let query = args.search.as_deref().unwrap_or("");
        for record in derive_view(&feed.records, query, config.default_sort) {
            println!(
                "{}\t{}\t{}",
                format_date(record.published_at),
                strip_control_chars(&record.title),
                strip_control_chars(&record.link)
            );
        }
        return Ok(());
    }

    let (event_tx, event_rx) = mpsc::channel::<RefreshEvent>(32);
    let mut app = App::new(config, client, event_tx, args.spreadsheet, args.sheet);
    if let Some(query) = args.search {
        for c in query.chars() {
            app.push_search_char(c);
        }
    }

    ui::run(&mut app, event_rx).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::parse_from([
            "sheetfeed",
            "--sort",
            "alphabetical",
            "--interval",
            "300",
            "--no-auto-refresh",
        ]);
        let mut config = Config::default();
        args.apply_to(&mut config);

        assert_eq!(config.default_sort, SortMode::Alphabetical);
        assert_eq!(config.refresh_interval_seconds, 300);
        assert!(!config.auto_refresh);
    }

    #[test]
    fn test_defaults_leave_config_untouched() {
        let args = Args::parse_from(["sheetfeed"]);
        let mut config = Config::default();
        args.apply_to(&mut config);

        assert_eq!(config.default_sort, SortMode::Newest);
        assert_eq!(config.refresh_interval_seconds, 60);
        assert!(config.auto_refresh);
        assert_eq!((args.spreadsheet, args.sheet), (0, 0));
        assert!(!args.once);
    }
}
