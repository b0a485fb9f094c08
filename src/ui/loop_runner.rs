//! Main event loop for the TUI.
//!
//! This module contains the event loop that multiplexes terminal input,
//! refresh controller events, and a periodic tick.

use crate::app::App;
use anyhow::Result;
use crossterm::{
    event::{Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use sheetfeed::refresh::RefreshEvent;
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use super::input::handle_input;
use super::render::render;

/// Result of handling a key press event.
pub enum Action {
    /// Continue the event loop and process more events.
    Continue,
    /// Exit the application and restore the terminal.
    Quit,
}

/// Runs the dashboard until the user quits or a termination signal arrives.
///
/// Uses `tokio::select!` to multiplex:
/// - **Signals**: SIGTERM/SIGINT end the loop (Unix only)
/// - **Terminal input**: Key presses from crossterm's async event stream
/// - **Refresh events**: Timer ticks and fetch results from the controller's tasks
/// - **Periodic tick**: 1s timer that keeps "Updated ... ago" current and
///   expires status messages
///
/// The controller's timer is stopped before returning.
///
/// # Panic Safety
///
/// Installs a panic hook that restores terminal state before unwinding,
/// ensuring the terminal is not left in raw mode on panic.
pub async fn run(app: &mut App, mut event_rx: mpsc::Receiver<RefreshEvent>) -> Result<()> {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    let mut event_stream = crossterm::event::EventStream::new();
    let mut tick_interval = tokio::time::interval(Duration::from_secs(1));

    #[cfg(unix)]
    let mut sigterm = signal(SignalKind::terminate())?;
    #[cfg(unix)]
    let mut sigint = signal(SignalKind::interrupt())?;

    app.start();

    loop {
        if app.needs_redraw {
            terminal.draw(|f| render(f, app))?;
            app.needs_redraw = false;
        }

        // Apply every queued refresh event before waiting on input again so
        // fetch results are not starved by fast typing.
        while let Ok(event) = event_rx.try_recv() {
            app.needs_redraw = true;
            app.handle_refresh_event(event);
        }

        #[cfg(unix)]
        let sigterm_fut = sigterm.recv();
        #[cfg(not(unix))]
        let sigterm_fut = std::future::pending::<Option<()>>();

        #[cfg(unix)]
        let sigint_fut = sigint.recv();
        #[cfg(not(unix))]
        let sigint_fut = std::future::pending::<Option<()>>();

        tokio::select! {
            biased;

            _ = sigterm_fut => {
                tracing::info!("Received SIGTERM, shutting down gracefully");
                break;
            }

            _ = sigint_fut => {
                tracing::info!("Received SIGINT, shutting down gracefully");
                break;
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        app.needs_redraw = true;
                        match handle_input(app, key.code, key.modifiers) {
                            Ok(Action::Quit) => break,
                            Ok(Action::Continue) => {}
                            Err(e) => app.set_status(format!("Error: {}", e)),
                        }
                    }
                    Some(Ok(Event::Resize(..))) => app.needs_redraw = true,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Terminal event stream error");
                    }
                    None => break,
                }
            }

            Some(event) = event_rx.recv() => {
                app.needs_redraw = true;
                app.handle_refresh_event(event);
            }

            _ = tick_interval.tick() => {
                app.clear_expired_status();
                // Relative "Updated ... ago" text changes with time alone.
                app.needs_redraw = true;
            }
        }
    }

    app.controller.stop();
    restore_terminal(terminal)?;
    Ok(())
}

/// Set up the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal to normal state.
fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
