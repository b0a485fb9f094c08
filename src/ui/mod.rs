//! Terminal dashboard.
//!
//! Renders the sheet selected in [`crate::app::App`] and turns key presses
//! into dashboard commands. Network work never happens here; it is spawned by
//! the refresh controller and arrives back as events.

mod input;
mod items;
mod loop_runner;
mod render;
mod status;

pub use loop_runner::run;
use loop_runner::Action;
