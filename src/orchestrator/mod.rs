//! Application-level orchestration for the interactive dashboard.
//!
//! This module owns load lifecycle control (initial load, reload, date rollover)
//! and post-load processing such as CLI-requested exports. The TUI calls into
//! this module to keep responsibilities separated.

mod controller;
mod post_process;

pub(crate) use controller::{run_controller, UiCommand};
pub(crate) use post_process::process_load_completion;
