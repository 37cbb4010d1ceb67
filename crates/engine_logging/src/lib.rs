#![deny(missing_docs)]
//! Shared logging utilities for the translator workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase,
//! a per-thread task context that tags every line with the active task id,
//! and a minimal test initializer for the global logger.

use std::cell::RefCell;

thread_local! {
    /// Task id of the work currently running on this thread.
    static TASK_CONTEXT: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Sets (or clears, with `None`) the task id reported by the `engine_*` macros
/// on the current thread.
pub fn set_task_context(task_id: Option<&str>) {
    TASK_CONTEXT.with(|ctx| *ctx.borrow_mut() = task_id.map(str::to_string));
}

/// Retrieves the task id set on the current thread, if any.
pub fn task_context() -> Option<String> {
    TASK_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// Prefix prepended to every macro-emitted line: `"[task <id>] "` or empty.
#[doc(hidden)]
pub fn task_prefix() -> String {
    TASK_CONTEXT.with(|ctx| match ctx.borrow().as_deref() {
        Some(id) => format!("[task {id}] "),
        None => String::new(),
    })
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}{}", $crate::task_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!("{}{}", $crate::task_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}{}", $crate::task_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}{}", $crate::task_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!("{}{}", $crate::task_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may have installed the logger already.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
