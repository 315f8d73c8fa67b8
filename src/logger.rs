//! Terminal logging with colored module prefixes.
//!
//! ```ignore
//! log!("pages"; "rendered {} pages", count);
//! debug!("watch"; "event: {:?}", event);
//! ```
//!
//! Messages go to stderr so `check` output on stdout stays pipeable.

use owo_colors::{OwoColorize, Stream};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

/// Global verbose flag (set by `--verbose`)
static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Log a message with a colored module prefix
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a message only when `--verbose` is set
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let mut stderr = std::io::stderr().lock();
    writeln!(stderr, "{prefix} {message}").ok();
}

/// Log an error followed by its `source()` chain, one cause per line.
pub fn log_error(module: &str, context: &str, err: &dyn std::error::Error) {
    log(module, &format!("{context}: {err}"));
    let mut source = err.source();
    while let Some(cause) = source {
        log(module, &format!("  caused by: {cause}"));
        source = cause.source();
    }
}

fn colorize_prefix(module: &str) -> String {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "serve" | "reload" => prefix
            .if_supports_color(Stream::Stderr, |p| p.bright_blue().bold().to_string())
            .to_string(),
        "watch" => prefix
            .if_supports_color(Stream::Stderr, |p| p.bright_green().bold().to_string())
            .to_string(),
        "error" => prefix
            .if_supports_color(Stream::Stderr, |p| p.bright_red().bold().to_string())
            .to_string(),
        _ => prefix
            .if_supports_color(Stream::Stderr, |p| p.bright_yellow().bold().to_string())
            .to_string(),
    }
}
