//! Logger setup for the `translator` binary.
//!
//! Terminal output goes to stderr so it does not mix with the rendered task
//! view on stdout. File output lands in `./translator.log`.

use std::fs::File;
use std::path::Path;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

const LOG_FILE: &str = "./translator.log";
const QUIET_TARGETS: &[&str] = &["reqwest", "hyper", "rustls"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum LogDestination {
    #[default]
    File,
    Terminal,
    Both,
}

impl LogDestination {
    fn to_terminal(self) -> bool {
        matches!(self, LogDestination::Terminal | LogDestination::Both)
    }

    fn to_file(self) -> bool {
        matches!(self, LogDestination::File | LogDestination::Both)
    }
}

/// Install the global logger. Only the first call in a process has effect.
pub fn initialize(destination: LogDestination, verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let loggers = loggers_for(destination, level, Path::new(LOG_FILE));
    if !loggers.is_empty() {
        let _ = CombinedLogger::init(loggers);
    }
}

fn loggers_for(
    destination: LogDestination,
    level: LevelFilter,
    log_path: &Path,
) -> Vec<Box<dyn SharedLogger>> {
    let config = logger_config();
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    if destination.to_terminal() {
        loggers.push(TermLogger::new(
            level,
            config.clone(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }
    if destination.to_file() {
        match File::create(log_path) {
            Ok(file) => loggers.push(WriteLogger::new(level, config, file)),
            Err(err) => eprintln!("Warning: cannot write log file {:?}: {}", log_path, err),
        }
    }
    loggers
}

fn logger_config() -> Config {
    let mut builder = ConfigBuilder::new();
    builder
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error);
    for target in QUIET_TARGETS {
        builder.add_filter_ignore_str(*target);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn both_writes_to_terminal_and_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("translator.log");
        let loggers = loggers_for(LogDestination::Both, LevelFilter::Info, &path);
        assert_eq!(loggers.len(), 2);
        assert!(path.exists());
    }

    #[test]
    fn unwritable_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing").join("translator.log");
        assert!(loggers_for(LogDestination::File, LevelFilter::Info, &path).is_empty());
        assert_eq!(
            loggers_for(LogDestination::Terminal, LevelFilter::Info, &path).len(),
            1
        );
    }
}
