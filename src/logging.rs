use std::env;
use std::path::PathBuf;

use chrono::Utc;
use log::LevelFilter;

/// Where log records are written.
#[derive(Debug, Clone, PartialEq)]
pub enum LogTarget {
    /// The TUI owns the terminal, so it logs to a file.
    File(PathBuf),
    Stderr,
}

/// Resolves a level name, falling back to `RUST_LOG` and then `info`.
pub fn parse_level(level: Option<&str>) -> LevelFilter {
    let level_str = level
        .map(str::to_string)
        .or_else(|| env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    match level_str.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

pub fn setup_logger(level: LevelFilter, target: &LogTarget) -> Result<(), fern::InitError> {
    let dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}: {}",
                Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level);

    let dispatch = match target {
        LogTarget::File(path) => dispatch.chain(fern::log_file(path)?),
        LogTarget::Stderr => dispatch.chain(std::io::stderr()),
    };
    dispatch.apply()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level(Some("debug")), LevelFilter::Debug);
        assert_eq!(parse_level(Some("WARN")), LevelFilter::Warn);
        assert_eq!(parse_level(Some("chatty")), LevelFilter::Info);
    }
}
