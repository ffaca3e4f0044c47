//! The `log` module provides initialisation and configuration of the application's logging system.
//!
//! Messages are written to the console (with coloured levels) and, when an output folder is given,
//! also to log files in that folder. The log level is taken from the program settings, but can be
//! overridden with the `SCENARIO_ASSEMBLY_LOG_LEVEL` environment variable.
use anyhow::{Result, bail};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::Arguments;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

/// The default log level for the program.
///
/// Used as a fallback if the user hasn't specified something else with the
/// `SCENARIO_ASSEMBLY_LOG_LEVEL` environment variable or the settings file.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// The name of the environment variable which overrides the log level
const LOG_LEVEL_ENV_VAR: &str = "SCENARIO_ASSEMBLY_LOG_LEVEL";

/// The file name for the log file containing messages about the ordinary operation
const LOG_INFO_FILE_NAME: &str = "assembly_info.log";

/// The file name for the log file containing warnings and error messages
const LOG_ERROR_FILE_NAME: &str = "assembly_error.log";

/// Used to guarantee that the logger is only initialised once
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Parse a log level from a string (case-insensitive)
fn parse_log_level(level: &str) -> Result<LevelFilter> {
    let filter = match level.trim().to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        other => bail!("Unknown log level: {other}"),
    };

    Ok(filter)
}

/// Initialise the program logger using the `fern` logging library.
///
/// The user can override the log level given in `log_level_from_settings` by setting the
/// `SCENARIO_ASSEMBLY_LOG_LEVEL` environment variable.
///
/// # Arguments
///
/// * `log_level_from_settings`: The log level specified in `settings.toml`
/// * `log_file_path`: The folder in which log files should be saved, if any
///
/// # Returns
///
/// An error if the log level is invalid. If the logger is already initialised, nothing changes.
pub fn init(log_level_from_settings: &str, log_file_path: Option<&Path>) -> Result<()> {
    // The logger can only be set once per process. Later commands run from the same process (as
    // in integration tests) keep the first logger.
    if LOGGER_INIT.set(()).is_err() {
        return Ok(());
    }

    // Environment variable takes precedence over the settings file
    let log_level = env::var(LOG_LEVEL_ENV_VAR)
        .unwrap_or_else(|_| log_level_from_settings.to_string());
    let log_level = parse_log_level(&log_level)?;

    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);
    let use_colour = std::io::stderr().is_terminal();

    // Console output
    let console = Dispatch::new()
        .format(move |out, message, record| {
            if use_colour {
                let level = colours.color(record.level());
                write_log_message(out, message, record, level);
            } else {
                write_log_message(out, message, record, record.level());
            }
        })
        .chain(std::io::stderr());

    let mut dispatch = Dispatch::new().level(log_level).chain(console);

    // Log files are only written if an output folder is given
    if let Some(log_file_path) = log_file_path {
        let info_file = Dispatch::new()
            .format(|out, message, record| write_log_message(out, message, record, record.level()))
            .filter(|metadata| metadata.level() > log::Level::Warn)
            .chain(fern::log_file(log_file_path.join(LOG_INFO_FILE_NAME))?);
        let error_file = Dispatch::new()
            .format(|out, message, record| write_log_message(out, message, record, record.level()))
            .level(LevelFilter::Warn)
            .chain(fern::log_file(log_file_path.join(LOG_ERROR_FILE_NAME))?);
        dispatch = dispatch.chain(info_file).chain(error_file);
    }

    dispatch.apply()?;

    Ok(())
}

/// Write a log message with a timestamp and level
fn write_log_message<T: std::fmt::Display>(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    level: T,
) {
    let timestamp = Local::now().format("%H:%M:%S");
    out.finish(format_args!(
        "[{timestamp} {level} {}] {message}",
        record.target()
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("off", LevelFilter::Off)]
    #[case("warn", LevelFilter::Warn)]
    #[case(" INFO ", LevelFilter::Info)]
    #[case("Trace", LevelFilter::Trace)]
    fn parse_log_level_valid(#[case] input: &str, #[case] expected: LevelFilter) {
        assert_eq!(parse_log_level(input).unwrap(), expected);
    }

    #[test]
    fn parse_log_level_invalid() {
        assert!(parse_log_level("loud").is_err());
    }
}
