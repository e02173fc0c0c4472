/*
 * Installs the process-wide logger for hosts embedding the switcher. Output
 * goes to the terminal and, when enabled in the settings, is appended to a
 * log file. Everything else in the crate only talks to the `log` facade.
 */
use super::config::SwitcherSettings;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

pub const LOG_FILE_NAME: &str = "reference_switcher.log";

#[derive(Debug)]
pub enum LoggingError {
    Io(io::Error),
    AlreadyInitialized(log::SetLoggerError),
}

impl From<io::Error> for LoggingError {
    fn from(err: io::Error) -> Self {
        LoggingError::Io(err)
    }
}

impl From<log::SetLoggerError> for LoggingError {
    fn from(err: log::SetLoggerError) -> Self {
        LoggingError::AlreadyInitialized(err)
    }
}

impl std::fmt::Display for LoggingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoggingError::Io(e) => write!(f, "Could not open log file: {e}"),
            LoggingError::AlreadyInitialized(e) => write!(f, "Logger already installed: {e}"),
        }
    }
}

impl std::error::Error for LoggingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoggingError::Io(e) => Some(e),
            LoggingError::AlreadyInitialized(e) => Some(e),
        }
    }
}

/// Unknown level names fall back to `Info`.
pub fn parse_level_filter(level: &str) -> LevelFilter {
    level.trim().parse::<LevelFilter>().unwrap_or(LevelFilter::Info)
}

/*
 * Builds the loggers described by `settings` without installing them. The
 * file logger is only added when file logging is enabled and a directory is
 * given; the directory is created if needed.
 */
pub fn build_loggers(
    settings: &SwitcherSettings,
    log_dir: Option<&Path>,
) -> Result<Vec<Box<dyn SharedLogger>>, LoggingError> {
    let level = parse_level_filter(&settings.log_level);
    let config = ConfigBuilder::new()
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Error)
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    if settings.log_to_file
        && let Some(dir) = log_dir
    {
        fs::create_dir_all(dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(LOG_FILE_NAME))?;
        loggers.push(WriteLogger::new(level, config, file));
    }

    Ok(loggers)
}

pub fn init_logging(settings: &SwitcherSettings, log_dir: Option<&Path>) -> Result<(), LoggingError> {
    CombinedLogger::init(build_loggers(settings, log_dir)?)?;
    log::debug!(
        "Logging: Initialized at level '{}' (file logging: {}).",
        settings.log_level,
        settings.log_to_file && log_dir.is_some()
    );
    Ok(())
}
