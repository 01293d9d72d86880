//! Logging setup. The containers only talk to the `log` facade; binaries and tests pick a backend here.

use std::fmt::{self, Display};
use std::fs::File;
use std::path::PathBuf;

use simplelog::{ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode, WriteLogger};


#[derive(Debug, Clone)]
pub struct LogConfig {
    /// What gets printed to the terminal.
    pub term_level: LevelFilter,
    /// An optional log file, and what gets written to it.
    pub file: Option<(PathBuf, LevelFilter)>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { term_level: LevelFilter::Warn, file: None }
    }
}

#[non_exhaustive]
#[derive(Debug)]
pub enum LoggingError {
    /// A global logger was already installed.
    AlreadyInitialized(log::SetLoggerError),
    /// The log file could not be created.
    File(std::io::Error),
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInitialized(e) => write!(f, "logger already initialized: {e}"),
            Self::File(e) => write!(f, "could not create log file: {e}"),
        }
    }
}

impl std::error::Error for LoggingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::AlreadyInitialized(e) => Some(e),
            Self::File(e) => Some(e),
        }
    }
}

/// Installs a terminal logger, plus a file logger if one is configured.
pub fn initialize_logging(config: &LogConfig) -> Result<(), LoggingError> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![
        TermLogger::new(config.term_level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto),
    ];
    if let Some((path, level)) = &config.file {
        let file = File::create(path).map_err(LoggingError::File)?;
        loggers.push(WriteLogger::new(*level, Config::default(), file));
    }
    CombinedLogger::init(loggers).map_err(LoggingError::AlreadyInitialized)?;

    info!("Logging initialized");
    Ok(())
}

/// Routes log output through the test harness. Safe to call from every test.
#[cfg(test)]
pub(crate) fn init_test_logging() {
    // only the first call per process wins, the rest get an error we don't care about
    let _ = simplelog::TestLogger::init(LevelFilter::Trace, Config::default());
}
