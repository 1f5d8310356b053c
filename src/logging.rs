/// Structured logging for the climatology pipeline
///
/// Lines carry the pipeline stage and, where relevant, the station label.
/// Output goes to the console and optionally to an append-only file.
/// Nothing is written until `init_logger` has been called, so library
/// calls made from tests stay quiet.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Parses `debug`, `info`, `warn`/`warning` or `error` (any case).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Ingest,
    Clip,
    Climatology,
    ReturnPeriod,
    Pipeline,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Config => write!(f, "CONFIG"),
            Stage::Ingest => write!(f, "INGEST"),
            Stage::Clip => write!(f, "CLIP"),
            Stage::Climatology => write!(f, "CLIM"),
            Stage::ReturnPeriod => write!(f, "RETURN"),
            Stage::Pipeline => write!(f, "PIPE"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    fn format_entry(level: LogLevel, stage: Stage, station: Option<&str>, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let station_part = station.map(|s| format!(" [{}]", s)).unwrap_or_default();
        format!("{} {} {}{}: {}", timestamp, level, stage, station_part, message)
    }

    fn log(&self, level: LogLevel, stage: Stage, station: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = Self::format_entry(level, stage, station, message);
        let station_part = station.map(|s| format!(" [{}]", s)).unwrap_or_default();

        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", stage, station_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", stage, station_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}{}: {}", stage, station_part, message),
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger. Calling it again replaces the settings.
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    let logger = Logger {
        min_level,
        log_file: log_file.map(String::from),
        console_timestamps,
    };
    if let Ok(mut slot) = LOGGER.lock() {
        *slot = Some(logger);
    }
}

fn dispatch(level: LogLevel, stage: Stage, station: Option<&str>, message: &str) {
    if let Ok(slot) = LOGGER.lock() {
        if let Some(logger) = slot.as_ref() {
            logger.log(level, stage, station, message);
        }
    }
}

pub fn info(stage: Stage, station: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, stage, station, message);
}

pub fn warn(stage: Stage, station: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, stage, station, message);
}

pub fn error(stage: Stage, station: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, stage, station, message);
}

pub fn debug(stage: Stage, station: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, stage, station, message);
}

// ---------------------------------------------------------------------------
// Run summary
// ---------------------------------------------------------------------------

/// Log how many station pipelines succeeded.
pub fn log_run_summary(total: usize, successful: usize) {
    let failed = total.saturating_sub(successful);
    let message = format!(
        "Run complete: {}/{} stations processed, {} failed",
        successful, total, failed
    );

    if failed == 0 {
        info(Stage::Pipeline, None, &message);
    } else if successful == 0 {
        error(Stage::Pipeline, None, &message);
    } else {
        warn(Stage::Pipeline, None, &message);
    }
}
