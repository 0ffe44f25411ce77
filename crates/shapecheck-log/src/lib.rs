//! A minimal, zero-dependency logging crate for `shapecheck`.
//!
//! Thread-safe leveled logging with automatic module path detection and
//! colored terminal output on stderr. Records emitted inside [`capture`] are
//! also collected for the current thread, which is how tests assert on the
//! diagnostics a conformance check produced.
//!
//! # Example
//!
//! ```
//! use shapecheck_log::{warn, debug, Level};
//!
//! shapecheck_log::set_level(Level::Debug);
//!
//! let (_, records) = shapecheck_log::capture(|| {
//!     warn!("ignoring defect at {}", "Union[int, 'Fwd']");
//!     debug!("checked {} nodes", 3);
//! });
//!
//! assert_eq!(records.len(), 2);
//! assert_eq!(records[0].level, Level::Warn);
//! ```

use std::cell::RefCell;
use std::fmt::{self, Arguments};
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU8, Ordering};

/// Environment variable read by [`init_from_env`].
pub const ENV_VAR: &str = "SHAPECHECK_LOG";

/// Log levels representing the severity of log messages.
///
/// Ordered from most severe (Error) to least severe (Trace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Critical failures
    Error = 0,
    /// Ignored annotation defects and other recoverable problems
    Warn = 1,
    /// Informational messages
    Info = 2,
    /// Per-evaluation diagnostics
    Debug = 3,
    /// Per-node tracing
    Trace = 4,
}

impl Level {
    const fn color_code(&self) -> &'static str {
        match self {
            Level::Error => "\x1b[31m",
            Level::Warn => "\x1b[33m",
            Level::Info => "\x1b[32m",
            Level::Debug => "\x1b[36m",
            Level::Trace => "\x1b[35m",
        }
    }

    /// Returns the string representation of this log level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    const fn from_u8(raw: u8) -> Level {
        match raw {
            0 => Level::Error,
            1 => Level::Warn,
            2 => Level::Info,
            3 => Level::Debug,
            _ => Level::Trace,
        }
    }
}

impl FromStr for Level {
    type Err = ParseLevelError;

    /// Parses a level name, case-insensitively.
    ///
    /// ```
    /// use shapecheck_log::Level;
    ///
    /// assert_eq!("warn".parse(), Ok(Level::Warn));
    /// assert!("loud".parse::<Level>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ERROR" => Ok(Level::Error),
            "WARN" | "WARNING" => Ok(Level::Warn),
            "INFO" => Ok(Level::Info),
            "DEBUG" => Ok(Level::Debug),
            "TRACE" => Ok(Level::Trace),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a level name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError(String);

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid log level: {}", self.0)
    }
}

impl std::error::Error for ParseLevelError {}

/// A single log record, as seen by [`capture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Severity.
    pub level: Level,
    /// Module path of the call site.
    pub target: String,
    /// Formatted message.
    pub message: String,
}

/// The global logger.
///
/// Only the level lives here; capture buffers are per thread.
pub struct Logger {
    level: AtomicU8,
}

impl Logger {
    const fn new(level: Level) -> Self {
        Logger {
            level: AtomicU8::new(level as u8),
        }
    }

    /// Sets the minimum log level.
    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::SeqCst);
    }

    /// Returns the current minimum log level.
    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Checks if a message at the given level would be printed.
    pub fn enabled(&self, level: Level) -> bool {
        level as u8 <= self.level.load(Ordering::Relaxed)
    }
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

thread_local! {
    static CAPTURE: RefCell<Option<Vec<Record>>> = const { RefCell::new(None) };
}

/// Returns the global logger, initializing it at `Level::Warn`.
pub fn get_logger() -> &'static Logger {
    LOGGER.get_or_init(|| Logger::new(Level::Warn))
}

/// Sets the minimum log level for the global logger.
pub fn set_level(level: Level) {
    get_logger().set_level(level);
}

/// Sets the minimum log level from a string.
///
/// ```
/// shapecheck_log::set_level_from_str("debug").unwrap();
/// assert!(shapecheck_log::set_level_from_str("chatty").is_err());
/// ```
pub fn set_level_from_str(s: &str) -> Result<(), ParseLevelError> {
    set_level(s.parse()?);
    Ok(())
}

/// Applies the level named by `SHAPECHECK_LOG`, if set.
///
/// Returns the level now in effect.
pub fn init_from_env() -> Result<Level, ParseLevelError> {
    if let Ok(raw) = std::env::var(ENV_VAR) {
        set_level_from_str(&raw)?;
    }
    Ok(get_logger().level())
}

/// Runs `f` and returns its result together with every record logged on
/// this thread while it ran, regardless of the global level.
///
/// Captures nest: an inner capture takes its records, and the outer one
/// resumes afterwards.
pub fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<Record>) {
    let outer = CAPTURE.with(|c| c.borrow_mut().replace(Vec::new()));
    let result = f();
    let records = CAPTURE.with(|c| {
        let mut slot = c.borrow_mut();
        let taken = slot.take().unwrap_or_default();
        *slot = outer;
        taken
    });
    (result, records)
}

/// Returns `true` if a record at `level` would be printed or captured.
#[doc(hidden)]
pub fn __enabled(level: Level) -> bool {
    get_logger().enabled(level) || CAPTURE.with(|c| c.borrow().is_some())
}

/// Internal function that performs the actual logging.
#[doc(hidden)]
pub fn __log_with_target(level: Level, target: &str, args: Arguments) {
    static RESET: &str = "\x1b[0m";

    let captured = CAPTURE.with(|c| {
        if let Some(records) = c.borrow_mut().as_mut() {
            records.push(Record {
                level,
                target: target.to_string(),
                message: args.to_string(),
            });
            true
        } else {
            false
        }
    });

    if captured || !get_logger().enabled(level) {
        return;
    }

    let color = level.color_code();
    let level_str = level.as_str();

    eprintln!("{color}[{level_str}]{RESET} {target}: {args}");
}

/// The primary logging macro.
///
/// ```
/// use shapecheck_log::{log, Level};
///
/// log!(level: Level::Info, "checked {} values", 42);
/// ```
#[macro_export]
macro_rules! log {
    (level: $level:expr, $($arg:tt)*) => {
        {
            if $crate::__enabled($level) {
                $crate::__log_with_target(
                    $level,
                    module_path!(),
                    format_args!($($arg)*)
                );
            }
        }
    };
}

/// Logs a message at the Error level.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Error, $($arg)*)
    };
}

/// Logs a message at the Warn level.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Warn, $($arg)*)
    };
}

/// Logs a message at the Info level.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Info, $($arg)*)
    };
}

/// Logs a message at the Debug level.
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Debug, $($arg)*)
    };
}

/// Logs a message at the Trace level.
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Trace, $($arg)*)
    };
}
