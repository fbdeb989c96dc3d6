//! Named logging sink passed explicitly to the components that report
//! through it.
//!
//! A [`Logger`] is created once at process startup (usually through
//! [`Logger::init`]) and handed by reference to the reduction and anything
//! else that needs to log. There is no global or thread-local logger state:
//! two loggers with different names or thresholds can coexist in one process.

use crate::config::CollectiveConfig;

/// Logging levels. Higher values indicate more verbose logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Fatal error level - terminates the calling task
    Fatal = -1,
    /// Warning level - indicates potential issues
    Warning = 0,
    /// Information level - general information messages
    Info = 1,
    /// Debug level - detailed debugging information
    Debug = 2,
}

impl From<i32> for LogLevel {
    fn from(verbosity: i32) -> Self {
        LogLevel::from_verbosity(verbosity)
    }
}

impl LogLevel {
    /// Map an integer verbosity onto a level.
    /// -1 or below: Fatal, 0: Warning, 1: Info, 2+: Debug
    pub fn from_verbosity(verbosity: i32) -> Self {
        match verbosity {
            i if i < 0 => LogLevel::Fatal,
            0 => LogLevel::Warning,
            1 => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }

    /// Label used in formatted messages
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Fatal => "Fatal",
            LogLevel::Warning => "Warning",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
        }
    }

    /// Threshold handed to `env_logger` for this level
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Fatal => log::LevelFilter::Error,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
        }
    }

    fn to_log_level(self) -> log::Level {
        match self {
            LogLevel::Fatal => log::Level::Error,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
        }
    }
}

/// Type alias for logging callback functions.
pub type LogCallback = fn(&str);

/// Named logger instance.
///
/// Messages at or below the configured level are formatted as
/// `[<name>] [<Level>] <message>` and either handed to the callback, when one
/// is installed, or forwarded to the `log` facade with the logger name as
/// target.
#[derive(Debug, Clone)]
pub struct Logger {
    name: String,
    level: LogLevel,
    callback: Option<LogCallback>,
}

impl Logger {
    /// Default logger name
    pub const DEFAULT_NAME: &'static str = "boost_collective";

    /// Create a logger at `Info` level writing through the `log` facade
    pub fn new<S: Into<String>>(name: S) -> Self {
        Logger {
            name: name.into(),
            level: LogLevel::Info,
            callback: None,
        }
    }

    /// Create a logger from configuration without touching the process-wide
    /// `log` backend
    pub fn from_config(config: &CollectiveConfig) -> Self {
        Logger::new(config.logger_name.clone())
            .with_level(LogLevel::from_verbosity(config.verbosity))
    }

    /// Install `env_logger` (if no backend is installed yet) and create the
    /// logger. Call once at startup; `RUST_LOG` overrides the configured
    /// threshold.
    pub fn init(config: &CollectiveConfig) -> Self {
        let logger = Self::from_config(config);

        // Ignore the error if a backend was already installed
        let _ = env_logger::Builder::new()
            .filter_level(logger.level.to_level_filter())
            .parse_default_env()
            .try_init();

        if logger.enabled(LogLevel::Debug) {
            logger.debug(&format!(
                "Logger initialized: name={}, level={}",
                logger.name,
                logger.level.as_str()
            ));
        }
        logger
    }

    /// Set the threshold
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Redirect formatted messages to a callback. If None, messages go to the
    /// `log` facade.
    pub fn with_callback(mut self, callback: Option<LogCallback>) -> Self {
        self.callback = callback;
        self
    }

    /// Set the threshold from an integer verbosity
    pub fn set_verbosity(&mut self, verbosity: i32) {
        self.level = LogLevel::from_verbosity(verbosity);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Whether a message at `level` would be emitted
    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= self.level
    }

    /// Logs a debug message if the current log level allows it.
    pub fn debug(&self, message: &str) {
        self.write(LogLevel::Debug, message);
    }

    /// Logs an info message if the current log level allows it.
    pub fn info(&self, message: &str) {
        self.write(LogLevel::Info, message);
    }

    /// Logs a warning message if the current log level allows it.
    pub fn warning(&self, message: &str) {
        self.write(LogLevel::Warning, message);
    }

    /// Logs a fatal error message and aborts the calling task with a panic.
    pub fn fatal(&self, message: &str) -> ! {
        self.write(LogLevel::Fatal, message);
        panic!("{}", message);
    }

    /// Formatted variant of [`Logger::fatal`]
    pub fn fatal_fmt(&self, args: std::fmt::Arguments<'_>) -> ! {
        self.fatal(&format!("{}", args));
    }

    fn write(&self, level: LogLevel, message: &str) {
        if !self.enabled(level) {
            return;
        }

        match self.callback {
            Some(cb) => {
                cb(&format!("[{}] [{}] {}", self.name, level.as_str(), message));
            }
            None => {
                log::log!(
                    target: self.name.as_str(),
                    level.to_log_level(),
                    "[{}] [{}] {}",
                    self.name,
                    level.as_str(),
                    message
                );
            }
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Logger::new(Self::DEFAULT_NAME)
    }
}

/// Checks that a condition is true, aborts through the logger if false.
#[macro_export]
macro_rules! check {
    ($logger:expr, $condition:expr) => {
        if !($condition) {
            $logger.fatal(&format!(
                "Check failed: {} at {}:{}",
                stringify!($condition),
                file!(),
                line!()
            ));
        }
    };
}

/// Checks that two values are equal, aborts through the logger if not.
#[macro_export]
macro_rules! check_eq {
    ($logger:expr, $a:expr, $b:expr) => {
        $crate::check!($logger, $a == $b);
    };
}

/// Checks that first value is greater than or equal to second, aborts if not.
#[macro_export]
macro_rules! check_ge {
    ($logger:expr, $a:expr, $b:expr) => {
        $crate::check!($logger, $a >= $b);
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static CAPTURED: Mutex<Vec<String>> = Mutex::new(Vec::new());

    fn capture(msg: &str) {
        CAPTURED.lock().unwrap().push(msg.to_string());
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LogLevel::from(-1), LogLevel::Fatal);
        assert_eq!(LogLevel::from(0), LogLevel::Warning);
        assert_eq!(LogLevel::from(1), LogLevel::Info);
        assert_eq!(LogLevel::from(2), LogLevel::Debug);
        assert_eq!(LogLevel::from(999), LogLevel::Debug);
        assert_eq!(LogLevel::from(-5), LogLevel::from_verbosity(-5));
    }

    #[test]
    fn test_verbosity_mapping() {
        assert_eq!(LogLevel::from_verbosity(-5), LogLevel::Fatal);
        assert_eq!(LogLevel::from_verbosity(0), LogLevel::Warning);
        assert_eq!(LogLevel::from_verbosity(1), LogLevel::Info);
        assert_eq!(LogLevel::from_verbosity(7), LogLevel::Debug);
    }

    #[test]
    fn test_log_ordering() {
        assert!(LogLevel::Fatal < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
    }

    #[test]
    fn test_loggers_are_independent() {
        let quiet = Logger::new("quiet").with_level(LogLevel::Warning);
        let mut chatty = Logger::new("chatty");
        chatty.set_verbosity(2);

        assert!(!quiet.enabled(LogLevel::Info));
        assert!(chatty.enabled(LogLevel::Debug));
        assert_eq!(quiet.name(), "quiet");
        assert_eq!(Logger::default().name(), Logger::DEFAULT_NAME);
    }

    #[test]
    fn test_callback_receives_formatted_messages() {
        let logger = Logger::new("cb_test")
            .with_level(LogLevel::Info)
            .with_callback(Some(capture));

        logger.info("hello");
        logger.debug("filtered out");

        let captured = CAPTURED.lock().unwrap();
        assert!(captured.iter().any(|m| m == "[cb_test] [Info] hello"));
        assert!(!captured.iter().any(|m| m.contains("filtered out")));
    }

    #[test]
    fn test_basic_logging() {
        let logger = Logger::default().with_level(LogLevel::Debug);
        logger.debug("Test debug message");
        logger.info("Test info message");
        logger.warning("Test warning message");
    }

    #[test]
    #[should_panic(expected = "Test fatal message")]
    fn test_fatal_panic() {
        Logger::default().fatal("Test fatal message");
    }

    #[test]
    fn test_check_macros() {
        let logger = Logger::default();
        check!(logger, true);
        check_eq!(logger, 1, 1);
        check_ge!(logger, 2, 1);
    }

    #[test]
    #[should_panic(expected = "Check failed")]
    fn test_check_failure() {
        let logger = Logger::default();
        check_ge!(logger, 1, 2);
    }
}
