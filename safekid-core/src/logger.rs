//! Bridges the `log` facade to a logger supplied by the host application.
//!
//! Every diagnostic in this crate goes through `log::info!`, `log::debug!`
//! and friends. Host apps receive them by registering a [`Logger`] once with
//! [`set_logger`]:
//!
//! ```swift
//! final class MessengerLog: SafekidCore.Logger {
//!     func log(level: SafekidCore.LogLevel, message: String) {
//!         os_log("%{public}@", message)
//!     }
//! }
//!
//! SafekidCore.setLogger(logger: MessengerLog())
//! ```

use std::sync::{Arc, OnceLock};

/// Receives log records from the messenger core.
///
/// ```rust
/// use safekid_core::logger::{LogLevel, Logger};
///
/// struct Stderr;
///
/// impl Logger for Stderr {
///     fn log(&self, level: LogLevel, message: String) {
///         eprintln!("[{level:?}] {message}");
///     }
/// }
/// ```
#[uniffi::export(with_foreign)]
pub trait Logger: Sync + Send {
    /// Records `message` at `level`.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a forwarded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum LogLevel {
    /// Very detailed tracing output.
    Trace,
    /// Debugging output, such as access denials and query plans.
    Debug,
    /// Normal progress: registrations, decisions, filtered messages.
    Info,
    /// Refused or suspicious requests.
    Warn,
    /// Failures the host should surface.
    Error,
}

struct ForeignLogger;

impl log::Log for ForeignLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if !should_forward(record.level(), record.module_path()) {
            return;
        }
        if let Some(logger) = LOGGER_INSTANCE.get() {
            logger.log(log_level(record.level()), format!("{}", record.args()));
        } else {
            eprintln!("safekid logger not set: {}", record.args());
        }
    }

    fn flush(&self) {}
}

/// Debug and trace records are only forwarded from this crate's modules.
fn should_forward(level: log::Level, module_path: Option<&str>) -> bool {
    let verbose = matches!(level, log::Level::Debug | log::Level::Trace);
    let ours = module_path.is_some_and(|path| path.starts_with("safekid"));
    !verbose || ours
}

const fn log_level(level: log::Level) -> LogLevel {
    match level {
        log::Level::Error => LogLevel::Error,
        log::Level::Warn => LogLevel::Warn,
        log::Level::Info => LogLevel::Info,
        log::Level::Debug => LogLevel::Debug,
        log::Level::Trace => LogLevel::Trace,
    }
}

static LOGGER_INSTANCE: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// Installs the host logger. Only the first call takes effect.
#[uniffi::export]
pub fn set_logger(logger: Arc<dyn Logger>) {
    if LOGGER_INSTANCE.set(logger).is_err() {
        eprintln!("safekid logger already set");
        return;
    }
    if let Err(e) = init_logger() {
        eprintln!("failed to install safekid logger: {e}");
    }
}

fn init_logger() -> Result<(), log::SetLoggerError> {
    static LOGGER: ForeignLogger = ForeignLogger;
    log::set_logger(&LOGGER)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
