//! The build log.
//!
//! Everything the user should see about a build step goes through a
//! [`BuildLogger`]. [`TracingLogger`] writes to `tracing`;
//! [`RecordingLogger`] captures entries for assertions.

use std::error::Error;
use std::sync::{Mutex, PoisonError};

use crate::error::error_chain;

/// Append-only build log.
pub trait BuildLogger: Send + Sync {
    /// Log an informational message.
    fn info(&self, message: &str);

    /// Log an error, optionally with its cause.
    fn error(&self, message: &str, cause: Option<&(dyn Error + 'static)>);
}

/// Logger that forwards to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl BuildLogger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn error(&self, message: &str, cause: Option<&(dyn Error + 'static)>) {
        match cause {
            Some(cause) => tracing::error!(cause = %error_chain(cause), "{}", message),
            None => tracing::error!("{}", message),
        }
    }
}

/// A captured log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    Info(String),
    Error {
        message: String,
        cause: Option<String>,
    },
}

/// Logger that records every entry.
///
/// Entries survive a panic on another thread that held the lock.
///
/// # Example
///
/// ```
/// use polaris_step::host::{BuildLogger, RecordingLogger};
///
/// let logger = RecordingLogger::new();
/// logger.info("Running Synopsys Polaris");
///
/// assert_eq!(logger.infos(), vec!["Running Synopsys Polaris".to_string()]);
/// assert!(logger.errors().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct RecordingLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl RecordingLogger {
    /// Create an empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Informational messages in order.
    pub fn infos(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                LogEntry::Info(message) => Some(message),
                LogEntry::Error { .. } => None,
            })
            .collect()
    }

    /// Error messages with their rendered causes, in order.
    pub fn errors(&self) -> Vec<(String, Option<String>)> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                LogEntry::Error { message, cause } => Some((message, cause)),
                LogEntry::Info(_) => None,
            })
            .collect()
    }

    fn push(&self, entry: LogEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

impl BuildLogger for RecordingLogger {
    fn info(&self, message: &str) {
        self.push(LogEntry::Info(message.to_string()));
    }

    fn error(&self, message: &str, cause: Option<&(dyn Error + 'static)>) {
        self.push(LogEntry::Error {
            message: message.to_string(),
            cause: cause.map(error_chain),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PolarisError;

    #[test]
    fn records_entries_in_order() {
        let logger = RecordingLogger::new();
        logger.info("first");
        logger.error("second", None);
        logger.info("third");

        assert_eq!(
            logger.entries(),
            vec![
                LogEntry::Info("first".into()),
                LogEntry::Error {
                    message: "second".into(),
                    cause: None
                },
                LogEntry::Info("third".into()),
            ]
        );
        assert_eq!(logger.infos(), vec!["first", "third"]);
    }

    #[test]
    fn keeps_recording_after_a_panicking_writer() {
        let logger = RecordingLogger::new();
        logger.info("before");

        std::thread::scope(|scope| {
            let poisoned = scope
                .spawn(|| {
                    let _guard = logger.entries.lock().unwrap();
                    panic!("writer panicked");
                })
                .join();
            assert!(poisoned.is_err());
        });
        assert!(logger.entries.is_poisoned());

        logger.info("after");
        assert_eq!(logger.infos(), vec!["before", "after"]);
    }

    #[test]
    fn renders_cause_chain() {
        let logger = RecordingLogger::new();
        let cause = PolarisError::CliFailed { code: 2 };
        logger.error("Polaris build step failed", Some(&cause));

        let errors = logger.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].1.as_deref(), Some("Polaris failed with exit code: 2"));
    }

    #[test]
    fn tracing_logger_never_panics() {
        let logger = TracingLogger;
        logger.info("hello");
        logger.error("oops", Some(&PolarisError::Interrupted));
    }
}
