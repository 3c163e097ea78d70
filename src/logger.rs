//! Injected logging capability
//!
//! The cache engine and artifact store report user-facing progress through a
//! `Logger` handed to them at construction. `TracingLogger` forwards to
//! `tracing`; `MemoryLogger` keeps the lines so callers can inspect them.

use std::sync::Mutex;
use tracing::Level;

/// Severity of a reported line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// Logging capability injected into each component
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);

    /// Whether debug output is wanted (enables extra diagnostics such as archive listings)
    fn debug_enabled(&self) -> bool {
        false
    }
}

/// Logger backed by the global `tracing` subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!("{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }

    fn debug_enabled(&self) -> bool {
        tracing::enabled!(Level::DEBUG)
    }
}

/// Logger that records every line in memory
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<(LogLevel, String)>>,
    debug: bool,
}

impl MemoryLogger {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recorder that reports debug as enabled
    pub fn with_debug() -> Self {
        Self {
            lines: Mutex::new(Vec::new()),
            debug: true,
        }
    }

    /// All recorded lines, oldest first
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lock().clone()
    }

    /// Messages recorded at the given level
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Whether any line at `level` contains `needle`
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.lock()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(LogLevel, String)>> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, level: LogLevel, message: &str) {
        self.lock().push((level, message.to_string()));
    }
}

impl Logger for MemoryLogger {
    fn debug(&self, message: &str) {
        self.push(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn warning(&self, message: &str) {
        self.push(LogLevel::Warning, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }

    fn debug_enabled(&self) -> bool {
        self.debug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_logger_records_levels() {
        let logger = MemoryLogger::new();
        logger.info("Cache hit for: key");
        logger.warning("Failed to save: boom");

        assert_eq!(logger.lines().len(), 2);
        assert_eq!(logger.messages(LogLevel::Info), vec!["Cache hit for: key"]);
        assert!(logger.contains(LogLevel::Warning, "boom"));
        assert!(!logger.contains(LogLevel::Info, "boom"));
    }

    #[test]
    fn debug_flag() {
        assert!(!MemoryLogger::new().debug_enabled());
        assert!(MemoryLogger::with_debug().debug_enabled());
    }
}
