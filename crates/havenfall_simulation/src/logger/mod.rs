//! Pluggable global logger.
//!
//! The simulation crate never prints directly: systems call [`log`] and the
//! host (console binary, engine bridge, test harness) installs a printer.
//! Console printer by default.

use once_cell::sync::Lazy;
use std::sync::Mutex;

static PRINTER: Lazy<Mutex<Option<Box<dyn LogPrinter>>>> = Lazy::new(|| Mutex::new(None));
static LEVEL: Lazy<Mutex<LogLevel>> = Lazy::new(|| Mutex::new(LogLevel::Debug));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

pub trait LogPrinter: Send + Sync {
    fn print(&self, level: LogLevel, message: &str);
}

pub fn set_printer(printer: Box<dyn LogPrinter>) {
    *PRINTER.lock().unwrap() = Some(printer);
}

pub fn set_level(level: LogLevel) {
    *LEVEL.lock().unwrap() = level;
}

/// Install the console printer unless the host already installed one.
pub fn init() {
    let mut printer = PRINTER.lock().unwrap();
    if printer.is_none() {
        *printer = Some(Box::new(ConsolePrinter));
    }
}

pub fn log(message: &str) {
    log_with_level(LogLevel::Debug, message);
}

pub fn log_info(message: &str) {
    log_with_level(LogLevel::Info, message);
}

pub fn log_warning(message: &str) {
    log_with_level(LogLevel::Warning, message);
}

pub fn log_error(message: &str) {
    log_with_level(LogLevel::Error, message);
}

pub fn log_with_level(level: LogLevel, message: &str) {
    if level < *LEVEL.lock().unwrap() {
        return;
    }
    // Timestamp added here, not in the printer, so every backend agrees
    if let Some(printer) = PRINTER.lock().unwrap().as_ref() {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        printer.print(level, &format!("[{}] {}", timestamp, message));
    }
}

struct ConsolePrinter;

impl LogPrinter for ConsolePrinter {
    fn print(&self, level: LogLevel, message: &str) {
        println!("[{}] {}", level.as_str(), message);
    }
}
