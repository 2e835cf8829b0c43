//! Line logging in the `[thread][HH-MM:SS.mmm]message` layout.
//!
//! Components never print directly: they receive a [`Sink`] and log through
//! it, so the binary can write to stdout while tests capture the lines with
//! [`Capture`]. Diagnostics that are not part of the demo output go through
//! the `log` facade; [`init`] routes those to stdout in the same layout.

use std::cell::RefCell;
use std::sync::Mutex;

use chrono::{DateTime, Local};

const TIME_FORMAT: &str = "%H-%M:%S%.3f";

thread_local! {
    static CONTEXT_NAME: RefCell<Option<String>> = RefCell::new(None);
}

/// Override the context name reported by [`LogContext::current`] on this thread.
///
/// `None` restores the OS thread name. Returns the previous override.
pub fn set_context_name(name: Option<&str>) -> Option<String> {
    CONTEXT_NAME.with(|cell| cell.replace(name.map(str::to_string)))
}

/// Where and when a line was logged.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub thread: String,
    pub at: DateTime<Local>,
}

impl LogContext {
    /// Reads the execution context name and the wall clock now.
    pub fn current() -> LogContext {
        let thread = CONTEXT_NAME
            .with(|cell| cell.borrow().clone())
            .unwrap_or_else(|| {
                std::thread::current()
                    .name()
                    .unwrap_or("unnamed")
                    .to_string()
            });

        LogContext {
            thread,
            at: Local::now(),
        }
    }
}

/// Renders one output line, without the trailing newline.
pub fn format_line(message: &str, context: &LogContext) -> String {
    format!(
        "[{}][{}]{}",
        context.thread,
        context.at.format(TIME_FORMAT),
        message
    )
}

pub trait Sink: Send + Sync {
    fn log(&self, message: &str, context: &LogContext);

    /// Logs `message` with the caller's context.
    fn log_here(&self, message: &str) {
        self.log(message, &LogContext::current());
    }
}

/// Writes every line to stdout as soon as it is logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct Console;

impl Sink for Console {
    fn log(&self, message: &str, context: &LogContext) {
        println!("{}", format_line(message, context));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub thread: String,
    pub at: DateTime<Local>,
    pub message: String,
}

/// Keeps every logged line in memory, in logging order.
#[derive(Debug, Default)]
pub struct Capture {
    lines: Mutex<Vec<Line>>,
}

impl Capture {
    pub fn new() -> Capture {
        Capture::default()
    }

    pub fn lines(&self) -> Vec<Line> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Messages only, in logging order.
    pub fn messages(&self) -> Vec<String> {
        self.lines().into_iter().map(|line| line.message).collect()
    }

    /// First line whose message is exactly `message`.
    pub fn find(&self, message: &str) -> Option<Line> {
        self.lines().into_iter().find(|line| line.message == message)
    }
}

impl Sink for Capture {
    fn log(&self, message: &str, context: &LogContext) {
        let line = Line {
            thread: context.thread.clone(),
            at: context.at,
            message: message.to_string(),
        };
        match self.lines.lock() {
            Ok(mut lines) => lines.push(line),
            Err(poisoned) => poisoned.into_inner().push(line),
        }
    }
}

struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = format!("{} {}", record.level(), record.args());
        println!("{}", format_line(&message, &LogContext::current()));
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Routes `log` records at or above `level` to stdout.
///
/// The level is applied even when another logger is already installed, in
/// which case that logger keeps receiving records and the error is returned.
pub fn init(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    log::set_max_level(level);
    log::set_logger(&LOGGER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_thread_time_and_message() {
        // Given
        let at = Local::now();
        let context = LogContext {
            thread: "work".to_string(),
            at,
        };

        // When
        let line = format_line("start fetch user 1 info", &context);

        // Then
        let expected = format!("[work][{}]start fetch user 1 info", at.format("%H-%M:%S%.3f"));
        assert_eq!(line, expected);
    }

    #[test]
    fn timestamp_uses_dash_between_hours_and_minutes() {
        let context = LogContext::current();

        let line = format_line("", &context);

        // [name][HH-MM:SS.mmm]
        let stamp = &line[line.len() - 13..line.len() - 1];
        assert_eq!(stamp.as_bytes()[2], b'-');
        assert_eq!(stamp.as_bytes()[5], b':');
        assert_eq!(stamp.as_bytes()[8], b'.');
    }

    #[test]
    fn context_name_override_is_thread_local_and_restorable() {
        std::thread::Builder::new()
            .name("outer".to_string())
            .spawn(|| {
                assert_eq!(LogContext::current().thread, "outer");

                let previous = set_context_name(Some("ui"));
                assert_eq!(previous, None);
                assert_eq!(LogContext::current().thread, "ui");

                set_context_name(previous.as_deref());
                assert_eq!(LogContext::current().thread, "outer");
            })
            .unwrap()
            .join()
            .unwrap();
    }

    #[test]
    fn init_reports_an_already_installed_logger() {
        // Given
        let _ = init(log::LevelFilter::Info);

        // When
        let second = init(log::LevelFilter::Warn);

        // Then
        assert!(second.is_err());
        assert_eq!(log::max_level(), log::LevelFilter::Warn);
    }

    #[test]
    fn capture_keeps_lines_in_order() {
        // Given
        let capture = Capture::new();

        // When
        capture.log_here("first");
        capture.log_here("second");

        // Then
        assert_eq!(capture.messages(), vec!["first", "second"]);
        assert!(capture.find("second").is_some());
        assert!(capture.find("third").is_none());
    }
}
