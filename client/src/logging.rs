use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

use crate::config::DEFAULT_LOG_FILTER;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConsoleMethod {
    Error,
    Warn,
    Info,
    Debug,
}

fn console_method(level: Level) -> ConsoleMethod {
    match level {
        Level::ERROR => ConsoleMethod::Error,
        Level::WARN => ConsoleMethod::Warn,
        Level::INFO => ConsoleMethod::Info,
        _ => ConsoleMethod::Debug,
    }
}

/// Buffers one formatted event and hands it to `console.*` when dropped.
pub struct ConsoleWriter {
    method: ConsoleMethod,
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn finish_line(buf: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(buf);
    let line = line.trim_end();
    (!line.is_empty()).then(|| line.to_string())
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let Some(line) = finish_line(&self.buf) else {
            return;
        };
        let line = line.into();
        match self.method {
            ConsoleMethod::Error => web_sys::console::error_1(&line),
            ConsoleMethod::Warn => web_sys::console::warn_1(&line),
            ConsoleMethod::Info => web_sys::console::info_1(&line),
            ConsoleMethod::Debug => web_sys::console::debug_1(&line),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            method: ConsoleMethod::Info,
            buf: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter {
            method: console_method(*meta.level()),
            buf: Vec::new(),
        }
    }
}

/// Install the global subscriber. An unparsable `filter` falls back to the
/// default directive. Returns `false` if a subscriber was already installed.
pub fn init(filter: Option<&str>) -> bool {
    let filter = filter
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(ConsoleMakeWriter)
        .without_time()
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_route_to_matching_console_methods() {
        assert_eq!(console_method(Level::ERROR), ConsoleMethod::Error);
        assert_eq!(console_method(Level::WARN), ConsoleMethod::Warn);
        assert_eq!(console_method(Level::INFO), ConsoleMethod::Info);
        assert_eq!(console_method(Level::DEBUG), ConsoleMethod::Debug);
        assert_eq!(console_method(Level::TRACE), ConsoleMethod::Debug);
    }

    #[test]
    fn formatted_lines_are_trimmed_and_blank_ones_dropped() {
        assert_eq!(
            finish_line(b" INFO budget_map_labels: mounted\n"),
            Some(" INFO budget_map_labels: mounted".to_string())
        );
        assert_eq!(finish_line(b"\n"), None);
        assert_eq!(finish_line(b""), None);
    }
}
