//! Terminal capability access.
//!
//! The executor never talks to the terminal directly. It asks a
//! [`TerminalCapability`] for the display width, whether escape sequences are
//! safe to emit, and for writers to forward child output into. The system
//! implementation reads the real terminal; [`BufferTerminal`] keeps everything
//! in memory for embedding in a TUI or for tests.

pub mod ansi;
pub mod style;

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

pub use ansi::strip_ansi;
pub use style::{status_line, with_foreground};

/// Width used when the terminal cannot report one.
pub const DEFAULT_WIDTH: u16 = 80;

/// Access to the controlling terminal.
pub trait TerminalCapability: Send + Sync {
    /// Display width in columns. Zero means unknown.
    fn width(&self) -> u16;

    /// Whether ANSI color and cursor sequences render correctly.
    fn is_ansi_capable(&self) -> bool;

    /// Sink for the child's standard output.
    fn writer(&self) -> Box<dyn Write + Send>;

    /// Sink for the child's standard error.
    fn error_writer(&self) -> Box<dyn Write + Send> {
        self.writer()
    }

    /// Take the per-execution snapshot of width and ANSI support.
    fn snapshot(&self) -> TerminalSnapshot {
        let width = match self.width() {
            0 => DEFAULT_WIDTH,
            w => w,
        };
        TerminalSnapshot {
            width,
            ansi_safe: self.is_ansi_capable(),
        }
    }
}

/// Read-only view of the terminal taken once per execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSnapshot {
    pub width: u16,
    pub ansi_safe: bool,
}

/// The real terminal attached to this process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTerminal;

impl TerminalCapability for SystemTerminal {
    fn width(&self) -> u16 {
        crossterm::terminal::size()
            .map(|(cols, _rows)| cols)
            .unwrap_or(DEFAULT_WIDTH)
    }

    fn is_ansi_capable(&self) -> bool {
        ansi_supported(|key| std::env::var(key).ok(), cfg!(windows))
    }

    fn writer(&self) -> Box<dyn Write + Send> {
        Box::new(io::stdout())
    }

    fn error_writer(&self) -> Box<dyn Write + Send> {
        Box::new(io::stderr())
    }
}

/// Decide ANSI support from environment variables.
///
/// `TERM=dumb` and a non-empty `NO_COLOR` always disable it. On Unix-likes
/// any non-empty `TERM` enables it; on Windows only known ANSI hosts do
/// (Windows Terminal, ANSICON, ConEmu with ANSI on).
pub fn ansi_supported<F>(lookup: F, windows: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    let set = |key: &str| lookup(key).is_some_and(|v| !v.is_empty());

    if lookup("TERM").is_some_and(|t| t.eq_ignore_ascii_case("dumb")) {
        return false;
    }
    if set("NO_COLOR") {
        return false;
    }
    if !windows {
        return set("TERM");
    }
    if set("WT_SESSION") || set("ANSICON") {
        return true;
    }
    lookup("ConEmuANSI").is_some_and(|v| v.eq_ignore_ascii_case("ON"))
}

/// An in-memory terminal whose writers append to a shared buffer.
#[derive(Debug, Clone)]
pub struct BufferTerminal {
    width: u16,
    ansi: bool,
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl BufferTerminal {
    pub fn new(width: u16, ansi: bool) -> Self {
        Self {
            width,
            ansi,
            buffer: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Everything written so far, decoded lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }
}

impl TerminalCapability for BufferTerminal {
    fn width(&self) -> u16 {
        self.width
    }

    fn is_ansi_capable(&self) -> bool {
        self.ansi
    }

    fn writer(&self) -> Box<dyn Write + Send> {
        Box::new(SharedWriter(self.buffer.clone()))
    }
}

struct SharedWriter(Arc<Mutex<Vec<u8>>>);

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut buffer = self
            .0
            .lock()
            .map_err(|e| io::Error::other(format!("Failed to lock terminal buffer: {}", e)))?;
        buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_unix_requires_term() {
        assert!(ansi_supported(env(&[("TERM", "xterm-256color")]), false));
        assert!(!ansi_supported(env(&[]), false));
        assert!(!ansi_supported(env(&[("TERM", "")]), false));
    }

    #[test]
    fn test_dumb_and_no_color_disable() {
        assert!(!ansi_supported(env(&[("TERM", "dumb")]), false));
        assert!(!ansi_supported(env(&[("TERM", "DUMB")]), true));
        assert!(!ansi_supported(env(&[("TERM", "xterm"), ("NO_COLOR", "1")]), false));
        // An empty NO_COLOR does not count
        assert!(ansi_supported(env(&[("TERM", "xterm"), ("NO_COLOR", "")]), false));
    }

    #[test]
    fn test_windows_hosts() {
        assert!(ansi_supported(env(&[("WT_SESSION", "abc")]), true));
        assert!(ansi_supported(env(&[("ANSICON", "80x25")]), true));
        assert!(ansi_supported(env(&[("ConEmuANSI", "on")]), true));
        assert!(!ansi_supported(env(&[("ConEmuANSI", "OFF")]), true));
        // TERM alone is not trusted on Windows
        assert!(!ansi_supported(env(&[("TERM", "xterm")]), true));
    }

    #[test]
    fn test_snapshot_defaults_zero_width() {
        let snapshot = BufferTerminal::new(0, true).snapshot();
        assert_eq!(snapshot.width, DEFAULT_WIDTH);
        assert!(snapshot.ansi_safe);

        let snapshot = BufferTerminal::new(120, false).snapshot();
        assert_eq!(snapshot, TerminalSnapshot { width: 120, ansi_safe: false });
    }

    #[test]
    fn test_buffer_terminal_shares_writes() {
        let terminal = BufferTerminal::new(80, true);
        let mut out = terminal.writer();
        let mut err = terminal.error_writer();
        out.write_all(b"out ").unwrap();
        err.write_all(b"err").unwrap();
        assert_eq!(terminal.text(), "out err");
    }
}
