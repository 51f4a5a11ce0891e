//! Stream pumps: relay one child output stream to the capture and the terminal.
//!
//! Each pump runs on its own thread and owns its capture buffer until it is
//! joined. Chunks are captured raw; the terminal copy is ANSI-stripped when the
//! terminal cannot render escape sequences.

use std::borrow::Cow;
use std::io::{ErrorKind, Read, Write};
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::term::strip_ansi;

/// Copy `source` into `capture` and `terminal` until end-of-data.
///
/// Read errors end the pump quietly. A failing terminal is dropped and the
/// source is still drained into the capture so the child never blocks on a
/// full pipe.
pub fn pump<R, W>(
    source: &mut R,
    capture: &mut Vec<u8>,
    terminal: &mut W,
    ansi_safe: bool,
    chunk_size: usize,
) where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut display = DisplayFilter::new(ansi_safe);
    let mut terminal_ok = true;

    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("Pump read ended: {}", e);
                break;
            }
        };
        let chunk = &buf[..n];
        capture.extend_from_slice(chunk);

        if terminal_ok {
            let shown = display.render(chunk);
            if let Err(e) = terminal.write_all(&shown).and_then(|()| terminal.flush()) {
                debug!("Terminal write failed, capturing only: {}", e);
                terminal_ok = false;
            }
        }
    }

    if terminal_ok {
        let rest = display.finish();
        if !rest.is_empty() {
            if let Err(e) = terminal.write_all(&rest).and_then(|()| terminal.flush()) {
                debug!("Terminal write failed at end of stream: {}", e);
            }
        }
    }
}

/// Run [`pump`] on a named thread; the join handle yields the capture.
pub fn spawn_pump<R>(
    name: &str,
    mut source: R,
    mut terminal: Box<dyn Write + Send>,
    ansi_safe: bool,
    chunk_size: usize,
) -> std::io::Result<JoinHandle<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name(format!("pump-{}", name))
        .spawn(move || {
            let mut capture = Vec::new();
            pump(&mut source, &mut capture, &mut terminal, ansi_safe, chunk_size);
            capture
        })
}

/// Turns raw chunks into what the terminal should see.
///
/// With ANSI passthrough the bytes are forwarded as-is. Otherwise they are
/// decoded as UTF-8 and stripped. A character or a CSI sequence split across
/// two reads is held back until its remaining bytes arrive.
struct DisplayFilter {
    ansi_safe: bool,
    pending: Vec<u8>,
}

impl DisplayFilter {
    fn new(ansi_safe: bool) -> Self {
        Self {
            ansi_safe,
            pending: Vec::new(),
        }
    }

    fn render<'a>(&mut self, chunk: &'a [u8]) -> Cow<'a, [u8]> {
        if self.ansi_safe {
            return Cow::Borrowed(chunk);
        }

        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);
        let mut complete = bytes.len() - incomplete_tail(&bytes);
        complete -= unfinished_csi(&bytes[..complete]);
        self.pending = bytes.split_off(complete);

        let text = String::from_utf8_lossy(&bytes);
        Cow::Owned(strip_ansi(&text).into_owned().into_bytes())
    }

    /// Flush a dangling partial character or sequence at end of stream.
    fn finish(&mut self) -> Vec<u8> {
        let pending = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&pending).into_owned().into_bytes()
    }
}

/// Length of an unfinished UTF-8 sequence at the end of `bytes`.
fn incomplete_tail(bytes: &[u8]) -> usize {
    for back in 1..=bytes.len().min(3) {
        let byte = bytes[bytes.len() - back];
        if byte & 0b1100_0000 == 0b1000_0000 {
            // continuation byte, keep looking for the lead
            continue;
        }
        let needed = match byte {
            b if b & 0b1110_0000 == 0b1100_0000 => 2,
            b if b & 0b1111_0000 == 0b1110_0000 => 3,
            b if b & 0b1111_1000 == 0b1111_0000 => 4,
            _ => return 0,
        };
        return if needed > back { back } else { 0 };
    }
    0
}

/// Length of a CSI sequence at the end of `bytes` that is still waiting for
/// its final byte. Sequences longer than `MAX_HELD_CSI` are let through.
fn unfinished_csi(bytes: &[u8]) -> usize {
    let window = &bytes[bytes.len().saturating_sub(MAX_HELD_CSI)..];
    let introducer = (0..window.len()).rev().find_map(|i| match &window[i..] {
        [0x1b, ..] => Some((i, 1)),
        [0xc2, 0x9b, ..] => Some((i, 2)),
        _ => None,
    });
    let Some((start, intro_len)) = introducer else {
        return 0;
    };

    let tail = &window[start..];
    let body = match tail {
        [0x1b] => return tail.len(),
        [0x1b, b'[', body @ ..] => body,
        [0x1b, ..] => return 0,
        _ => &tail[intro_len..],
    };

    let params = body
        .iter()
        .take_while(|b| matches!(b, b'0'..=b'9' | b';' | b'?'))
        .count();
    if body[params..].iter().all(|b| matches!(b, b' '..=b'/')) {
        tail.len()
    } else {
        0
    }
}

const MAX_HELD_CSI: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    /// Hands out the data in fixed pieces to simulate short pipe reads.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        piece: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let end = (self.pos + self.piece.min(buf.len())).min(self.data.len());
            let n = end - self.pos;
            buf[..n].copy_from_slice(&self.data[self.pos..end]);
            self.pos = end;
            Ok(n)
        }
    }

    struct BrokenTerminal;

    impl Write for BrokenTerminal {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_passthrough_keeps_escapes() {
        let data = b"\x1b[32mok\x1b[0m\n".to_vec();
        let mut capture = Vec::new();
        let mut terminal = Vec::new();
        pump(&mut Cursor::new(data.clone()), &mut capture, &mut terminal, true, 4);
        assert_eq!(capture, data);
        assert_eq!(terminal, data);
    }

    #[test]
    fn test_stripping_only_affects_terminal() {
        let data = b"\x1b[31mred\x1b[0m plain\n".to_vec();
        let mut capture = Vec::new();
        let mut terminal = Vec::new();
        pump(&mut Cursor::new(data.clone()), &mut capture, &mut terminal, false, 8192);
        assert_eq!(capture, data);
        assert_eq!(terminal, b"red plain\n");
    }

    #[test]
    fn test_split_multibyte_characters_survive() {
        let data = "día ✓ 🚀 fin".as_bytes().to_vec();
        for piece in 1..=5 {
            let mut source = Trickle { data: data.clone(), pos: 0, piece };
            let mut capture = Vec::new();
            let mut terminal = Vec::new();
            pump(&mut source, &mut capture, &mut terminal, false, 64);
            assert_eq!(capture, data, "piece size {}", piece);
            assert_eq!(String::from_utf8(terminal).unwrap(), "día ✓ 🚀 fin");
        }
    }

    #[test]
    fn test_escape_split_across_reads_is_stripped() {
        let data = b"ab\x1b[31mred\x1b[0m\n".to_vec();
        for split in 0..=data.len() {
            let head = Cursor::new(data[..split].to_vec());
            let mut source = head.chain(Cursor::new(data[split..].to_vec()));
            let mut capture = Vec::new();
            let mut terminal = Vec::new();
            pump(&mut source, &mut capture, &mut terminal, false, 64);
            assert_eq!(capture, data, "split at {}", split);
            assert_eq!(terminal, b"abred\n", "split at {}", split);
        }
    }

    #[test]
    fn test_escape_trickled_byte_by_byte_is_stripped() {
        let data = "x\u{9b}1;32mgo\x1b[0m".as_bytes().to_vec();
        for piece in 1..=4 {
            let mut source = Trickle { data: data.clone(), pos: 0, piece };
            let mut capture = Vec::new();
            let mut terminal = Vec::new();
            pump(&mut source, &mut capture, &mut terminal, false, 64);
            assert_eq!(String::from_utf8(terminal).unwrap(), "xgo", "piece size {}", piece);
        }
    }

    #[test]
    fn test_unfinished_escape_at_end_is_flushed_as_text() {
        let mut capture = Vec::new();
        let mut terminal = Vec::new();
        pump(&mut Cursor::new(b"done\x1b[3".to_vec()), &mut capture, &mut terminal, false, 8);
        assert_eq!(terminal, b"done\x1b[3");
    }

    #[test]
    fn test_unfinished_csi() {
        assert_eq!(unfinished_csi(b"plain"), 0);
        assert_eq!(unfinished_csi(b"a\x1b"), 1);
        assert_eq!(unfinished_csi(b"a\x1b["), 2);
        assert_eq!(unfinished_csi(b"a\x1b[31;1"), 6);
        assert_eq!(unfinished_csi(b"a\x1b[31m"), 0);
        assert_eq!(unfinished_csi(b"a\x1b]0;title"), 0);
        assert_eq!(unfinished_csi("a\u{9b}2".as_bytes()), 3);
        // a lone 0x9b continuation byte is not an introducer
        assert_eq!(unfinished_csi("\u{e9b}".as_bytes()), 0);
        let long = [&b"\x1b["[..], &[b'1'; 100][..]].concat();
        assert_eq!(unfinished_csi(&long), 0);
    }

    #[test]
    fn test_broken_terminal_still_captures() {
        let data = vec![b'x'; 50_000];
        let mut capture = Vec::new();
        pump(&mut Cursor::new(data.clone()), &mut capture, &mut BrokenTerminal, true, 1024);
        assert_eq!(capture, data);
    }

    #[test]
    fn test_truncated_character_at_end_is_flushed() {
        let mut capture = Vec::new();
        let mut terminal = Vec::new();
        pump(&mut Cursor::new(vec![b'a', 0xE2, 0x9C]), &mut capture, &mut terminal, false, 8);
        assert_eq!(capture, vec![b'a', 0xE2, 0x9C]);
        assert!(String::from_utf8(terminal).unwrap().starts_with('a'));
    }

    #[test]
    fn test_incomplete_tail() {
        assert_eq!(incomplete_tail(b"abc"), 0);
        assert_eq!(incomplete_tail(&[b'a', 0xE2]), 1);
        assert_eq!(incomplete_tail(&[0xE2, 0x9C]), 2);
        assert_eq!(incomplete_tail(&[0xE2, 0x9C, 0x93]), 0);
        assert_eq!(incomplete_tail(&[0xF0, 0x9F, 0x9A]), 3);
        assert_eq!(incomplete_tail(&[]), 0);
    }

    #[test]
    fn test_spawned_pump_returns_capture() {
        let data = b"line one\nline two\n".to_vec();
        let handle =
            spawn_pump("test", Cursor::new(data.clone()), Box::new(io::sink()), true, 4).unwrap();
        assert_eq!(handle.join().unwrap(), data);
    }
}
