//! ANSI escape sequence filtering for terminals that cannot render them.
//!
//! Only CSI sequences are removed: `ESC [ params intermediates final` and the
//! single-character 8-bit form `U+009B params intermediates final`. Anything
//! else (including OSC strings and a lone ESC) passes through untouched.

use std::borrow::Cow;

const ESC: char = '\x1b';
const C1_CSI: char = '\u{9b}';

/// Strip CSI escape sequences from text.
///
/// Returns the input unchanged (borrowed) when it contains no sequence introducer.
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    if !text.contains([ESC, C1_CSI]) {
        return Cow::Borrowed(text);
    }

    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(idx) = rest.find([ESC, C1_CSI]) {
        result.push_str(&rest[..idx]);
        let tail = &rest[idx..];
        match csi_len(tail) {
            Some(len) => rest = &tail[len..],
            None => {
                // Not a complete CSI sequence: keep the introducer as text
                let ch_len = tail.chars().next().map_or(1, char::len_utf8);
                result.push_str(&tail[..ch_len]);
                rest = &tail[ch_len..];
            }
        }
    }
    result.push_str(rest);

    Cow::Owned(result)
}

/// Byte length of the CSI sequence at the start of `s`, if one is there.
fn csi_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    // Both `ESC [` and the UTF-8 encoding of U+009B are two bytes long
    let mut i = if s.starts_with(C1_CSI) || bytes.get(1) == Some(&b'[') {
        2
    } else {
        return None;
    };

    while matches!(bytes.get(i), Some(b'0'..=b'9' | b';' | b'?')) {
        i += 1;
    }
    while matches!(bytes.get(i), Some(b' '..=b'/')) {
        i += 1;
    }
    match bytes.get(i) {
        Some(b'@'..=b'~') => Some(i + 1),
        _ => None,
    }
}
