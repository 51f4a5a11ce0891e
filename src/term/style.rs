//! Colored text and the right-aligned status glyph.

use crossterm::style::{Color, Stylize};

const SUCCESS_GLYPH: &str = ":)";
const FAILURE_GLYPH: &str = ":(";

/// Wrap `text` in the escape sequences for the given foreground color.
pub fn with_foreground(text: &str, color: Color) -> String {
    text.with(color).to_string()
}

/// Render the status line printed after every execution.
///
/// The glyph sits in the last two columns: `width - 2` spaces of padding,
/// saturating at zero for very narrow terminals. When `colored` is false the
/// glyph is emitted without escape sequences.
pub fn status_line(width: u16, success: bool, colored: bool) -> String {
    let (glyph, color) = if success {
        (SUCCESS_GLYPH, Color::Green)
    } else {
        (FAILURE_GLYPH, Color::Red)
    };

    let padding = " ".repeat(usize::from(width.saturating_sub(2)));
    if colored {
        format!("{}{}", padding, with_foreground(glyph, color))
    } else {
        format!("{}{}", padding, glyph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_is_width_minus_two() {
        for width in [2u16, 3, 10, 80, 200] {
            let line = status_line(width, true, false);
            assert_eq!(line.len(), usize::from(width));
            assert!(line.ends_with(":)"));
            assert_eq!(line.trim_start().len(), 2);
        }
    }

    #[test]
    fn test_narrow_terminal_has_no_padding() {
        assert_eq!(status_line(1, true, false), ":)");
        assert_eq!(status_line(0, false, false), ":(");
    }

    #[test]
    fn test_colored_glyphs() {
        let ok = status_line(10, true, true);
        assert_eq!(ok, format!("        {}", with_foreground(":)", Color::Green)));

        let failed = status_line(10, false, true);
        assert_eq!(failed, format!("        {}", with_foreground(":(", Color::Red)));
    }
}
