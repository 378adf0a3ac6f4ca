//! Removal of typesetting artifacts from extracted text.

/// How line breaks are treated by [`sanitize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Line breaks are removed; for table cells and prose.
    SingleLine,
    /// Line breaks are kept; for pseudocode.
    MultiLine,
}

impl Mode {
    /// Characters trimmed from both ends of a sanitized fragment.
    pub(crate) fn trimmed(self) -> &'static [char] {
        match self {
            Mode::SingleLine => &['\t', ' '],
            Mode::MultiLine => &['\r', '\n', '\t', ' '],
        }
    }
}

/// Deletes tabs, non-breaking spaces, soft hyphens and U+2010 hyphens, and
/// in single-line mode carriage returns and newlines as well.
///
/// Extracted cells break words with soft hyphens and line breaks, so these
/// characters are removed rather than replaced by spaces.
pub fn sanitize(text: &str, mode: Mode) -> String {
    text.chars()
        .filter(|&c| match c {
            '\t' | '\u{a0}' | '\u{ad}' | '\u{2010}' => false,
            '\n' | '\r' => mode == Mode::MultiLine,
            _ => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line() {
        assert_eq!(
            sanitize("ASIMD\u{ad}arith,\nba\u{2010}sic\t\r", Mode::SingleLine),
            "ASIMDarith,basic"
        );
        assert_eq!(sanitize("a\u{a0}b", Mode::SingleLine), "ab");
    }

    #[test]
    fn multi_line() {
        assert_eq!(
            sanitize("bits(64) result;\r\n\tX[d] = result;", Mode::MultiLine),
            "bits(64) result;\r\nX[d] = result;"
        );
    }
}
