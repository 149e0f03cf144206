// Notation text analysis - pulls titles and part names out of ABC files
// Everything in here is pure: same text in, same answer out, no file access

mod encoding;
pub mod parser;

pub use encoding::TextEncoding;
pub use parser::{AbcParser, NotationParser, ParsedSong};

use serde::Serialize;

/// Label used when a file names no instrument at all.
pub const UNKNOWN_INSTRUMENT: &str = "Unknown";

const TITLE_MARKER: &str = "T:";
const PART_NAME_DIRECTIVE: &str = "%%part-name";

/// What a single source line means to the set list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// `T:` line, carrying the text after the marker (leading whitespace dropped)
    Title(&'a str),
    /// `%%part-name <name>` directive
    PartName(&'a str),
    Other,
}

/// Classify one line of source text.
pub fn classify_line(line: &str) -> LineKind<'_> {
    if let Some(rest) = line.strip_prefix(TITLE_MARKER) {
        return match title_text(rest) {
            Some(text) => LineKind::Title(text),
            None => LineKind::Other,
        };
    }

    let line = line.strip_suffix('\r').unwrap_or(line);
    if let Some(rest) = line.strip_prefix(PART_NAME_DIRECTIVE) {
        // needs at least one separating space: "%%part-names" is a different directive
        if rest.starts_with(char::is_whitespace) {
            let name = rest.trim_start();
            if !name.is_empty() {
                return LineKind::PartName(name);
            }
        }
    }

    LineKind::Other
}

/// Text of a title after `T:`: leading whitespace is skipped, but at least one
/// char that isn't `\r` must follow, giving back the last skipped blank when
/// nothing else is left. The text stops at the first `\r`. So `T:   ` is a
/// title of one space, while a bare `T:` or `T:\r` is no title at all.
fn title_text(rest: &str) -> Option<&str> {
    let body = rest.trim_start();
    let start = if body.starts_with(|c: char| c != '\r') {
        rest.len() - body.len()
    } else {
        let skipped = &rest[..rest.len() - body.len()];
        skipped.char_indices().rev().find(|&(_, c)| c != '\r')?.0
    };

    let text = &rest[start..];
    Some(text.split('\r').next().unwrap_or(text))
}

/// Split content into lines the way a line reader does: `\n` terminates a line,
/// a final unterminated line still counts, and there is no phantom empty line
/// after a trailing newline. Any `\r` stays on the line.
pub fn source_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .split_inclusive('\n')
        .map(|line| line.strip_suffix('\n').unwrap_or(line))
}

/// [`source_lines`] over raw file bytes. Yields the same number of lines as
/// the decoded text, so title line numbers index into either.
pub fn raw_lines(content: &[u8]) -> impl Iterator<Item = &[u8]> {
    content
        .split_inclusive(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\n").unwrap_or(line))
}

/// One `T:` line of a song, with its edit state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleLine {
    full_text: String,
    original_full_text: String,
    instrument: String,
    /// zero-based line number of the `T:` line inside the imported content
    source_line: usize,
}

impl TitleLine {
    pub fn new(source_line: usize, text: &str) -> Self {
        Self {
            full_text: text.to_string(),
            original_full_text: text.to_string(),
            instrument: instrument_label(text).unwrap_or_default(),
            source_line,
        }
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn original_full_text(&self) -> &str {
        &self.original_full_text
    }

    /// Instrument shown for this part, empty when the text names none
    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn source_line(&self) -> usize {
        self.source_line
    }

    pub fn title_edited(&self) -> bool {
        self.full_text != self.original_full_text
    }

    /// Replace the text and refresh the instrument label from it.
    pub(crate) fn set_text(&mut self, text: &str) {
        self.full_text = text.to_string();
        self.instrument = instrument_label(text).unwrap_or_default();
    }
}

/// The per-line instrument: the first `[...]` span, as long as it is not empty
/// and holds no colon (time codes like `[4:22]` are not instruments).
pub fn instrument_label(text: &str) -> Option<String> {
    let open = text.find('[')?;
    let inner = &text[open + 1..];
    let close = inner.find(']')?;
    let candidate = &inner[..close];

    if candidate.is_empty() || candidate.contains(':') {
        None
    } else {
        Some(candidate.to_string())
    }
}

/// Every `[...]` and `(...)` span in a title, left to right, without overlap.
/// An opener with no matching closer is skipped.
fn bracketed_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        let Some(offset) = rest.find(['[', '(']) else {
            break;
        };
        let open = pos + offset;
        let closer = if text.as_bytes()[open] == b'[' { ']' } else { ')' };

        match text[open + 1..].find(closer) {
            Some(len) => {
                spans.push(&text[open + 1..open + 1 + len]);
                pos = open + 1 + len + 1;
            }
            None => pos = open + 1,
        }
    }

    spans
}

/// One [`TitleLine`] per title-marker line, in file order.
pub fn extract_title_lines(content: &str) -> Vec<TitleLine> {
    source_lines(content)
        .enumerate()
        .filter_map(|(index, line)| match classify_line(line) {
            LineKind::Title(text) => Some(TitleLine::new(index, text)),
            _ => None,
        })
        .collect()
}

/// Import-time instrument summary for a whole file.
///
/// Collects bracketed and parenthesised spans from every title line plus any
/// `%%part-name` values, dropping repeats and anything with a colon. Never empty:
/// falls back to [`UNKNOWN_INSTRUMENT`].
pub fn extract_instruments(content: &str) -> Vec<String> {
    let mut instruments: Vec<String> = Vec::new();
    let mut push_unique = |candidate: &str| {
        if !instruments.iter().any(|known| known == candidate) {
            instruments.push(candidate.to_string());
        }
    };

    for line in source_lines(content) {
        match classify_line(line) {
            LineKind::Title(text) => {
                for span in bracketed_spans(text) {
                    if !span.is_empty() && !span.contains(':') {
                        push_unique(span);
                    }
                }
            }
            LineKind::PartName(name) => push_unique(name),
            LineKind::Other => {}
        }
    }

    if instruments.is_empty() {
        instruments.push(UNKNOWN_INSTRUMENT.to_string());
    }
    instruments
}

/// Instrument list rebuilt after a title line edit: every non-empty per-line
/// label in title-line order. Unlike [`extract_instruments`] this keeps repeats.
pub fn collect_line_instruments(title_lines: &[TitleLine]) -> Vec<String> {
    title_lines
        .iter()
        .filter(|line| !line.instrument().is_empty())
        .map(|line| line.instrument().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BAND_SONG: &str = "X:1\r\nT: Concerning Hobbits [Lute] (2:45)\r\nK:C\r\nabc|\r\n\
X:2\r\nT: Concerning Hobbits [Flute] (Part 2)\r\n%%part-name Flute\r\nK:C\r\ncde|\r\n";

    #[test]
    fn test_classify_line() {
        assert_eq!(classify_line("T: Song"), LineKind::Title("Song"));
        assert_eq!(classify_line("T:Song [Lute]\r"), LineKind::Title("Song [Lute]"));
        assert_eq!(classify_line("T:"), LineKind::Other);
        assert_eq!(classify_line("T:\r"), LineKind::Other);
        assert_eq!(classify_line(" T: indented"), LineKind::Other);
        assert_eq!(classify_line("%%part-name Harp"), LineKind::PartName("Harp"));
        assert_eq!(classify_line("%%part-nameHarp"), LineKind::Other);
        assert_eq!(classify_line("%%part-name   "), LineKind::Other);
        assert_eq!(classify_line("K:Dm"), LineKind::Other);
    }

    #[test]
    fn test_blank_title_lines_still_count() {
        // whitespace after T: is kept as a one-char title so the line stays a part
        assert_eq!(classify_line("T:   "), LineKind::Title(" "));
        assert_eq!(classify_line("T: \r"), LineKind::Title(" "));
        assert_eq!(classify_line("T:\t"), LineKind::Title("\t"));
        assert_eq!(classify_line("T:A\rB"), LineKind::Title("A"));

        let lines = extract_title_lines("X:1\r\nT:Song [Lute]\r\nX:2\r\nT: \r\nK:C\r\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].full_text(), " ");
        assert_eq!(lines[1].source_line(), 3);
        assert_eq!(lines[1].instrument(), "");
    }

    #[test]
    fn test_raw_lines_line_up_with_text_lines() {
        let raw: &[u8] = b"T:Caf\xE9\r\nK:C\n\nCDEF|";
        let text = TextEncoding::Latin1.decode(raw);
        assert_eq!(raw_lines(raw).count(), source_lines(&text).count());
        assert_eq!(raw_lines(raw).next(), Some(&b"T:Caf\xE9\r"[..]));
        assert_eq!(raw_lines(b"").count(), 0);
    }

    #[test]
    fn test_source_lines_match_line_reader() {
        assert_eq!(source_lines("").count(), 0);
        assert_eq!(source_lines("a\nb\n").collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(source_lines("a\nb").collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(source_lines("a\n\n").collect::<Vec<_>>(), vec!["a", ""]);
        assert_eq!(source_lines("a\r\nb").collect::<Vec<_>>(), vec!["a\r", "b"]);
    }

    #[test]
    fn test_instrument_label() {
        assert_eq!(instrument_label("Song [Lute]"), Some("Lute".to_string()));
        assert_eq!(instrument_label("Song [4:22] [Lute]"), None);
        assert_eq!(instrument_label("Song [] [Lute]"), None);
        assert_eq!(instrument_label("Song (Lute)"), None);
        assert_eq!(instrument_label("Song [Lute"), None);
    }

    #[test]
    fn test_extract_title_lines() {
        let lines = extract_title_lines(BAND_SONG);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].full_text(), "Concerning Hobbits [Lute] (2:45)");
        assert_eq!(lines[0].instrument(), "Lute");
        assert_eq!(lines[0].source_line(), 1);
        assert_eq!(lines[1].instrument(), "Flute");
        assert_eq!(lines[1].source_line(), 5);
        assert!(lines.iter().all(|line| !line.title_edited()));
    }

    #[test]
    fn test_extract_instruments_dedups_and_skips_time_codes() {
        let instruments = extract_instruments(BAND_SONG);
        assert_eq!(instruments, vec!["Lute", "Flute", "Part 2"]);
    }

    #[test]
    fn test_extract_instruments_defaults_to_unknown() {
        assert_eq!(extract_instruments("X:1\nT:Plain\nK:C\nabc\n"), vec![UNKNOWN_INSTRUMENT]);
        assert_eq!(extract_instruments(""), vec![UNKNOWN_INSTRUMENT]);
    }

    #[test]
    fn test_unclosed_bracket_does_not_hide_later_spans() {
        let instruments = extract_instruments("T:Song [oops (Harp)\n");
        assert_eq!(instruments, vec!["Harp"]);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        assert_eq!(extract_title_lines(BAND_SONG), extract_title_lines(BAND_SONG));
        assert_eq!(extract_instruments(BAND_SONG), extract_instruments(BAND_SONG));
    }

    #[test]
    fn test_set_text_refreshes_instrument_and_edit_flag() {
        let mut line = TitleLine::new(0, "Song [Lute]");
        line.set_text("Song [Harp]");
        assert_eq!(line.instrument(), "Harp");
        assert!(line.title_edited());
        assert_eq!(line.original_full_text(), "Song [Lute]");

        line.set_text("Song [Lute]");
        assert!(!line.title_edited());
    }

    #[test]
    fn test_line_rebuild_keeps_repeats() {
        let lines = vec![
            TitleLine::new(0, "A [Lute]"),
            TitleLine::new(3, "B"),
            TitleLine::new(6, "C [Lute]"),
        ];
        assert_eq!(collect_line_instruments(&lines), vec!["Lute", "Lute"]);
    }
}
