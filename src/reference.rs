//! Embedded note references (`![[Note#qualifier]]`).
//!
//! Grammar accepted by the scanner:
//!
//! ```text
//! reference      := "![[" ref-body "]]"
//! ref-body       := note-name ( "#" qualifier )?
//! qualifier      := "^" block-id | section-name
//! ```
//!
//! The body ends at the first `]]` after the opening marker and never spans a line break. Nested
//! brackets are not interpreted: `![[a![[b]]` yields the single body `a![[b`.

use std::{fmt, ops::Range};

use serde::{Deserialize, Serialize};

pub const EMBED_OPEN: &str = "![[";
pub const EMBED_CLOSE: &str = "]]";
pub const QUALIFIER_SEPARATOR: char = '#';
pub const BLOCK_MARKER: char = '^';

/// A parsed reference token. At most one of `section` or `block_id` is populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteReference {
    pub note_name: String,
    pub section: Option<String>,
    pub block_id: Option<String>,
}

impl NoteReference {
    pub fn note(name: impl Into<String>) -> Self {
        NoteReference {
            note_name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self.block_id = None;
        self
    }

    pub fn with_block(mut self, block_id: impl Into<String>) -> Self {
        self.block_id = Some(block_id.into());
        self.section = None;
        self
    }
}

impl fmt::Display for NoteReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{EMBED_OPEN}{}", self.note_name)?;
        if let Some(section) = &self.section {
            write!(f, "{QUALIFIER_SEPARATOR}{section}")?;
        } else if let Some(block_id) = &self.block_id {
            write!(f, "{QUALIFIER_SEPARATOR}{BLOCK_MARKER}{block_id}")?;
        }
        write!(f, "{EMBED_CLOSE}")
    }
}

/// One embed marker found in a source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReference<'a> {
    /// Byte span of the whole token, delimiters included.
    pub span: Range<usize>,
    /// The token exactly as written, e.g. `![[Note#Heading]]`.
    pub matched: &'a str,
    /// The text between the delimiters, e.g. `Note#Heading`.
    pub body: &'a str,
}

impl RawReference<'_> {
    pub fn parse(&self) -> NoteReference {
        parse_note_reference(self.body)
    }
}

/// Lazy scanner over the embed tokens of a text. [ReferenceScanner::restart] rewinds it to the
/// first token.
#[derive(Debug, Clone)]
pub struct ReferenceScanner<'a> {
    source: &'a str,
    cursor: usize,
}

impl<'a> ReferenceScanner<'a> {
    pub fn new(source: &'a str) -> Self {
        ReferenceScanner { source, cursor: 0 }
    }

    /// Rewind to the beginning of the source.
    pub fn restart(&mut self) {
        self.cursor = 0;
    }
}

impl<'a> Iterator for ReferenceScanner<'a> {
    type Item = RawReference<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.source.len() {
            let rest = &self.source[self.cursor..];
            let open = self.cursor + rest.find(EMBED_OPEN)?;
            let body_start = open + EMBED_OPEN.len();
            let tail = &self.source[body_start..];
            let line_end = tail.find('\n').unwrap_or(tail.len());

            match tail[..line_end].find(EMBED_CLOSE) {
                Some(close) => {
                    let body_end = body_start + close;
                    let end = body_end + EMBED_CLOSE.len();
                    self.cursor = end;
                    return Some(RawReference {
                        span: open..end,
                        matched: &self.source[open..end],
                        body: &self.source[body_start..body_end],
                    });
                }
                // Unterminated on this line: try the next opening marker after this one.
                None => self.cursor = open + 1,
            }
        }
        None
    }
}

pub fn scan_references(source: &str) -> ReferenceScanner<'_> {
    ReferenceScanner::new(source)
}

/// Split a reference body into note name and optional qualifier. Never fails; an empty name is
/// passed through and simply won't be located.
pub fn parse_note_reference(raw: &str) -> NoteReference {
    let trimmed = raw.trim();
    match trimmed.split_once(QUALIFIER_SEPARATOR) {
        None => NoteReference::note(trimmed),
        Some((name, qualifier)) => {
            let reference = NoteReference::note(name.trim());
            let qualifier = qualifier.trim();
            match qualifier.strip_prefix(BLOCK_MARKER) {
                Some(block_id) => reference.with_block(block_id.trim()),
                None => reference.with_section(qualifier),
            }
        }
    }
}

/// Bare note names embedded in `content`, de-duplicated in first-occurrence order.
pub fn extract_note_names(content: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for raw in scan_references(content) {
        let name = raw.parse().note_name;
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_note() {
        assert_eq!(parse_note_reference("  Intro  "), NoteReference::note("Intro"));
    }

    #[test]
    fn test_parse_block_reference() {
        let parsed = parse_note_reference("Note#^abc123");
        assert_eq!(parsed.note_name, "Note");
        assert_eq!(parsed.block_id.as_deref(), Some("abc123"));
        assert_eq!(parsed.section, None);
    }

    #[test]
    fn test_parse_section_reference() {
        let parsed = parse_note_reference("Note#Heading");
        assert_eq!(parsed.note_name, "Note");
        assert_eq!(parsed.section.as_deref(), Some("Heading"));
        assert_eq!(parsed.block_id, None);
    }

    #[test]
    fn test_parse_trims_around_separator() {
        let parsed = parse_note_reference(" My Note # Some Heading ");
        assert_eq!(parsed.note_name, "My Note");
        assert_eq!(parsed.section.as_deref(), Some("Some Heading"));
    }

    #[test]
    fn test_parse_empty_name_passes_through() {
        assert_eq!(parse_note_reference("   ").note_name, "");
        let parsed = parse_note_reference("#Heading");
        assert_eq!(parsed.note_name, "");
        assert_eq!(parsed.section.as_deref(), Some("Heading"));
    }

    #[test]
    fn test_parse_splits_on_first_separator_only() {
        let parsed = parse_note_reference("Note#Heading #2");
        assert_eq!(parsed.note_name, "Note");
        assert_eq!(parsed.section.as_deref(), Some("Heading #2"));
    }

    #[test]
    fn test_scan_finds_tokens_with_spans() {
        let text = "See ![[Intro]] and ![[Other#Part]].";
        let found: Vec<_> = scan_references(text).collect();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].matched, "![[Intro]]");
        assert_eq!(found[0].body, "Intro");
        assert_eq!(&text[found[0].span.clone()], "![[Intro]]");
        assert_eq!(found[1].body, "Other#Part");
    }

    #[test]
    fn test_scan_ignores_plain_wikilinks() {
        let found: Vec<_> = scan_references("[[Linked]] but not embedded").collect();
        assert!(found.is_empty());
    }

    #[test]
    fn test_scan_stops_at_first_close() {
        let found: Vec<_> = scan_references("![[a![[b]]]]").collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].body, "a![[b");
    }

    #[test]
    fn test_scan_does_not_cross_lines() {
        let text = "![[Broken\n![[Fine]]";
        let found: Vec<_> = scan_references(text).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].body, "Fine");
    }

    #[test]
    fn test_scan_empty_body() {
        let found: Vec<_> = scan_references("![[]]").collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].parse().note_name, "");
    }

    #[test]
    fn test_scanner_is_restartable() {
        let mut scanner = scan_references("![[A]] ![[B]]");
        assert_eq!(scanner.by_ref().count(), 2);
        assert!(scanner.next().is_none());
        scanner.restart();
        assert_eq!(scanner.next().map(|r| r.body), Some("A"));
    }

    #[test]
    fn test_scan_handles_multibyte_text() {
        let found: Vec<_> = scan_references("café ![[Résumé#Über]] ✓").collect();
        assert_eq!(found.len(), 1);
        let parsed = found[0].parse();
        assert_eq!(parsed.note_name, "Résumé");
        assert_eq!(parsed.section.as_deref(), Some("Über"));
    }

    #[test]
    fn test_extract_note_names_dedups_in_order() {
        let text = "![[B]] ![[A#x]] ![[B#^id]] ![[C]] ![[A]]";
        assert_eq!(extract_note_names(text), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_display_round_trips_the_token_shape() {
        assert_eq!(
            NoteReference::note("N").with_block("b1").to_string(),
            "![[N#^b1]]"
        );
        assert_eq!(
            NoteReference::note("N").with_section("H").to_string(),
            "![[N#H]]"
        );
    }
}
