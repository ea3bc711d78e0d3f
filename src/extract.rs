//! Narrowing a note's text before it is embedded.
//!
//! Every function here is total: a missing section or block is reported as `None`, never as an
//! error, so callers decide on their own fallback.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use pulldown_cmark::{Event as MdEvent, Options, Parser as MdParser, Tag as MdTag};
use regex::Regex;

const FRONTMATTER_FENCE: &str = "---";
const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

/// Trailing `^block-id` anchor, separated from the block text by whitespace (or alone on a line).
static BLOCK_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)\^([A-Za-z0-9_-]+)\s*$").expect("block anchor pattern is valid")
});

static LIST_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s").expect("list item pattern is valid")
});

static ATX_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}#{1,6}(?:\s|$)").expect("heading pattern is valid"));

fn notelink_md_options() -> Options {
    let mut md_options = Options::empty();
    md_options.insert(Options::ENABLE_FOOTNOTES);
    md_options.insert(Options::ENABLE_GFM);
    md_options.insert(Options::ENABLE_STRIKETHROUGH);
    md_options.insert(Options::ENABLE_TABLES);
    md_options.insert(Options::ENABLE_TASKLISTS);
    md_options.insert(Options::ENABLE_WIKILINKS);
    md_options.insert(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);
    md_options
}

/// Strip a single leading `---` delimited frontmatter block. Content without one, or with an
/// unterminated fence, is returned unchanged.
pub fn remove_frontmatter(content: &str) -> &str {
    let mut lines = content.split_inclusive('\n');
    match lines.next() {
        Some(first) if first.trim_end() == FRONTMATTER_FENCE && first.ends_with('\n') => {}
        _ => return content,
    }

    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let line_end = offset + line.len();
        if offset > 0 && line.trim_end() == FRONTMATTER_FENCE {
            return &content[line_end..];
        }
        offset = line_end;
    }
    content
}

/// Remove every `<!-- ... -->` span, multi-line ones included. An unclosed comment opener is left
/// in place along with everything after it.
pub fn remove_html_comments(content: &str) -> Cow<'_, str> {
    if !content.contains(COMMENT_OPEN) {
        return Cow::Borrowed(content);
    }

    let mut output = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(start) = rest.find(COMMENT_OPEN) {
        let after_open = start + COMMENT_OPEN.len();
        match rest[after_open..].find(COMMENT_CLOSE) {
            Some(close) => {
                output.push_str(&rest[..start]);
                rest = &rest[after_open + close + COMMENT_CLOSE.len()..];
            }
            None => break,
        }
    }
    output.push_str(rest);
    Cow::Owned(output)
}

/// Frontmatter removal followed by comment removal.
pub fn clean_content(content: &str) -> String {
    remove_html_comments(remove_frontmatter(content)).into_owned()
}

#[derive(Debug)]
struct HeadingSpan {
    level: usize,
    line_start: usize,
    text: String,
}

fn line_start_of(content: &str, offset: usize) -> usize {
    content[..offset].rfind('\n').map(|idx| idx + 1).unwrap_or(0)
}

/// Heading text as written in the source: ATX markers and any closing `#` run removed, setext
/// underline dropped. Inline markup is kept.
fn heading_source_text(source: &str) -> String {
    let source = source.trim_end();
    let first_line = source.lines().next().unwrap_or_default();
    if ATX_HEADING.is_match(first_line) {
        let rest = first_line.trim_start().trim_start_matches('#').trim_end();
        let without_closing = rest.trim_end_matches('#');
        if without_closing.is_empty() {
            return String::new();
        }
        if without_closing.len() < rest.len() && without_closing.ends_with([' ', '\t']) {
            return without_closing.trim().to_string();
        }
        return rest.trim().to_string();
    }

    let mut lines: Vec<&str> = source.lines().collect();
    if lines.len() > 1
        && lines
            .last()
            .map(|underline| underline.trim().chars().all(|c| c == '=' || c == '-'))
            .unwrap_or(false)
    {
        lines.pop();
    }
    lines
        .iter()
        .map(|line| line.trim())
        .collect::<Vec<_>>()
        .join(" ")
}

fn collect_headings(content: &str) -> Vec<HeadingSpan> {
    MdParser::new_ext(content, notelink_md_options())
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            MdEvent::Start(MdTag::Heading { level, .. }) => Some(HeadingSpan {
                level: level as usize,
                line_start: line_start_of(content, range.start),
                text: heading_source_text(&content[range]),
            }),
            _ => None,
        })
        .collect()
}

/// The heading whose text, as written (inline markup included), matches `heading_text`
/// case-insensitively, together with everything up to the next heading of the same or a higher
/// level.
pub fn extract_section_content(content: &str, heading_text: &str) -> Option<String> {
    let wanted = heading_text.trim().to_lowercase();
    let headings = collect_headings(content);

    let (idx, found) = headings
        .iter()
        .enumerate()
        .find(|(_, heading)| heading.text.trim().to_lowercase() == wanted)?;

    let end = headings[idx + 1..]
        .iter()
        .find(|next| next.level <= found.level)
        .map(|next| next.line_start)
        .unwrap_or(content.len());

    Some(content[found.line_start..end].trim_end().to_string())
}

fn anchor_id(line: &str) -> Option<&str> {
    BLOCK_ANCHOR
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn strip_anchor(line: &str) -> &str {
    match BLOCK_ANCHOR.find(line) {
        Some(m) => line[..m.start()].trim_end(),
        None => line,
    }
}

fn is_block_boundary(line: &str) -> bool {
    line.trim().is_empty() || ATX_HEADING.is_match(line) || LIST_ITEM.is_match(line)
}

/// The line or paragraph tagged with `^block_id`, anchor removed.
///
/// A list item or heading yields just its own line. A paragraph yields all of its contiguous non-blank lines
/// up to the anchored one. An anchor standing alone on a line refers to the block right above it.
pub fn extract_block_content(content: &str, block_id: &str) -> Option<String> {
    let lines: Vec<&str> = content.lines().collect();
    let anchor_idx = lines
        .iter()
        .position(|line| anchor_id(line) == Some(block_id))?;
    let anchor_line = lines[anchor_idx];
    let stripped = strip_anchor(anchor_line);

    if LIST_ITEM.is_match(anchor_line) || ATX_HEADING.is_match(anchor_line) {
        return Some(stripped.to_string());
    }

    let mut end = anchor_idx;
    let mut block: Vec<&str> = Vec::new();
    if stripped.trim().is_empty() {
        // Standalone anchor: skip back over blank lines to the block it labels.
        while end > 0 && lines[end - 1].trim().is_empty() {
            end -= 1;
        }
        if end == 0 {
            return None;
        }
        if LIST_ITEM.is_match(lines[end - 1]) || ATX_HEADING.is_match(lines[end - 1]) {
            return Some(lines[end - 1].trim_end().to_string());
        }
    } else {
        block.push(stripped);
    }

    let mut start = end;
    while start > 0 && !is_block_boundary(lines[start - 1]) {
        start -= 1;
    }
    let mut paragraph: Vec<&str> = lines[start..end].to_vec();
    paragraph.extend(block);

    let text = paragraph.join("\n");
    if text.trim().is_empty() {
        None
    } else {
        Some(text.trim_end().to_string())
    }
}
