//! Markdown-ish markup → plain text blocks.
//!
//! Generated artifacts are markdown. The PDF layer only knows plain runs of
//! text in a handful of styles, so structure is turned into typed blocks and
//! inline markers are removed while the words themselves are kept.

use std::sync::LazyLock;

use regex::Regex;

static HEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s{0,3}(#{1,6})\s+(.*?)\s*#*\s*$").unwrap());
static BULLET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)[-*+]\s+(.*)$").unwrap());
static NUMBERED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)(\d+)[.)]\s+(.*)$").unwrap());
static QUOTE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*>\s?(.*)$").unwrap());
static RULE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:-{3,}|\*{3,}|_{3,})\s*$").unwrap());
static TABLE_SEPARATOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\|?\s*:?-{2,}:?\s*(\|\s*:?-{2,}:?\s*)*\|?\s*$").unwrap());

static IMAGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").unwrap());
static LINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").unwrap());
static CODE_SPAN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]*)`").unwrap());
static BOLD_STAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static BOLD_UNDERSCORE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__(.+?)__").unwrap());
static STRIKE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"~~(.+?)~~").unwrap());
static ITALIC_STAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\s][^*]*)\*").unwrap());
static ITALIC_UNDERSCORE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b_([^_]+)_\b").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    ListItem {
        marker: String,
        depth: usize,
        text: String,
    },
    Code(Vec<String>),
    Rule,
}

/// Remove inline markers (bold, italic, code spans, links, images,
/// strikethrough) keeping the enclosed text.
pub fn strip_inline(text: &str) -> String {
    let text = IMAGE_REGEX.replace_all(text, "$1");
    let text = LINK_REGEX.replace_all(&text, "$1");
    let text = CODE_SPAN_REGEX.replace_all(&text, "$1");
    let text = BOLD_STAR_REGEX.replace_all(&text, "$1");
    let text = BOLD_UNDERSCORE_REGEX.replace_all(&text, "$1");
    let text = STRIKE_REGEX.replace_all(&text, "$1");
    let text = ITALIC_STAR_REGEX.replace_all(&text, "$1");
    let text = ITALIC_UNDERSCORE_REGEX.replace_all(&text, "$1");
    text.into_owned()
}

/// Split markup into blocks. Consecutive text lines form one paragraph.
pub fn parse_blocks(markup: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();
    let mut code: Option<Vec<String>> = None;

    fn flush(paragraph: &mut Vec<String>, blocks: &mut Vec<Block>) {
        if !paragraph.is_empty() {
            blocks.push(Block::Paragraph(paragraph.join(" ")));
            paragraph.clear();
        }
    }

    for raw in markup.lines() {
        let line = raw.trim_end();

        if line.trim_start().starts_with("```") {
            match code.take() {
                Some(lines) => blocks.push(Block::Code(lines)),
                None => {
                    flush(&mut paragraph, &mut blocks);
                    code = Some(Vec::new());
                }
            }
            continue;
        }
        if let Some(lines) = code.as_mut() {
            lines.push(line.replace('\t', "    "));
            continue;
        }

        if line.trim().is_empty() {
            flush(&mut paragraph, &mut blocks);
            continue;
        }
        if RULE_REGEX.is_match(line) {
            flush(&mut paragraph, &mut blocks);
            blocks.push(Block::Rule);
            continue;
        }
        if let Some(caps) = HEADING_REGEX.captures(line) {
            flush(&mut paragraph, &mut blocks);
            blocks.push(Block::Heading {
                level: caps[1].len() as u8,
                text: strip_inline(&caps[2]),
            });
            continue;
        }
        if let Some(caps) = BULLET_REGEX.captures(line) {
            flush(&mut paragraph, &mut blocks);
            blocks.push(Block::ListItem {
                marker: "-".to_string(),
                depth: caps[1].len() / 2,
                text: strip_inline(&caps[2]),
            });
            continue;
        }
        if let Some(caps) = NUMBERED_REGEX.captures(line) {
            flush(&mut paragraph, &mut blocks);
            blocks.push(Block::ListItem {
                marker: format!("{}.", &caps[2]),
                depth: caps[1].len() / 2,
                text: strip_inline(&caps[3]),
            });
            continue;
        }
        if line.trim_start().starts_with('|') {
            flush(&mut paragraph, &mut blocks);
            if !TABLE_SEPARATOR_REGEX.is_match(line) {
                let cells: Vec<String> = line
                    .trim()
                    .trim_matches('|')
                    .split('|')
                    .map(|c| strip_inline(c.trim()))
                    .collect();
                blocks.push(Block::Paragraph(cells.join("   ")));
            }
            continue;
        }
        if let Some(caps) = QUOTE_REGEX.captures(line) {
            paragraph.push(strip_inline(caps[1].trim()));
            continue;
        }
        paragraph.push(strip_inline(line.trim()));
    }

    // An unterminated fence still yields its lines.
    if let Some(lines) = code {
        flush(&mut paragraph, &mut blocks);
        blocks.push(Block::Code(lines));
    }
    flush(&mut paragraph, &mut blocks);
    blocks
}
