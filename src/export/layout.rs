//! Page layout: blocks → positioned lines on fixed-size pages.
//!
//! Coordinates are PDF points with the origin at the bottom-left corner.
//! Widths are estimated from average glyph widths of the standard fonts, so
//! wrapping is by character count within each fixed-width text box.

use chrono::{DateTime, Utc};

use super::markup::{Block, parse_blocks};
use crate::artifact::models::Artifact;

pub const A4_WIDTH: f32 = 595.28;
pub const A4_HEIGHT: f32 = 841.89;

const MARGIN_X: f32 = 56.0;
const HEADER_Y: f32 = A4_HEIGHT - 36.0;
const BODY_TOP: f32 = A4_HEIGHT - 72.0;
const BODY_BOTTOM: f32 = 64.0;
const FOOTER_Y: f32 = 32.0;

const BODY_SIZE: f32 = 10.5;
const CODE_SIZE: f32 = 9.0;
const RUNNING_SIZE: f32 = 8.5;
const LINE_SPACING: f32 = 1.4;
const LIST_INDENT: f32 = 14.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Font {
    Regular,
    Bold,
    Mono,
}

impl Font {
    /// Average advance width as a fraction of the font size.
    fn char_width(&self) -> f32 {
        match self {
            Font::Regular => 0.5,
            Font::Bold => 0.55,
            Font::Mono => 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub font: Font,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub number: usize,
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    pub width: f32,
    pub height: f32,
    pub pages: Vec<Page>,
}

/// Extra context printed on the cover block and in the running header.
#[derive(Debug, Clone, Default)]
pub struct ExportMetadata {
    pub task_title: Option<String>,
    pub task_readable_id: Option<String>,
    pub repository: Option<String>,
    pub author: Option<String>,
}

fn chars_fitting(width: f32, size: f32, font: Font) -> usize {
    ((width / (size * font.char_width())).floor() as usize).max(8)
}

fn text_width(text: &str, size: f32, font: Font) -> f32 {
    text.chars().count() as f32 * size * font.char_width()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// Accumulates body lines and breaks pages when the next line does not fit.
struct Flow {
    pages: Vec<Vec<Line>>,
    y: f32,
}

impl Flow {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: BODY_TOP,
        }
    }

    fn gap(&mut self, points: f32) {
        // A gap at the top of a page is dropped.
        if self.y < BODY_TOP {
            self.y -= points;
        }
    }

    fn push(&mut self, text: String, x: f32, size: f32, font: Font) {
        let advance = size * LINE_SPACING;
        if self.y - advance < BODY_BOTTOM {
            self.pages.push(Vec::new());
            self.y = BODY_TOP;
        }
        self.y -= advance;
        if let Some(page) = self.pages.last_mut() {
            page.push(Line {
                text,
                x,
                y: self.y,
                size,
                font,
            });
        }
    }

    fn wrapped(&mut self, text: &str, x: f32, size: f32, font: Font) {
        let width = A4_WIDTH - MARGIN_X - x;
        for part in textwrap::wrap(text, chars_fitting(width, size, font)) {
            self.push(part.into_owned(), x, size, font);
        }
    }
}

fn heading_size(level: u8) -> f32 {
    match level {
        1 => 16.0,
        2 => 13.5,
        _ => 12.0,
    }
}

/// Lay out an artifact as a paginated document.
pub fn layout(artifact: &Artifact, meta: &ExportMetadata) -> Document {
    let title = artifact.kind.title().to_string();
    let mut flow = Flow::new();

    // Cover block
    flow.wrapped(&title, MARGIN_X, 18.0, Font::Bold);
    flow.gap(4.0);
    for detail in cover_details(artifact, meta) {
        flow.wrapped(&detail, MARGIN_X, 9.5, Font::Regular);
    }
    flow.gap(12.0);

    for block in parse_blocks(&artifact.content) {
        match block {
            Block::Heading { level, text } => {
                flow.gap(8.0);
                flow.wrapped(&text, MARGIN_X, heading_size(level), Font::Bold);
                flow.gap(2.0);
            }
            Block::Paragraph(text) => {
                flow.wrapped(&text, MARGIN_X, BODY_SIZE, Font::Regular);
                flow.gap(5.0);
            }
            Block::ListItem {
                marker,
                depth,
                text,
            } => {
                let x = MARGIN_X + LIST_INDENT * depth as f32;
                let text_x = x + LIST_INDENT;
                let width = A4_WIDTH - MARGIN_X - text_x;
                let wrapped = textwrap::wrap(&text, chars_fitting(width, BODY_SIZE, Font::Regular));
                for (i, part) in wrapped.into_iter().enumerate() {
                    if i == 0 {
                        flow.push(marker.clone(), x, BODY_SIZE, Font::Regular);
                        // Marker and first line share a baseline.
                        let y = flow.y;
                        if let Some(page) = flow.pages.last_mut() {
                            page.push(Line {
                                text: part.into_owned(),
                                x: text_x,
                                y,
                                size: BODY_SIZE,
                                font: Font::Regular,
                            });
                        }
                    } else {
                        flow.push(part.into_owned(), text_x, BODY_SIZE, Font::Regular);
                    }
                }
                flow.gap(2.0);
            }
            Block::Code(lines) => {
                flow.gap(2.0);
                let x = MARGIN_X + 8.0;
                let max = chars_fitting(A4_WIDTH - MARGIN_X - x, CODE_SIZE, Font::Mono);
                for line in lines {
                    if line.is_empty() {
                        flow.push(String::new(), x, CODE_SIZE, Font::Mono);
                        continue;
                    }
                    let chars: Vec<char> = line.chars().collect();
                    for chunk in chars.chunks(max) {
                        flow.push(chunk.iter().collect(), x, CODE_SIZE, Font::Mono);
                    }
                }
                flow.gap(6.0);
            }
            Block::Rule => {
                flow.gap(4.0);
                let width = A4_WIDTH - 2.0 * MARGIN_X;
                let dashes = chars_fitting(width, BODY_SIZE, Font::Regular);
                flow.push("_".repeat(dashes), MARGIN_X, BODY_SIZE, Font::Regular);
                flow.gap(6.0);
            }
        }
    }

    let total = flow.pages.len();
    let header_right = format!("{} | {}", artifact.kind.label(), artifact.key.fragment());
    let footer_left = format!(
        "Generated {}",
        artifact.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let header_left = truncate(
        meta.task_title.as_deref().unwrap_or(&title),
        chars_fitting((A4_WIDTH - 2.0 * MARGIN_X) / 2.0, RUNNING_SIZE, Font::Bold),
    );

    let pages = flow
        .pages
        .into_iter()
        .enumerate()
        .map(|(i, body)| {
            let number = i + 1;
            let footer_right = format!("Page {} of {}", number, total);
            let mut lines = vec![
                Line {
                    text: header_left.clone(),
                    x: MARGIN_X,
                    y: HEADER_Y,
                    size: RUNNING_SIZE,
                    font: Font::Bold,
                },
                right_aligned(&header_right, HEADER_Y, Font::Regular),
            ];
            lines.extend(body);
            lines.push(Line {
                text: footer_left.clone(),
                x: MARGIN_X,
                y: FOOTER_Y,
                size: RUNNING_SIZE,
                font: Font::Regular,
            });
            lines.push(right_aligned(&footer_right, FOOTER_Y, Font::Regular));
            Page { number, lines }
        })
        .collect();

    Document {
        title,
        author: meta.author.clone(),
        created_at: artifact.generated_at,
        width: A4_WIDTH,
        height: A4_HEIGHT,
        pages,
    }
}

fn right_aligned(text: &str, y: f32, font: Font) -> Line {
    Line {
        text: text.to_string(),
        x: A4_WIDTH - MARGIN_X - text_width(text, RUNNING_SIZE, font),
        y,
        size: RUNNING_SIZE,
        font,
    }
}

fn cover_details(artifact: &Artifact, meta: &ExportMetadata) -> Vec<String> {
    let mut details = Vec::new();
    match (&meta.task_readable_id, &meta.task_title) {
        (Some(id), Some(title)) => details.push(format!("Task: {} {}", id, title)),
        (Some(id), None) => details.push(format!("Task: {}", id)),
        (None, Some(title)) => details.push(format!("Task: {}", title)),
        (None, None) => {
            if let Some(id) = artifact.key.task_id {
                details.push(format!("Task: #{}", id));
            }
        }
    }
    if let Some(sha) = &artifact.key.commit_sha {
        details.push(format!("Commit: {}", sha));
    }
    if let Some(repo) = &meta.repository {
        details.push(format!("Repository: {}", repo));
    }
    details.push(format!(
        "Generated: {}{}",
        artifact.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        if artifact.cached { " (cached)" } else { "" }
    ));
    if let Some(depth) = artifact.depth {
        details.push(format!("Depth: {}", depth));
    }
    details
}
