//! Markdown to Notion-style block conversion.
//!
//! The converter understands the small markdown subset an LLM summary uses:
//! `#`–`###` headings, `-`/`*` bullets, `1.` numbered items, `>` quotes,
//! fenced code, `---`/`___`/`***` dividers and `**bold**`/`__bold__` spans.
//! Anything else becomes a paragraph, one per line.

use std::sync::LazyLock;

use regex::Regex;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,3})\s+(.+)$").unwrap());
static NUMBERED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)\.\s+(.+)$").unwrap());
static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*|__(.*?)__").unwrap());

const CODE_FENCE: &str = "```";
const DEFAULT_CODE_LANGUAGE: &str = "plain text";
const DIVIDERS: &[&str] = &["---", "___", "***"];

/// A run of text with uniform formatting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    pub text: String,
    pub bold: bool,
}

impl InlineSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Heading1,
    Heading2,
    Heading3,
    BulletedListItem,
    NumberedListItem,
    Quote,
    Code,
    Divider,
    Paragraph,
}

impl BlockKind {
    /// Block type name in the Notion API
    pub fn notion_type(&self) -> &'static str {
        match self {
            BlockKind::Heading1 => "heading_1",
            BlockKind::Heading2 => "heading_2",
            BlockKind::Heading3 => "heading_3",
            BlockKind::BulletedListItem => "bulleted_list_item",
            BlockKind::NumberedListItem => "numbered_list_item",
            BlockKind::Quote => "quote",
            BlockKind::Code => "code",
            BlockKind::Divider => "divider",
            BlockKind::Paragraph => "paragraph",
        }
    }
}

/// One structural unit of a page body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Levels outside 1..=3 are read as the nearest of them, see [`Block::heading_level`]
    Heading { level: u8, spans: Vec<InlineSpan> },
    BulletedListItem(Vec<InlineSpan>),
    NumberedListItem(Vec<InlineSpan>),
    Quote(Vec<InlineSpan>),
    /// Code text is kept verbatim, no inline processing
    Code { language: String, text: String },
    Divider,
    Paragraph(Vec<InlineSpan>),
}

impl Block {
    pub fn heading(level: u8, text: &str) -> Self {
        Block::Heading {
            level: level.clamp(1, 3),
            spans: vec![InlineSpan::plain(text)],
        }
    }

    /// Heading level clamped to 1..=3; `None` for other blocks
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            Block::Heading { level, .. } => Some((*level).clamp(1, 3)),
            _ => None,
        }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Heading { .. } => match self.heading_level() {
                Some(1) => BlockKind::Heading1,
                Some(2) => BlockKind::Heading2,
                _ => BlockKind::Heading3,
            },
            Block::BulletedListItem(_) => BlockKind::BulletedListItem,
            Block::NumberedListItem(_) => BlockKind::NumberedListItem,
            Block::Quote(_) => BlockKind::Quote,
            Block::Code { .. } => BlockKind::Code,
            Block::Divider => BlockKind::Divider,
            Block::Paragraph(_) => BlockKind::Paragraph,
        }
    }

    /// Inline spans of a text block; empty for code and dividers
    pub fn spans(&self) -> &[InlineSpan] {
        match self {
            Block::Heading { spans, .. }
            | Block::BulletedListItem(spans)
            | Block::NumberedListItem(spans)
            | Block::Quote(spans)
            | Block::Paragraph(spans) => spans,
            Block::Code { .. } | Block::Divider => &[],
        }
    }

    /// Text content with formatting markers stripped
    pub fn plain_text(&self) -> String {
        match self {
            Block::Code { text, .. } => text.clone(),
            _ => self.spans().iter().map(|s| s.text.as_str()).collect(),
        }
    }
}

/// Convert a markdown document into blocks, in source order.
///
/// Never fails: a line that matches no rule becomes a paragraph.
pub fn convert_markdown(markdown: &str) -> Vec<Block> {
    let lines: Vec<&str> = markdown.split('\n').collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();

        if line.is_empty() {
            i += 1;
            continue;
        }

        if let Some(caps) = HEADING_RE.captures(line) {
            blocks.push(Block::Heading {
                level: caps[1].len() as u8,
                spans: process_inline(&caps[2]),
            });
            i += 1;
            continue;
        }

        if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            blocks.push(Block::BulletedListItem(process_inline(rest)));
            i += 1;
            continue;
        }

        // The numeral is dropped, Notion renumbers list items itself
        if let Some(caps) = NUMBERED_RE.captures(line) {
            blocks.push(Block::NumberedListItem(process_inline(&caps[2])));
            i += 1;
            continue;
        }

        if let Some(rest) = line.strip_prefix('>') {
            blocks.push(Block::Quote(process_inline(rest.trim())));
            i += 1;
            continue;
        }

        if let Some(rest) = line.strip_prefix(CODE_FENCE) {
            let (block, next) = consume_code_block(&lines, i, rest.trim());
            blocks.push(block);
            i = next;
            continue;
        }

        if DIVIDERS.contains(&line) {
            blocks.push(Block::Divider);
            i += 1;
            continue;
        }

        blocks.push(Block::Paragraph(process_inline(line)));
        i += 1;
    }

    blocks
}

/// Collect a fenced code block opened at `start`. Returns the block and the
/// index of the first line after it.
fn consume_code_block(lines: &[&str], start: usize, language: &str) -> (Block, usize) {
    let mut i = start + 1;
    let mut code = Vec::new();

    while i < lines.len() && !lines[i].trim().starts_with(CODE_FENCE) {
        code.push(lines[i]);
        i += 1;
    }

    // skip the closing fence, an unterminated block runs to end of input
    if i < lines.len() {
        i += 1;
    }

    let language = if language.is_empty() {
        DEFAULT_CODE_LANGUAGE
    } else {
        language
    };

    (
        Block::Code {
            language: language.to_string(),
            text: code.join("\n"),
        },
        i,
    )
}

/// Split text into plain and bold spans on `**…**` / `__…__` pairs.
pub fn process_inline(text: &str) -> Vec<InlineSpan> {
    let mut spans = Vec::new();
    let mut last_end = 0;

    for caps in BOLD_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last_end {
            spans.push(InlineSpan::plain(&text[last_end..whole.start()]));
        }

        let inner = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        spans.push(InlineSpan::bold(inner));
        last_end = whole.end();
    }

    if last_end < text.len() {
        spans.push(InlineSpan::plain(&text[last_end..]));
    }

    if spans.is_empty() {
        spans.push(InlineSpan::plain(text));
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(md: &str) -> Vec<BlockKind> {
        convert_markdown(md).iter().map(Block::kind).collect()
    }

    #[test]
    fn out_of_range_heading_levels_clamp() {
        let heading = |level| Block::Heading {
            level,
            spans: vec![InlineSpan::plain("x")],
        };
        assert_eq!(heading(0).kind(), BlockKind::Heading1);
        assert_eq!(heading(0).heading_level(), Some(1));
        assert_eq!(heading(2).kind(), BlockKind::Heading2);
        assert_eq!(heading(9).kind(), BlockKind::Heading3);
        assert_eq!(heading(9).heading_level(), Some(3));
        assert_eq!(Block::Divider.heading_level(), None);
    }

    #[test]
    fn single_bold_span() {
        assert_eq!(process_inline("**hello**"), vec![InlineSpan::bold("hello")]);
    }

    #[test]
    fn no_bold_is_one_plain_span() {
        assert_eq!(
            process_inline("no bold here"),
            vec![InlineSpan::plain("no bold here")]
        );
    }

    #[test]
    fn empty_text_still_yields_a_span() {
        assert_eq!(process_inline(""), vec![InlineSpan::plain("")]);
    }

    #[test]
    fn mixed_spans_keep_order() {
        let spans = process_inline("Use **Rust** and __Cargo__ daily");
        assert_eq!(
            spans,
            vec![
                InlineSpan::plain("Use "),
                InlineSpan::bold("Rust"),
                InlineSpan::plain(" and "),
                InlineSpan::bold("Cargo"),
                InlineSpan::plain(" daily"),
            ]
        );
    }

    #[test]
    fn mismatched_delimiters_are_not_bold() {
        assert_eq!(process_inline("**x__"), vec![InlineSpan::plain("**x__")]);
    }

    #[test]
    fn lazy_match_takes_shortest_pair() {
        let spans = process_inline("**a** b **c**");
        assert_eq!(
            spans,
            vec![
                InlineSpan::bold("a"),
                InlineSpan::plain(" b "),
                InlineSpan::bold("c"),
            ]
        );
    }

    #[test]
    fn unbalanced_marker_stays_literal() {
        let spans = process_inline("**Key:** value with a stray **");
        assert_eq!(
            spans,
            vec![
                InlineSpan::bold("Key:"),
                InlineSpan::plain(" value with a stray **"),
            ]
        );
    }

    #[test]
    fn heading_levels() {
        assert_eq!(kinds("# A"), vec![BlockKind::Heading1]);
        assert_eq!(kinds("## A"), vec![BlockKind::Heading2]);
        assert_eq!(kinds("### A"), vec![BlockKind::Heading3]);
        assert_eq!(kinds("#### A"), vec![BlockKind::Paragraph]);
        assert_eq!(kinds("#NoSpace"), vec![BlockKind::Paragraph]);
    }

    #[test]
    fn heading_content_is_inline_processed() {
        let blocks = convert_markdown("## The **Big** Idea");
        assert_eq!(
            blocks,
            vec![Block::Heading {
                level: 2,
                spans: vec![
                    InlineSpan::plain("The "),
                    InlineSpan::bold("Big"),
                    InlineSpan::plain(" Idea"),
                ],
            }]
        );
    }

    #[test]
    fn list_items() {
        let blocks = convert_markdown("- one\n* two\n3. three\n10. ten");
        assert_eq!(
            blocks,
            vec![
                Block::BulletedListItem(vec![InlineSpan::plain("one")]),
                Block::BulletedListItem(vec![InlineSpan::plain("two")]),
                Block::NumberedListItem(vec![InlineSpan::plain("three")]),
                Block::NumberedListItem(vec![InlineSpan::plain("ten")]),
            ]
        );
    }

    #[test]
    fn indented_bullets_are_flattened() {
        assert_eq!(
            convert_markdown("    - nested"),
            vec![Block::BulletedListItem(vec![InlineSpan::plain("nested")])]
        );
    }

    #[test]
    fn quote_strips_marker_and_whitespace() {
        assert_eq!(
            convert_markdown(">   wise words  "),
            vec![Block::Quote(vec![InlineSpan::plain("wise words")])]
        );
    }

    #[test]
    fn code_fence_collapses_to_one_block() {
        let blocks = convert_markdown("```python\nprint(1)\nprint(2)\n```");
        assert_eq!(
            blocks,
            vec![Block::Code {
                language: "python".to_string(),
                text: "print(1)\nprint(2)".to_string(),
            }]
        );
        assert!(blocks[0].spans().is_empty());
    }

    #[test]
    fn code_keeps_indentation_and_markers_verbatim() {
        let blocks = convert_markdown("```\n  if x:\n      **not bold**\n```\nafter");
        assert_eq!(
            blocks,
            vec![
                Block::Code {
                    language: "plain text".to_string(),
                    text: "  if x:\n      **not bold**".to_string(),
                },
                Block::Paragraph(vec![InlineSpan::plain("after")]),
            ]
        );
    }

    #[test]
    fn unterminated_code_fence_runs_to_end() {
        let blocks = convert_markdown("```rust\nfn main() {}\n\n// end");
        assert_eq!(
            blocks,
            vec![Block::Code {
                language: "rust".to_string(),
                text: "fn main() {}\n\n// end".to_string(),
            }]
        );
    }

    #[test]
    fn dividers() {
        assert_eq!(
            kinds("---\n___\n***"),
            vec![BlockKind::Divider, BlockKind::Divider, BlockKind::Divider]
        );
        assert!(convert_markdown("---")[0].spans().is_empty());
    }

    #[test]
    fn consecutive_lines_are_separate_paragraphs() {
        assert_eq!(
            convert_markdown("first line\nsecond line"),
            vec![
                Block::Paragraph(vec![InlineSpan::plain("first line")]),
                Block::Paragraph(vec![InlineSpan::plain("second line")]),
            ]
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert!(convert_markdown("").is_empty());
        assert!(convert_markdown("\n   \n\t\n").is_empty());
        assert_eq!(kinds("\n\nA\n\n\nB\n"), vec![BlockKind::Paragraph; 2]);
    }

    #[test]
    fn crlf_lines_are_trimmed() {
        assert_eq!(
            convert_markdown("## Title\r\n- item\r\n"),
            vec![
                Block::Heading {
                    level: 2,
                    spans: vec![InlineSpan::plain("Title")],
                },
                Block::BulletedListItem(vec![InlineSpan::plain("item")]),
            ]
        );
    }

    #[test]
    fn plain_text_strips_markers() {
        let block = &convert_markdown("- **Bold** start")[0];
        assert_eq!(block.plain_text(), "Bold start");
    }
}
