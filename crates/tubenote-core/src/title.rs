//! Title inference for summary pages.
//!
//! A real platform title always wins. When metadata lookup failed upstream the
//! title is a generic placeholder, and a title is recovered from the summary
//! markdown instead, trying the most specific heuristics first.

use std::sync::LazyLock;

use regex::Regex;

/// Prefix of the title used when video metadata could not be fetched
pub const PLACEHOLDER_PREFIX: &str = "YouTube Summary - ";

/// Labelled title patterns, most specific first. Group 1 is the title.
const TITLE_PATTERNS: &[&str] = &[
    r#"Summary of ["'](.+?)["']"#,
    r"# (.+?) Summary",
    r#"# Summary of ["'](.+?)["']"#,
    r"^(.+?) Video Summary",
    r#"["'](.+?)["'] Video"#,
    r#"overview of ["'](.+?)["']"#,
    r#"overview of the ["'](.+?)["']"#,
    r#"from ["'](.+?)["']"#,
    r#"titled ["'](.+?)["']"#,
    r#"called ["'](.+?)["']"#,
];

const LEAD_VERBS: &str =
    "discusses|explores|presents|is about|covers|focuses on|examines|talks about|provides|offers";

/// Words kept lowercase inside a title
const MINOR_WORDS: &[&str] = &[
    "a", "an", "the", "and", "but", "or", "for", "nor", "on", "at", "to", "from", "by", "in",
    "of", "with", "as",
];

/// Sentences longer than this many words are cut down to a short title
const SHORT_SENTENCE_WORDS: usize = 3;
const MAX_TITLE_WORDS: usize = 7;

static TITLE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    TITLE_PATTERNS
        .iter()
        .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
        .collect()
});

/// Overview body runs up to the next line that starts a `##` heading
static OVERVIEW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)## Overview[ \t]*(.*?)(?:^[ \t]*##|\z)").unwrap());

static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"["'](.+?)["']"#).unwrap());

static LEAD_IN_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!("(?i)^This video ({LEAD_VERBS})"),
        r"(?i)^In this video,?\s+".to_string(),
        format!("(?i)^The video ({LEAD_VERBS})"),
        format!("(?i)^The speaker ({LEAD_VERBS})"),
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Which heuristic produced a title. Earlier variants are more trustworthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TitleStage {
    PlatformTitle,
    OverviewPattern,
    OverviewSentence,
    DocumentPattern,
    SectionHeading,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleCandidate {
    pub text: String,
    pub stage: TitleStage,
}

impl TitleCandidate {
    fn new(text: String, stage: TitleStage) -> Self {
        Self { text, stage }
    }
}

pub fn placeholder_title(video_id: &str) -> String {
    format!("{PLACEHOLDER_PREFIX}{video_id}")
}

pub fn is_placeholder_title(title: &str) -> bool {
    title.starts_with(PLACEHOLDER_PREFIX)
}

/// Decide on the final page title.
///
/// Returns `None` when neither the platform title nor the summary yields one;
/// the caller keeps whatever placeholder it already has.
pub fn infer_title(platform_title: &str, summary_markdown: &str) -> Option<TitleCandidate> {
    if !platform_title.trim().is_empty() && !is_placeholder_title(platform_title) {
        let has_inner_uppercase = platform_title.chars().skip(1).any(char::is_uppercase);
        let text = if has_inner_uppercase {
            platform_title.to_string()
        } else {
            normalize_title(platform_title)
        };
        return Some(TitleCandidate::new(text, TitleStage::PlatformTitle));
    }

    extract_title_from_summary(summary_markdown)
}

/// Like [`infer_title`], with "no title" flattened to an empty string.
pub fn infer_title_text(platform_title: &str, summary_markdown: &str) -> String {
    infer_title(platform_title, summary_markdown)
        .map(|candidate| candidate.text)
        .unwrap_or_default()
}

/// Recover a title from an LLM summary.
///
/// When an `## Overview` section exists the answer always comes from it: a
/// labelled pattern, else its first sentence. Otherwise the labelled patterns
/// run over the whole document, then the first `##` heading is used.
pub fn extract_title_from_summary(summary: &str) -> Option<TitleCandidate> {
    if let Some(overview) = overview_section(summary) {
        if let Some(title) = match_title_patterns(overview) {
            return Some(TitleCandidate::new(title, TitleStage::OverviewPattern));
        }
        return sentence_title(overview)
            .map(|title| TitleCandidate::new(title, TitleStage::OverviewSentence));
    }

    if let Some(title) = match_title_patterns(summary) {
        return Some(TitleCandidate::new(title, TitleStage::DocumentPattern));
    }

    section_heading_title(summary)
        .map(|title| TitleCandidate::new(title, TitleStage::SectionHeading))
}

/// Text between `## Overview` and the next `##` heading (or end of document).
/// An empty section is still a section; it just yields no sentence title.
fn overview_section(summary: &str) -> Option<&str> {
    OVERVIEW_RE
        .captures(summary)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

fn match_title_patterns(text: &str) -> Option<String> {
    TITLE_RES
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| normalize_title(m.as_str().trim()))
}

fn sentence_title(overview: &str) -> Option<String> {
    let sentence = first_sentence(overview).trim();

    if let Some(caps) = QUOTED_RE.captures(sentence) {
        return Some(normalize_title(caps[1].trim()));
    }

    let mut cleaned = sentence.to_string();
    for re in LEAD_IN_RES.iter() {
        let stripped = re.replace(&cleaned, "").trim().to_string();
        cleaned = stripped;
    }

    let words: Vec<&str> = cleaned.split_whitespace().collect();
    let title = if words.len() > SHORT_SENTENCE_WORDS {
        let mut short = words[..words.len().min(MAX_TITLE_WORDS)].join(" ");
        if words.len() > MAX_TITLE_WORDS {
            short.push_str("...");
        }
        short
    } else {
        cleaned
    };

    let title = normalize_title(&title);
    if title.is_empty() { None } else { Some(title) }
}

/// Everything up to the first `.`, `!` or `?` that is followed by whitespace
fn first_sentence(text: &str) -> &str {
    let mut prev = None;
    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() && matches!(prev, Some('.' | '!' | '?')) {
            return &text[..idx];
        }
        prev = Some(ch);
    }
    text
}

fn section_heading_title(summary: &str) -> Option<String> {
    summary
        .lines()
        .filter_map(|line| line.trim().strip_prefix("## "))
        .map(str::trim)
        .find(|heading| !heading.is_empty() && !heading.eq_ignore_ascii_case("overview"))
        .map(normalize_title)
}

/// Title-case a string: first and last word capitalized, minor words
/// lowercased in between, everything else capitalized.
pub fn normalize_title(title: &str) -> String {
    let words: Vec<&str> = title.split_whitespace().collect();
    if words.is_empty() {
        return title.to_string();
    }

    let last = words.len() - 1;
    let mut normalized = words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            if i == 0 || i == last {
                return capitalize(word);
            }
            let lower = word.to_lowercase();
            let starts_with_punct = word.starts_with(|c: char| c.is_ascii_punctuation());
            if MINOR_WORDS.contains(&lower.as_str()) && !starts_with_punct {
                lower
            } else {
                capitalize(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if title.ends_with("...") {
        normalized.truncate(normalized.trim_end_matches('.').len());
        normalized.push_str("...");
    }

    normalized
}

/// Uppercase the first letter, lowercase the rest
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
