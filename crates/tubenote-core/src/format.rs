use crate::{blocks::Block, types::PageDraft};

const PREVIEW_CHARS: usize = 100;

/// Format seconds as H:MM:SS, or M:SS under an hour
pub fn format_duration(seconds: u64) -> String {
    let (minutes, secs) = (seconds / 60, seconds % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Convert a yt-dlp `YYYYMMDD` upload date to `YYYY-MM-DD`
pub fn format_upload_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.len() == 8 && raw.chars().all(|c| c.is_ascii_digit()) {
        return Some(format!("{}-{}-{}", &raw[..4], &raw[4..6], &raw[6..]));
    }
    let is_iso = raw.len() == 10
        && raw
            .chars()
            .enumerate()
            .all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() });
    is_iso.then(|| raw.to_string())
}

/// Short preview of a summary for a database property
pub fn summary_preview(summary: &str) -> String {
    let mut preview: String = summary.chars().take(PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

/// Render a draft as terminal-friendly text
pub fn format_draft_readable(draft: &PageDraft) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", draft.title));

    let mut meta = Vec::new();
    if let Some(byline) = draft.metadata.byline() {
        meta.push(format!("**Channel:** {}", byline));
    }
    if draft.metadata.duration_seconds > 0 {
        meta.push(format!(
            "**Duration:** {}",
            format_duration(draft.metadata.duration_seconds)
        ));
    }
    if let Some(date) = &draft.metadata.publish_date {
        meta.push(format!("**Published:** {}", date));
    }
    if !meta.is_empty() {
        output.push_str(&meta.join(" | "));
        output.push_str("\n\n");
    }

    output.push_str(&format_blocks_readable(&draft.body()));
    output
}

pub fn format_blocks_readable(blocks: &[Block]) -> String {
    let mut output = String::new();
    let mut number = 0;

    for block in blocks {
        if !matches!(block, Block::NumberedListItem(_)) {
            number = 0;
        }
        match block {
            Block::Heading { .. } => {
                let level = block.heading_level().unwrap_or(1);
                output.push_str(&format!(
                    "\n{} {}\n\n",
                    "#".repeat(level as usize),
                    block.plain_text()
                ));
            }
            Block::BulletedListItem(_) => {
                output.push_str(&format!("• {}\n", block.plain_text()));
            }
            Block::NumberedListItem(_) => {
                number += 1;
                output.push_str(&format!("{}. {}\n", number, block.plain_text()));
            }
            Block::Quote(_) => output.push_str(&format!("│ {}\n", block.plain_text())),
            Block::Code { language, text } => {
                output.push_str(&format!("```{}\n{}\n```\n", language, text));
            }
            Block::Divider => output.push_str(&format!("{}\n", "─".repeat(40))),
            Block::Paragraph(_) => output.push_str(&format!("{}\n", block.plain_text())),
        }
    }

    output
}
