use serde::{Deserialize, Serialize};

use crate::{
    blocks::Block,
    title::{TitleStage, is_placeholder_title, placeholder_title},
};

/// Video metadata as fetched from the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub video_id: String,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub duration_seconds: u64,
    /// ISO date, `YYYY-MM-DD`
    #[serde(default)]
    pub publish_date: Option<String>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub description: String,
}

impl VideoMetadata {
    /// Metadata used when the real lookup failed: only id, URL and a generic title
    pub fn placeholder(video_id: &str, url: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            url: url.to_string(),
            title: placeholder_title(video_id),
            author: String::new(),
            channel: String::new(),
            duration_seconds: 0,
            publish_date: None,
            views: 0,
            description: String::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        is_placeholder_title(&self.title)
    }

    /// Author if known, channel otherwise
    pub fn byline(&self) -> Option<&str> {
        [self.author.as_str(), self.channel.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
    }

    pub fn with_transcript(self, transcript: Transcript) -> ContentRecord {
        ContentRecord {
            metadata: self,
            transcript,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub segments: Vec<Segment>,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Transcript {
    /// Build a transcript whose text is the segment texts joined by spaces
    pub fn from_segments(segments: Vec<Segment>, language: &str) -> Self {
        let text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            text,
            segments,
            language: language.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.segments.last().map(|s| s.end).unwrap_or(0.0)
    }
}

/// Metadata plus transcript, ready for summarization
#[derive(Debug, Clone)]
pub struct ContentRecord {
    pub metadata: VideoMetadata,
    pub transcript: Transcript,
}

impl ContentRecord {
    pub fn with_summary(self, summary: String) -> SummarizedContent {
        SummarizedContent {
            metadata: self.metadata,
            transcript: self.transcript,
            summary,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummarizedContent {
    pub metadata: VideoMetadata,
    pub transcript: Transcript,
    /// Markdown produced by the LLM
    pub summary: String,
}

/// Everything needed to create the Notion page
#[derive(Debug, Clone)]
pub struct PageDraft {
    pub title: String,
    /// `None` when no title could be inferred and the platform title was kept
    pub title_stage: Option<TitleStage>,
    pub metadata: VideoMetadata,
    pub summary: String,
    pub blocks: Vec<Block>,
}

pub const BODY_HEADING: &str = "Video Summary";

impl PageDraft {
    /// Page body: a "Video Summary" heading followed by the converted summary
    pub fn body(&self) -> Vec<Block> {
        let mut body = Vec::with_capacity(self.blocks.len() + 1);
        body.push(Block::heading(1, BODY_HEADING));
        body.extend(self.blocks.iter().cloned());
        body
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedPage {
    pub page_id: String,
    pub url: String,
    pub title: String,
}
