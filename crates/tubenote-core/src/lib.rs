//! Tubenote Core Library
//!
//! Fetches YouTube transcripts, summarizes them with an LLM and publishes the
//! summaries as Notion pages. The markdown-to-block converter and the title
//! inference engine are pure and usable on their own.

pub mod blocks;
pub mod cache;
pub mod config;
pub mod error;
pub mod format;
pub mod notion;
pub mod pipeline;
pub mod provider;
pub mod summarize;
pub mod title;
pub mod types;
pub mod youtube;

// Re-export commonly used items at crate root
pub use blocks::{Block, BlockKind, InlineSpan, convert_markdown, process_inline};
pub use cache::get_root_cache_dir;
pub use config::{Config, NotionConfig};
pub use error::{Result, TubenoteError};
pub use format::{format_blocks_readable, format_draft_readable, format_duration};
pub use notion::NotionClient;
pub use pipeline::{
    DocumentStore, NoProgress, Outcome, Pipeline, Progress, Stage, StageStatus, Summarizer,
    VideoSource, build_draft,
};
pub use provider::{Provider, ProviderConfig, ProviderError};
pub use summarize::ChatSummarizer;
pub use title::{
    TitleCandidate, TitleStage, extract_title_from_summary, infer_title, infer_title_text,
    normalize_title,
};
pub use types::{
    ContentRecord, PageDraft, PublishedPage, Segment, SummarizedContent, Transcript, VideoMetadata,
};
pub use youtube::{YtDlpSource, extract_video_id, validate_url};
