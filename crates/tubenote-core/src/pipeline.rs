use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::fs;
use tracing::{info, warn};

use crate::{
    blocks::convert_markdown,
    cache::{
        cache_dir_in, get_metadata_path, get_summary_path, get_transcript_path, load_json,
        save_json,
    },
    error::{Result, TubenoteError},
    title::infer_title,
    types::{ContentRecord, PageDraft, PublishedPage, SummarizedContent, Transcript, VideoMetadata},
    youtube::{extract_video_id, validate_url},
};

/// Where videos come from
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Never fails; returns placeholder metadata when the lookup does
    async fn metadata(&self, url: &str, video_id: &str) -> VideoMetadata;

    async fn transcript(&self, url: &str, video_id: &str, work_dir: &Path) -> Result<Transcript>;
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Distinguishes cached summaries of different models
    fn cache_key(&self) -> String;

    fn describe(&self) -> String;

    /// Markdown summary of a transcript
    async fn summarize(&self, transcript: &Transcript) -> Result<String>;
}

/// Where finished pages go
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn publish(&self, draft: &PageDraft) -> Result<PublishedPage>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Metadata,
    Transcript,
    Summary,
    Publish,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Metadata => "Fetching metadata",
            Stage::Transcript => "Fetching transcript",
            Stage::Summary => "Summarizing",
            Stage::Publish => "Publishing to Notion",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Running,
    Done,
    Cached,
}

/// Receives stage updates for one video
pub trait Progress: Send + Sync {
    fn update(&self, stage: Stage, status: StageStatus);
}

pub struct NoProgress;

impl Progress for NoProgress {
    fn update(&self, _stage: Stage, _status: StageStatus) {}
}

#[derive(Debug)]
pub enum Outcome {
    Published { draft: PageDraft, page: PublishedPage },
    /// Dry run, nothing was written to Notion
    Drafted(PageDraft),
}

impl Outcome {
    pub fn draft(&self) -> &PageDraft {
        match self {
            Outcome::Published { draft, .. } | Outcome::Drafted(draft) => draft,
        }
    }
}

/// Pick the title and convert the summary body
pub fn build_draft(content: SummarizedContent) -> PageDraft {
    let (title, title_stage) = match infer_title(&content.metadata.title, &content.summary) {
        Some(candidate) => (candidate.text, Some(candidate.stage)),
        None => (content.metadata.title.clone(), None),
    };
    let blocks = convert_markdown(&content.summary);

    PageDraft {
        title,
        title_stage,
        metadata: content.metadata,
        summary: content.summary,
        blocks,
    }
}

pub struct Pipeline {
    source: Arc<dyn VideoSource>,
    summarizer: Arc<dyn Summarizer>,
    store: Option<Arc<dyn DocumentStore>>,
    cache_root: PathBuf,
    force: bool,
}

impl Pipeline {
    /// A pipeline without a store only drafts pages
    pub fn new(
        source: Arc<dyn VideoSource>,
        summarizer: Arc<dyn Summarizer>,
        cache_root: PathBuf,
    ) -> Self {
        Self {
            source,
            summarizer,
            store: None,
            cache_root,
            force: false,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Ignore cached metadata, transcripts and summaries
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn summarizer(&self) -> &dyn Summarizer {
        self.summarizer.as_ref()
    }

    /// Run one URL through fetch, summarize, draft and publish
    pub async fn process(&self, url: &str, progress: &dyn Progress) -> Result<Outcome> {
        let url = url.trim();
        validate_url(url)?;
        let video_id = extract_video_id(url)?;
        info!(url, video_id = %video_id, "processing video");

        let cache_dir = cache_dir_in(&self.cache_root, url);
        fs::create_dir_all(&cache_dir).await?;

        let metadata = self.metadata(url, &video_id, &cache_dir, progress).await?;
        let transcript = self.transcript(url, &video_id, &cache_dir, progress).await?;
        let content = metadata.with_transcript(transcript);
        let content = self.summarize(content, &cache_dir, progress).await?;

        let draft = build_draft(content);
        match draft.title_stage {
            Some(stage) => info!(title = %draft.title, ?stage, "title chosen"),
            None => warn!(title = %draft.title, "no title found, keeping placeholder"),
        }

        let Some(store) = &self.store else {
            return Ok(Outcome::Drafted(draft));
        };

        progress.update(Stage::Publish, StageStatus::Running);
        let page = store.publish(&draft).await?;
        progress.update(Stage::Publish, StageStatus::Done);
        info!(title = %page.title, url = %page.url, "successfully processed video");

        Ok(Outcome::Published { draft, page })
    }

    async fn metadata(
        &self,
        url: &str,
        video_id: &str,
        cache_dir: &Path,
        progress: &dyn Progress,
    ) -> Result<VideoMetadata> {
        let path = get_metadata_path(cache_dir);
        if !self.force && path.exists() {
            progress.update(Stage::Metadata, StageStatus::Cached);
            return load_json(&path).await;
        }

        progress.update(Stage::Metadata, StageStatus::Running);
        let metadata = self.source.metadata(url, video_id).await;
        // a placeholder is retried next run
        if !metadata.is_placeholder() {
            save_json(&metadata, &path).await?;
        }
        progress.update(Stage::Metadata, StageStatus::Done);
        Ok(metadata)
    }

    async fn transcript(
        &self,
        url: &str,
        video_id: &str,
        cache_dir: &Path,
        progress: &dyn Progress,
    ) -> Result<Transcript> {
        let path = get_transcript_path(cache_dir);
        if !self.force && path.exists() {
            progress.update(Stage::Transcript, StageStatus::Cached);
            return load_json(&path).await;
        }

        progress.update(Stage::Transcript, StageStatus::Running);
        info!(video_id, "extracting transcript");
        let transcript = self.source.transcript(url, video_id, cache_dir).await?;
        if transcript.is_empty() {
            return Err(TubenoteError::TranscriptUnavailable {
                video_id: video_id.to_string(),
            });
        }
        save_json(&transcript, &path).await?;
        progress.update(Stage::Transcript, StageStatus::Done);
        Ok(transcript)
    }

    async fn summarize(
        &self,
        content: ContentRecord,
        cache_dir: &Path,
        progress: &dyn Progress,
    ) -> Result<SummarizedContent> {
        let path = get_summary_path(cache_dir, &self.summarizer.cache_key());
        if !self.force && path.exists() {
            progress.update(Stage::Summary, StageStatus::Cached);
            let summary = fs::read_to_string(&path).await?;
            return Ok(content.with_summary(summary));
        }

        progress.update(Stage::Summary, StageStatus::Running);
        info!(summarizer = %self.summarizer.describe(), "summarizing content");
        let summary = self.summarizer.summarize(&content.transcript).await?;
        if summary.trim().is_empty() {
            return Err(TubenoteError::SummaryFailed {
                reason: "Failed to generate summary".to_string(),
            });
        }
        fs::write(&path, &summary).await?;
        progress.update(Stage::Summary, StageStatus::Done);
        Ok(content.with_summary(summary))
    }
}
