use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tokio::{fs, process::Command};
use tracing::{debug, warn};

use crate::{
    error::{Result, TubenoteError},
    format::format_upload_date,
    pipeline::VideoSource,
    types::{Segment, Transcript, VideoMetadata},
};

const YOUTUBE_DOMAINS: &[&str] = &["youtube.com", "youtu.be"];
const SUBTITLE_STEM: &str = "subs";

static VIDEO_ID_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?:v=|/)([0-9A-Za-z_-]{11}).*",
        r"(?:embed/)([0-9A-Za-z_-]{11})",
        r"(?:shorts/)([0-9A-Za-z_-]{11})",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Check that a URL is a non-empty YouTube URL
pub fn validate_url(url: &str) -> Result<()> {
    let url = url.trim();
    if url.is_empty() {
        return Err(TubenoteError::InvalidUrl {
            url: url.to_string(),
            reason: "URL must be a non-empty string".to_string(),
        });
    }
    if !YOUTUBE_DOMAINS.iter().any(|domain| url.contains(domain)) {
        return Err(TubenoteError::InvalidUrl {
            url: url.to_string(),
            reason: "URL must be a valid YouTube URL".to_string(),
        });
    }
    Ok(())
}

/// Extract the 11-character video ID from a watch, short-link, embed or shorts URL
pub fn extract_video_id(url: &str) -> Result<String> {
    VIDEO_ID_RES
        .iter()
        .find_map(|re| re.captures(url))
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| TubenoteError::VideoIdNotFound {
            url: url.to_string(),
        })
}

/// Map `yt-dlp --dump-json` output to our metadata
pub fn parse_metadata(info: &serde_json::Value, video_id: &str, url: &str) -> VideoMetadata {
    let text = |key: &str| info[key].as_str().unwrap_or_default().trim().to_string();
    let count = |key: &str| {
        info[key]
            .as_u64()
            .or_else(|| info[key].as_f64().map(|v| v.max(0.0).round() as u64))
            .unwrap_or(0)
    };

    let title = text("title");
    if title.is_empty() {
        return VideoMetadata::placeholder(video_id, url);
    }

    VideoMetadata {
        video_id: video_id.to_string(),
        url: url.to_string(),
        title,
        author: text("uploader"),
        channel: text("channel"),
        duration_seconds: count("duration"),
        publish_date: format_upload_date(&text("upload_date")),
        views: count("view_count"),
        description: text("description"),
    }
}

#[derive(Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Parse a YouTube `json3` caption track into a transcript
pub fn parse_json3(content: &str, language: &str) -> Result<Transcript> {
    let track: Json3 = serde_json::from_str(content)?;

    let segments = track
        .events
        .into_iter()
        .filter_map(|event| {
            let raw: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                return None;
            }
            let start = event.t_start_ms as f64 / 1000.0;
            Some(Segment {
                start,
                end: start + event.d_duration_ms as f64 / 1000.0,
                text,
            })
        })
        .collect();

    Ok(Transcript::from_segments(segments, language))
}

/// Video source backed by the `yt-dlp` binary
pub struct YtDlpSource {
    language: String,
}

impl YtDlpSource {
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
        }
    }

    async fn dump_json(&self, url: &str) -> Result<serde_json::Value> {
        let output = Command::new("yt-dlp")
            .arg(url)
            .arg("--dump-json")
            .arg("--skip-download")
            .arg("--no-playlist")
            .arg("--no-warnings")
            .output()
            .await?;

        if !output.status.success() {
            return Err(TubenoteError::MetadataFailed {
                url: url.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

#[async_trait]
impl VideoSource for YtDlpSource {
    async fn metadata(&self, url: &str, video_id: &str) -> VideoMetadata {
        match self.dump_json(url).await {
            Ok(info) => parse_metadata(&info, video_id, url),
            Err(e) => {
                warn!(url, error = %e, "could not fetch video metadata, using placeholder title");
                VideoMetadata::placeholder(video_id, url)
            }
        }
    }

    async fn transcript(&self, url: &str, video_id: &str, work_dir: &Path) -> Result<Transcript> {
        let output_template = work_dir.join(format!("{}.%(ext)s", SUBTITLE_STEM));
        let output = Command::new("yt-dlp")
            .arg(url)
            .arg("--skip-download")
            .arg("--write-subs")
            .arg("--write-auto-subs")
            .arg("--sub-langs")
            .arg(&self.language)
            .arg("--sub-format")
            .arg("json3")
            .arg("--force-overwrites")
            .arg("--no-playlist")
            .arg("-o")
            .arg(&output_template)
            .output()
            .await?;

        if !output.status.success() {
            return Err(TubenoteError::TranscriptFailed {
                dir: work_dir.to_path_buf(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let Some(track_path) = find_subtitle_track(work_dir).await? else {
            return Err(TubenoteError::TranscriptUnavailable {
                video_id: video_id.to_string(),
            });
        };
        debug!(path = %track_path.display(), "parsing caption track");

        let content = fs::read_to_string(&track_path).await?;
        let transcript = parse_json3(&content, &self.language)?;
        if transcript.is_empty() {
            return Err(TubenoteError::TranscriptUnavailable {
                video_id: video_id.to_string(),
            });
        }
        Ok(transcript)
    }
}

/// Find the caption file yt-dlp wrote, e.g. `subs.en.json3`
async fn find_subtitle_track(dir: &Path) -> Result<Option<PathBuf>> {
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(SUBTITLE_STEM) && name.ends_with(".json3") {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}
