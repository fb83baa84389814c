use std::path::PathBuf;
use thiserror::Error;

use crate::provider::ProviderError;

#[derive(Error, Debug)]
pub enum TubenoteError {
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Could not extract video ID from URL: {url}")]
    VideoIdNotFound { url: String },

    #[error("Metadata lookup failed for {url}: {reason}")]
    MetadataFailed { url: String, reason: String },

    #[error(
        "No transcript available for video {video_id}. Only videos with available captions are supported."
    )]
    TranscriptUnavailable { video_id: String },

    #[error("Failed to fetch transcript into {dir}: {reason}")]
    TranscriptFailed { dir: PathBuf, reason: String },

    #[error("Summary generation failed: {reason}")]
    SummaryFailed { reason: String },

    #[error("No summary available to add to Notion")]
    MissingSummary,

    #[error("Could not find database with ID: {database_id}")]
    DatabaseNotFound { database_id: String },

    #[error("API authentication failed (unauthorized): {message}")]
    Unauthorized { message: String },

    #[error("Notion API returned {status}: {message}")]
    NotionApi { status: u16, message: String },

    #[error("Unexpected Notion response: {reason}")]
    NotionResponse { reason: String },

    #[error("Missing configuration: {env_var} environment variable is not set")]
    MissingConfig { env_var: String },

    #[error("Invalid configuration for {env_var}: {reason}")]
    InvalidConfig { env_var: String, reason: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

impl TubenoteError {
    /// Failures a user can fix themselves get a hint in the CLI.
    pub fn is_missing_captions(&self) -> bool {
        matches!(self, TubenoteError::TranscriptUnavailable { .. })
    }

    pub fn is_database_not_found(&self) -> bool {
        matches!(self, TubenoteError::DatabaseNotFound { .. })
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, TubenoteError::Unauthorized { .. })
    }
}

pub type Result<T> = std::result::Result<T, TubenoteError>;
