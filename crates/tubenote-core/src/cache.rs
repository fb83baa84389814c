use std::{
    hash::{DefaultHasher, Hash, Hasher},
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use tokio::fs;

use crate::error::Result;

/// Cache directory for a URL under the cache root
pub fn cache_dir_in(root: &Path, url: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    url.trim().hash(&mut hasher);
    let url_hash = hasher.finish();

    root.join(url_hash.to_string())
}

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("tubenote")
}

pub fn get_metadata_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("metadata.json")
}

/// Get the path for a cached transcript file
pub fn get_transcript_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("transcript.json")
}

/// Get the path for a cached summary (summarizer aware)
pub fn get_summary_path(cache_dir: &Path, summarizer_key: &str) -> PathBuf {
    let key: String = summarizer_key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    cache_dir.join(format!("summary_{}.md", key))
}

pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json_content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&json_content)?)
}

pub async fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let pretty_json = serde_json::to_string_pretty(value)?;
    fs::write(path, &pretty_json).await?;
    Ok(())
}
