//! Environment-driven configuration.

use uuid::Uuid;

use crate::error::{Result, TubenoteError};

pub const NOTION_API_KEY_VAR: &str = "NOTION_API_KEY";
pub const NOTION_DATABASE_ID_VAR: &str = "NOTION_DATABASE_ID";
pub const LANGUAGE_VAR: &str = "DEFAULT_LANGUAGE";

pub const DEFAULT_LANGUAGE: &str = "en";
/// Upper bound on summary length, in tokens
pub const DEFAULT_MAX_SUMMARY_TOKENS: u32 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotionConfig {
    pub api_key: String,
    /// Hyphenated UUID form
    pub database_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    notion_api_key: Option<String>,
    notion_database_id: Option<String>,
    /// Transcript language requested from the platform
    pub language: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let notion_database_id = get(NOTION_DATABASE_ID_VAR)
            .map(|raw| normalize_database_id(&raw))
            .transpose()?;

        Ok(Self {
            notion_api_key: get(NOTION_API_KEY_VAR).map(|k| k.trim().to_string()),
            notion_database_id,
            language: get(LANGUAGE_VAR)
                .map(|l| l.trim().to_string())
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        })
    }

    /// Notion credentials, required for publishing
    pub fn notion(&self) -> Result<NotionConfig> {
        let api_key = self
            .notion_api_key
            .clone()
            .ok_or_else(|| missing(NOTION_API_KEY_VAR))?;
        let database_id = self
            .notion_database_id
            .clone()
            .ok_or_else(|| missing(NOTION_DATABASE_ID_VAR))?;
        Ok(NotionConfig {
            api_key,
            database_id,
        })
    }
}

fn missing(env_var: &str) -> TubenoteError {
    TubenoteError::MissingConfig {
        env_var: env_var.to_string(),
    }
}

/// Accept a database id with or without dashes, or a database URL copied
/// from the browser, and return the hyphenated UUID.
pub fn normalize_database_id(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if let Ok(id) = Uuid::parse_str(raw) {
        return Ok(id.hyphenated().to_string());
    }

    // https://www.notion.so/<workspace>/<Name>-<32 hex>?v=<view>
    let path = raw.split(['?', '#']).next().unwrap_or(raw);
    let segment = path.trim_end_matches('/').rsplit('/').next().unwrap_or(path);
    let tail = segment
        .len()
        .checked_sub(32)
        .and_then(|start| segment.get(start..));

    tail.and_then(|hex| Uuid::parse_str(hex).ok())
        .map(|id| id.hyphenated().to_string())
        .ok_or_else(|| TubenoteError::InvalidConfig {
            env_var: NOTION_DATABASE_ID_VAR.to_string(),
            reason: format!("'{}' is not a Notion database id", raw),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const ID: &str = "0123456789abcdef0123456789abcdef";
    const HYPHENATED: &str = "01234567-89ab-cdef-0123-456789abcdef";

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn database_id_forms() {
        assert_eq!(normalize_database_id(ID).unwrap(), HYPHENATED);
        assert_eq!(normalize_database_id(HYPHENATED).unwrap(), HYPHENATED);
        assert_eq!(
            normalize_database_id(&format!("https://www.notion.so/team/Videos-{ID}?v=42")).unwrap(),
            HYPHENATED
        );
    }

    #[test]
    fn bad_database_id_is_rejected() {
        let err = normalize_database_id("not-an-id").unwrap_err();
        assert!(matches!(err, TubenoteError::InvalidConfig { .. }));
    }

    #[test]
    fn language_defaults_to_english() {
        assert_eq!(config(&[]).unwrap().language, "en");
        assert_eq!(config(&[(LANGUAGE_VAR, " de ")]).unwrap().language, "de");
    }

    #[test]
    fn notion_requires_both_vars() {
        let err = config(&[(NOTION_API_KEY_VAR, "secret")])
            .unwrap()
            .notion()
            .unwrap_err();
        assert!(
            matches!(err, TubenoteError::MissingConfig { ref env_var } if env_var == NOTION_DATABASE_ID_VAR)
        );

        let notion = config(&[(NOTION_API_KEY_VAR, "secret"), (NOTION_DATABASE_ID_VAR, ID)])
            .unwrap()
            .notion()
            .unwrap();
        assert_eq!(notion.api_key, "secret");
        assert_eq!(notion.database_id, HYPHENATED);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let err = config(&[(NOTION_API_KEY_VAR, "  "), (NOTION_DATABASE_ID_VAR, ID)])
            .unwrap()
            .notion()
            .unwrap_err();
        assert!(matches!(err, TubenoteError::MissingConfig { .. }));
    }
}
