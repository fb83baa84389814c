use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use crate::{
    config::DEFAULT_MAX_SUMMARY_TOKENS,
    error::{Result, TubenoteError},
    pipeline::Summarizer,
    provider::Provider,
    types::Transcript,
};

static SYSTEM_PROMPT: &str = r#"You are an expert summarization assistant. Your task is to summarize YouTube video transcripts in a consistent, well-structured Markdown format suitable for Notion. Your response must strictly adhere to the following format:

## Overview
Provide a high-level overview of the video's content in 1-2 concise paragraphs.

## Innovative Ideas / Key Insights
### [Insight Title]
- Supporting detail or bullet point
*(Repeat heading with bullet points as needed)*

## Detailed Information
Include additional context, supporting details, and in-depth notes.

## Summary
Conclude with a brief final recap.

Make sure your entire response uses this exact structure with clear Markdown headings and bullet points. Do not add extra text or commentary outside this structure."#;

static USER_PROMPT_HEADER: &str = r#"Please summarize the following YouTube video transcript. Use the exact Markdown structure provided, ensuring that each section is clearly labeled:

## Overview
## Innovative Ideas / Key Insights
### [Insight Title]
- Bullet points as necessary
## Detailed Information
## Summary

"#;

const TEMPERATURE: f64 = 0.3;

/// Summarizer that calls an OpenAI-compatible chat completions endpoint
pub struct ChatSummarizer {
    provider: Provider,
    model: String,
    api_key: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl ChatSummarizer {
    /// Fails early when the provider's API key is not set
    pub fn new(provider: Provider, model: Option<String>) -> Result<Self> {
        let api_key = provider.validate_api_key()?;
        let model = model.unwrap_or_else(|| provider.config().model.to_string());
        Ok(Self {
            provider,
            model,
            api_key,
            max_tokens: DEFAULT_MAX_SUMMARY_TOKENS,
            client: reqwest::Client::new(),
        })
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl Summarizer for ChatSummarizer {
    fn cache_key(&self) -> String {
        format!("{}_{}", self.provider.slug(), self.model)
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.provider.name(), self.model)
    }

    async fn summarize(&self, transcript: &Transcript) -> Result<String> {
        if transcript.is_empty() {
            return Err(TubenoteError::SummaryFailed {
                reason: "No transcript available for summarization".to_string(),
            });
        }

        let config = self.provider.config();
        let body = build_request(&self.model, &transcript.text, self.max_tokens);
        debug!(
            provider = self.provider.name(),
            model = %self.model,
            transcript_chars = transcript.text.len(),
            "requesting summary"
        );

        let response = self
            .client
            .post(config.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response = response.json::<serde_json::Value>().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TubenoteError::Unauthorized {
                message: api_error_message(&response),
            });
        }
        if !status.is_success() {
            return Err(TubenoteError::SummaryFailed {
                reason: format!(
                    "{} returned {}: {}",
                    self.provider.name(),
                    status,
                    api_error_message(&response)
                ),
            });
        }

        parse_completion(&response)
    }
}

/// Chat completions request body for a transcript
pub fn build_request(model: &str, transcript: &str, max_tokens: u32) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "messages": [
            {
                "role": "system",
                "content": SYSTEM_PROMPT,
            },
            {
                "role": "user",
                "content": format!("{}{}", USER_PROMPT_HEADER, transcript),
            },
        ],
        "max_tokens": max_tokens,
        "temperature": TEMPERATURE,
    })
}

/// Extract the trimmed message content from a chat completions response
pub fn parse_completion(response: &serde_json::Value) -> Result<String> {
    let content = response["choices"][0]["message"]["content"]
        .as_str()
        .map(str::trim)
        .ok_or_else(|| TubenoteError::SummaryFailed {
            reason: format!("Invalid API response: {:?}", response),
        })?;

    if content.is_empty() {
        return Err(TubenoteError::SummaryFailed {
            reason: "Model returned an empty summary".to_string(),
        });
    }

    Ok(content.to_string())
}

fn api_error_message(response: &serde_json::Value) -> String {
    response["error"]["message"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| response.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_carries_prompt_and_transcript() {
        let body = build_request("gpt-4o-mini", "we talk about rust", 500);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["temperature"], 0.3);
        assert_eq!(body["messages"][0]["role"], "system");

        let system = body["messages"][0]["content"].as_str().unwrap();
        for heading in [
            "## Overview",
            "## Innovative Ideas / Key Insights",
            "## Detailed Information",
            "## Summary",
        ] {
            assert!(system.contains(heading), "{heading}");
        }

        let user = body["messages"][1]["content"].as_str().unwrap();
        assert!(user.ends_with("\n\nwe talk about rust"));
    }

    #[test]
    fn completion_content_is_trimmed() {
        let response = json!({
            "choices": [{"message": {"role": "assistant", "content": "\n## Overview\nHi\n  "}}]
        });
        assert_eq!(parse_completion(&response).unwrap(), "## Overview\nHi");
    }

    #[test]
    fn missing_or_empty_content_fails() {
        let err = parse_completion(&json!({"choices": []})).unwrap_err();
        assert!(matches!(err, TubenoteError::SummaryFailed { .. }));

        let response = json!({"choices": [{"message": {"content": "   "}}]});
        assert!(parse_completion(&response).is_err());
    }

    #[test]
    fn error_message_prefers_api_field() {
        let response = json!({"error": {"message": "Incorrect API key provided"}});
        assert_eq!(api_error_message(&response), "Incorrect API key provided");
    }
}
