//! Notion API client and block/property serialization.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::{
    blocks::{Block, InlineSpan},
    config::NotionConfig,
    error::{Result, TubenoteError},
    format::{format_duration, summary_preview},
    pipeline::DocumentStore,
    types::{PageDraft, PublishedPage},
};

const NOTION_API_URL: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";
/// Notion rejects text objects longer than this
const MAX_TEXT_CHARS: usize = 2000;
/// Notion accepts at most this many children per request
const MAX_CHILDREN_PER_REQUEST: usize = 100;

const FALLBACK_CODE_LANGUAGE: &str = "plain text";
const CODE_LANGUAGES: &[&str] = &[
    "abap", "arduino", "bash", "basic", "c", "clojure", "coffeescript", "c++", "c#", "css",
    "dart", "diff", "docker", "elixir", "elm", "erlang", "flow", "fortran", "f#", "gherkin",
    "glsl", "go", "graphql", "groovy", "haskell", "html", "java", "javascript", "json", "julia",
    "kotlin", "latex", "less", "lisp", "livescript", "lua", "makefile", "markdown", "markup",
    "matlab", "mermaid", "nix", "objective-c", "ocaml", "pascal", "perl", "php", "plain text",
    "powershell", "prolog", "protobuf", "python", "r", "reason", "ruby", "rust", "sass", "scala",
    "scheme", "scss", "shell", "sql", "swift", "typescript", "vb.net", "verilog", "vhdl",
    "visual basic", "webassembly", "xml", "yaml",
];

/// Property name to property type, e.g. `"Name" -> "title"`
pub type DatabaseSchema = BTreeMap<String, String>;

fn text_object(content: &str) -> Value {
    json!({"type": "text", "text": {"content": content}})
}

/// Split a string into pieces of at most `max` chars
fn chunk_chars(text: &str, max: usize) -> Vec<&str> {
    if text.is_empty() {
        return vec![text];
    }
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == max {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    chunks.push(&text[start..]);
    chunks
}

/// Notion rich text array for a sequence of spans
pub fn rich_text(spans: &[InlineSpan]) -> Value {
    let objects = spans
        .iter()
        .flat_map(|span| {
            chunk_chars(&span.text, MAX_TEXT_CHARS)
                .into_iter()
                .map(move |piece| {
                    let mut object = text_object(piece);
                    if span.bold {
                        object["annotations"] = json!({"bold": true});
                    }
                    object
                })
        })
        .collect();
    Value::Array(objects)
}

/// Map a fence label to a language Notion accepts
pub fn notion_code_language(label: &str) -> &'static str {
    let label = label.trim().to_lowercase();
    let canonical = match label.as_str() {
        "py" | "python3" => "python",
        "js" | "jsx" | "node" => "javascript",
        "ts" | "tsx" => "typescript",
        "rs" => "rust",
        "sh" | "zsh" | "console" => "shell",
        "yml" => "yaml",
        "md" => "markdown",
        "cpp" | "cc" => "c++",
        "csharp" | "cs" => "c#",
        "golang" => "go",
        "rb" => "ruby",
        "kt" => "kotlin",
        "dockerfile" => "docker",
        "text" | "txt" | "plaintext" => FALLBACK_CODE_LANGUAGE,
        other => other,
    };
    CODE_LANGUAGES
        .iter()
        .find(|lang| **lang == canonical)
        .copied()
        .unwrap_or(FALLBACK_CODE_LANGUAGE)
}

pub fn block_to_json(block: &Block) -> Value {
    let kind = block.kind().notion_type();
    let content = match block {
        Block::Code { language, text } => json!({
            "rich_text": chunk_chars(text, MAX_TEXT_CHARS)
                .into_iter()
                .map(text_object)
                .collect::<Vec<_>>(),
            "language": notion_code_language(language),
        }),
        Block::Divider => json!({}),
        _ => json!({"rich_text": rich_text(block.spans())}),
    };

    let mut object = Map::new();
    object.insert("object".to_string(), json!("block"));
    object.insert("type".to_string(), json!(kind));
    object.insert(kind.to_string(), content);
    Value::Object(object)
}

pub fn blocks_to_json(blocks: &[Block]) -> Vec<Value> {
    blocks.iter().map(block_to_json).collect()
}

/// Read property types out of a `GET /databases/{id}` response
pub fn parse_schema(database: &Value) -> DatabaseSchema {
    database["properties"]
        .as_object()
        .map(|properties| {
            properties
                .iter()
                .filter_map(|(name, property)| {
                    property["type"]
                        .as_str()
                        .map(|kind| (name.clone(), kind.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn rich_text_property(content: &str) -> Value {
    json!({"rich_text": [text_object(content)]})
}

/// Fill whichever known properties the database has, with the type it expects
pub fn page_properties(schema: &DatabaseSchema, draft: &PageDraft) -> Map<String, Value> {
    let metadata = &draft.metadata;
    let mut properties = Map::new();

    for (name, kind) in schema {
        let value = match (name.as_str(), kind.as_str()) {
            ("Name" | "Title", "title") => Some(json!({"title": [text_object(&draft.title)]})),
            ("URL" | "Video URL", "url") => Some(json!({"url": metadata.url})),
            ("Summary" | "Content", "rich_text") => {
                Some(rich_text_property(&summary_preview(&draft.summary)))
            }
            ("Channel" | "Author", "rich_text") => metadata.byline().map(rich_text_property),
            ("Duration" | "Length", "number") => {
                Some(json!({"number": metadata.duration_seconds}))
            }
            ("Duration" | "Length", "rich_text") => (metadata.duration_seconds > 0)
                .then(|| rich_text_property(&format_duration(metadata.duration_seconds))),
            ("Views", "number") => Some(json!({"number": metadata.views})),
            ("Published Date" | "Publish Date", "date") => metadata
                .publish_date
                .as_ref()
                .map(|date| json!({"date": {"start": date}})),
            ("Published Date" | "Publish Date", "rich_text") => {
                metadata.publish_date.as_deref().map(rich_text_property)
            }
            _ => None,
        };
        if let Some(value) = value {
            properties.insert(name.clone(), value);
        }
    }

    // every database has exactly one title property, whatever it is called
    let has_title = properties.values().any(|v| v.get("title").is_some());
    if !has_title {
        if let Some((name, _)) = schema.iter().find(|(_, kind)| kind.as_str() == "title") {
            properties.insert(
                name.clone(),
                json!({"title": [text_object(&draft.title)]}),
            );
        }
    }

    properties
}

/// Classify a failed Notion response
pub fn api_error(status: StatusCode, body: &Value, database_id: &str) -> TubenoteError {
    let message = body["message"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string());

    match status {
        StatusCode::NOT_FOUND => TubenoteError::DatabaseNotFound {
            database_id: database_id.to_string(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TubenoteError::Unauthorized { message },
        _ => TubenoteError::NotionApi {
            status: status.as_u16(),
            message,
        },
    }
}

/// Read the created page out of a `POST /pages` response
pub fn published_page(page: &Value, title: &str) -> Result<PublishedPage> {
    let page_id = page["id"]
        .as_str()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| TubenoteError::NotionResponse {
            reason: format!("created page has no id: {}", page),
        })?;

    let url = page["url"]
        .as_str()
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("https://www.notion.so/{}", page_id.replace('-', "")));

    Ok(PublishedPage {
        page_id: page_id.to_string(),
        url,
        title: title.to_string(),
    })
}

pub struct NotionClient {
    client: reqwest::Client,
    api_key: String,
    database_id: String,
}

impl NotionClient {
    pub fn new(config: NotionConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key,
            database_id: config.database_id,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // error bodies may not be JSON
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            return Err(api_error(status, &body, &self.database_id));
        }
        Ok(response.json::<Value>().await?)
    }

    pub async fn database_schema(&self) -> Result<DatabaseSchema> {
        let url = format!("{}/databases/{}", NOTION_API_URL, self.database_id);
        let database = self.send(self.client.get(url)).await?;
        Ok(parse_schema(&database))
    }

    async fn create_page(&self, properties: Map<String, Value>, children: &[Value]) -> Result<Value> {
        let url = format!("{}/pages", NOTION_API_URL);
        let body = json!({
            "parent": {"database_id": self.database_id},
            "properties": properties,
            "children": children,
        });
        self.send(self.client.post(url).json(&body)).await
    }

    async fn append_children(&self, block_id: &str, children: &[Value]) -> Result<()> {
        let url = format!("{}/blocks/{}/children", NOTION_API_URL, block_id);
        self.send(self.client.patch(url).json(&json!({"children": children})))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for NotionClient {
    async fn publish(&self, draft: &PageDraft) -> Result<PublishedPage> {
        if draft.summary.trim().is_empty() {
            return Err(TubenoteError::MissingSummary);
        }

        let schema = self.database_schema().await?;
        let properties = page_properties(&schema, draft);
        let children = blocks_to_json(&draft.body());
        debug!(
            properties = properties.len(),
            blocks = children.len(),
            "creating notion page"
        );

        let mut batches = children.chunks(MAX_CHILDREN_PER_REQUEST);
        let page = self
            .create_page(properties, batches.next().unwrap_or(&[]))
            .await?;

        let published = published_page(&page, &draft.title)?;
        for batch in batches {
            self.append_children(&published.page_id, batch).await?;
        }

        info!(page_id = %published.page_id, url = %published.url, "notion page created");
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{blocks::convert_markdown, types::VideoMetadata};

    fn draft() -> PageDraft {
        let mut metadata = VideoMetadata::placeholder("dQw4w9WgXcQ", "https://youtu.be/dQw4w9WgXcQ");
        metadata.title = "Rust in 100 Seconds".to_string();
        metadata.channel = "Fireship".to_string();
        metadata.duration_seconds = 139;
        metadata.views = 42;
        metadata.publish_date = Some("2021-09-15".to_string());
        let summary = "## Overview\nRust is fast.".to_string();
        PageDraft {
            title: metadata.title.clone(),
            title_stage: None,
            blocks: convert_markdown(&summary),
            summary,
            metadata,
        }
    }

    fn schema(entries: &[(&str, &str)]) -> DatabaseSchema {
        entries
            .iter()
            .map(|(n, t)| (n.to_string(), t.to_string()))
            .collect()
    }

    #[test]
    fn paragraph_with_bold_span() {
        let block = &convert_markdown("Use **Rust** now")[0];
        assert_eq!(
            block_to_json(block),
            json!({
                "object": "block",
                "type": "paragraph",
                "paragraph": {"rich_text": [
                    {"type": "text", "text": {"content": "Use "}},
                    {"type": "text", "text": {"content": "Rust"}, "annotations": {"bold": true}},
                    {"type": "text", "text": {"content": " now"}},
                ]}
            })
        );
    }

    #[test]
    fn heading_code_and_divider_shapes() {
        let blocks = convert_markdown("### Deep\n```py\nx = 1\n```\n---");
        let json = blocks_to_json(&blocks);
        assert_eq!(json[0]["type"], "heading_3");
        assert_eq!(json[0]["heading_3"]["rich_text"][0]["text"]["content"], "Deep");
        assert_eq!(json[1]["code"]["language"], "python");
        assert_eq!(json[1]["code"]["rich_text"][0]["text"]["content"], "x = 1");
        assert_eq!(json[2], json!({"object": "block", "type": "divider", "divider": {}}));
    }

    #[test]
    fn unknown_code_languages_fall_back() {
        assert_eq!(notion_code_language("Rust"), "rust");
        assert_eq!(notion_code_language("plain text"), "plain text");
        assert_eq!(notion_code_language("brainfudge"), "plain text");
    }

    #[test]
    fn long_text_is_split_into_chunks() {
        let text = "x".repeat(4500);
        let value = rich_text(&[InlineSpan::bold(text)]);
        let pieces = value.as_array().unwrap();
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[2]["text"]["content"].as_str().unwrap().len(), 500);
        assert!(pieces.iter().all(|p| p["annotations"]["bold"] == true));
    }

    #[test]
    fn empty_span_keeps_one_text_object() {
        assert_eq!(rich_text(&[InlineSpan::plain("")]).as_array().unwrap().len(), 1);
    }

    #[test]
    fn schema_from_database_response() {
        let database = json!({"properties": {
            "Name": {"id": "title", "type": "title", "title": {}},
            "Views": {"id": "a1", "type": "number", "number": {}},
        }});
        assert_eq!(
            parse_schema(&database),
            schema(&[("Name", "title"), ("Views", "number")])
        );
        assert!(parse_schema(&json!({})).is_empty());
    }

    #[test]
    fn properties_follow_schema_types() {
        let schema = schema(&[
            ("Name", "title"),
            ("Video URL", "url"),
            ("Summary", "rich_text"),
            ("Channel", "rich_text"),
            ("Duration", "rich_text"),
            ("Views", "number"),
            ("Published Date", "date"),
            ("Tags", "multi_select"),
        ]);
        let properties = page_properties(&schema, &draft());

        assert_eq!(properties["Name"]["title"][0]["text"]["content"], "Rust in 100 Seconds");
        assert_eq!(properties["Video URL"]["url"], "https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(
            properties["Summary"]["rich_text"][0]["text"]["content"],
            "## Overview\nRust is fast...."
        );
        assert_eq!(properties["Channel"]["rich_text"][0]["text"]["content"], "Fireship");
        assert_eq!(properties["Duration"]["rich_text"][0]["text"]["content"], "2:19");
        assert_eq!(properties["Views"]["number"], 42);
        assert_eq!(properties["Published Date"]["date"]["start"], "2021-09-15");
        assert!(!properties.contains_key("Tags"));
    }

    #[test]
    fn mismatched_types_are_skipped() {
        let schema = schema(&[("Views", "rich_text"), ("Duration", "number"), ("Name", "title")]);
        let properties = page_properties(&schema, &draft());
        assert!(!properties.contains_key("Views"));
        assert_eq!(properties["Duration"]["number"], 139);
    }

    #[test]
    fn title_goes_to_renamed_title_property() {
        let properties = page_properties(&schema(&[("Video", "title")]), &draft());
        assert_eq!(properties["Video"]["title"][0]["text"]["content"], "Rust in 100 Seconds");
    }

    #[test]
    fn published_page_from_response() {
        let page = json!({
            "object": "page",
            "id": "59833787-2cf9-4fdf-8782-e53db20768a5",
            "url": "https://www.notion.so/Rust-59833787",
        });
        let published = published_page(&page, "Rust in 100 Seconds").unwrap();
        assert_eq!(published.page_id, "59833787-2cf9-4fdf-8782-e53db20768a5");
        assert_eq!(published.url, "https://www.notion.so/Rust-59833787");
        assert_eq!(published.title, "Rust in 100 Seconds");
    }

    #[test]
    fn page_url_is_derived_when_missing() {
        let page = json!({"id": "59833787-2cf9-4fdf-8782-e53db20768a5"});
        assert_eq!(
            published_page(&page, "t").unwrap().url,
            "https://www.notion.so/598337872cf94fdf8782e53db20768a5"
        );
    }

    #[test]
    fn response_without_page_id_is_an_error() {
        for page in [json!({"url": "https://www.notion.so/x"}), json!({"id": ""}), Value::Null] {
            let err = published_page(&page, "t").unwrap_err();
            assert!(matches!(err, TubenoteError::NotionResponse { .. }), "{page}");
        }
    }

    #[test]
    fn error_classification() {
        let body = json!({"object": "error", "message": "API token is invalid."});
        let id = "01234567-89ab-cdef-0123-456789abcdef";
        assert!(api_error(StatusCode::NOT_FOUND, &body, id).is_database_not_found());
        assert!(api_error(StatusCode::UNAUTHORIZED, &body, id).is_auth_failure());
        assert!(matches!(
            api_error(StatusCode::BAD_REQUEST, &body, id),
            TubenoteError::NotionApi { status: 400, ref message } if message == "API token is invalid."
        ));
    }
}
