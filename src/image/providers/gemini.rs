//! Gemini (Google) `generateContent` backend.

use crate::error::{sanitize_error_message, NanoCanvasError, Result};
use crate::image::provider::ContentBackend;
use crate::image::types::{Candidate, ContentResponse, RequestPart, ResponsePart};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variables consulted for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GOOGLE_API_KEY", "API_KEY"];

/// Gemini image model variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Nano Banana - Gemini 2.5 Flash Image (fast, economical).
    #[default]
    NanoBanana,
    /// Nano Banana Pro - Gemini 3 Pro Image (highest quality).
    NanoBananaPro,
    /// Any other model identifier, sent as given.
    Custom(String),
}

impl GeminiModel {
    /// The named variants.
    pub const KNOWN: [GeminiModel; 2] = [Self::NanoBanana, Self::NanoBananaPro];

    /// Returns the API model identifier.
    pub fn as_str(&self) -> &str {
        match self {
            Self::NanoBanana => "gemini-2.5-flash-image",
            Self::NanoBananaPro => "gemini-3-pro-image-preview",
            Self::Custom(id) => id,
        }
    }

    /// Short user-facing alias. Custom models use their identifier.
    pub fn alias(&self) -> &str {
        match self {
            Self::NanoBanana => "nano-banana",
            Self::NanoBananaPro => "nano-banana-pro",
            Self::Custom(id) => id,
        }
    }

    /// Looks a named variant up by alias or API identifier.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::KNOWN
            .into_iter()
            .find(|m| m.alias() == name || m.as_str() == name)
    }

    /// Resolves a name to a named variant, or to [`GeminiModel::Custom`].
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::from_name(&id).unwrap_or(Self::Custom(id))
    }
}

impl std::fmt::Display for GeminiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Builder for [`GeminiBackend`].
#[derive(Debug, Clone, Default)]
pub struct GeminiBackendBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    base_url: Option<String>,
}

impl GeminiBackendBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GOOGLE_API_KEY`, then `API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Sets the model by alias or raw API identifier.
    pub fn model_id(mut self, id: impl Into<String>) -> Self {
        self.model = GeminiModel::from_id(id);
        self
    }

    /// Overrides the API root (proxies, regional endpoints).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the backend, resolving the API key.
    pub fn build(self) -> Result<GeminiBackend> {
        let api_key = self
            .api_key
            .or_else(|| {
                API_KEY_ENV_VARS
                    .iter()
                    .find_map(|var| std::env::var(var).ok())
            })
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                NanoCanvasError::Auth("GOOGLE_API_KEY not set and no API key provided".into())
            })?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(GeminiBackend {
            client: reqwest::Client::new(),
            api_key,
            model: self.model,
            base_url,
        })
    }
}

/// Gemini `generateContent` backend.
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
    model: GeminiModel,
    base_url: String,
}

impl GeminiBackend {
    /// Creates a new `GeminiBackendBuilder`.
    pub fn builder() -> GeminiBackendBuilder {
        GeminiBackendBuilder::new()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            self.model.as_str(),
        )
    }

    fn parse_error(&self, status: u16, text: &str) -> NanoCanvasError {
        let text = sanitize_error_message(text);
        match status {
            401 | 403 => NanoCanvasError::Auth(text),
            404 => NanoCanvasError::Api {
                status,
                message: format!("Model {} not found", self.model.as_str()),
            },
            _ => NanoCanvasError::Api {
                status,
                message: text,
            },
        }
    }
}

#[async_trait]
impl ContentBackend for GeminiBackend {
    async fn generate_content(&self, parts: Vec<RequestPart>) -> Result<ContentResponse> {
        let body = GeminiRequest::from_parts(parts);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(self.parse_error(status.as_u16(), &text));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&text)?;
        Ok(gemini_response.into_content_response())
    }

    fn model(&self) -> &str {
        self.model.as_str()
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<&'static str>,
}

impl GeminiRequest {
    fn from_parts(parts: Vec<RequestPart>) -> Self {
        let parts = parts
            .into_iter()
            .map(|part| match part {
                RequestPart::InlineData { mime_type, data } => GeminiRequestPart::InlineData {
                    inline_data: GeminiInlineData { mime_type, data },
                },
                RequestPart::Text(text) => GeminiRequestPart::Text { text },
            })
            .collect();

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE", "TEXT"],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<GeminiInlineData>,
}

impl GeminiPartResponse {
    fn into_part(self) -> Option<ResponsePart> {
        if let Some(inline) = self.inline_data {
            return Some(ResponsePart::Image {
                mime_type: inline.mime_type,
                data: inline.data,
            });
        }
        self.text.map(|content| ResponsePart::Text { content })
    }
}

impl GeminiResponse {
    fn into_content_response(self) -> ContentResponse {
        let block_reason = self.prompt_feedback.and_then(|feedback| {
            match (feedback.block_reason, feedback.block_reason_message) {
                (Some(reason), Some(message)) => Some(format!("{}: {}", reason, message)),
                (Some(reason), None) => Some(reason),
                (None, _) => None,
            }
        });

        let candidates = self
            .candidates
            .into_iter()
            .map(|candidate| Candidate {
                parts: candidate
                    .content
                    .map(|content| {
                        content
                            .parts
                            .into_iter()
                            .filter_map(GeminiPartResponse::into_part)
                            .collect()
                    })
                    .unwrap_or_default(),
                finish_reason: candidate.finish_reason,
            })
            .collect();

        ContentResponse {
            candidates,
            block_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ContentResponse {
        serde_json::from_str::<GeminiResponse>(json)
            .unwrap()
            .into_content_response()
    }

    #[test]
    fn test_gemini_model_as_str() {
        assert_eq!(GeminiModel::NanoBanana.as_str(), "gemini-2.5-flash-image");
        assert_eq!(
            GeminiModel::NanoBananaPro.as_str(),
            "gemini-3-pro-image-preview"
        );
    }

    #[test]
    fn test_gemini_model_default() {
        assert_eq!(GeminiModel::default(), GeminiModel::NanoBanana);
    }

    #[test]
    fn test_gemini_model_from_name() {
        assert_eq!(
            GeminiModel::from_name("nano-banana-pro"),
            Some(GeminiModel::NanoBananaPro)
        );
        assert_eq!(
            GeminiModel::from_name("gemini-2.5-flash-image"),
            Some(GeminiModel::NanoBanana)
        );
        assert_eq!(GeminiModel::from_name("dall-e-3"), None);
    }

    #[test]
    fn test_gemini_model_from_id_falls_back_to_custom() {
        let id = "gemini-2.0-flash-preview-image-generation";
        let model = GeminiModel::from_id(id);
        assert_eq!(model, GeminiModel::Custom(id.to_string()));
        assert_eq!(model.as_str(), id);
        assert_eq!(
            GeminiModel::from_id("nano-banana-pro"),
            GeminiModel::NanoBananaPro
        );
    }

    #[test]
    fn test_builder_with_custom_model_id() {
        let backend = GeminiBackendBuilder::new()
            .api_key("test-key")
            .model_id("gemini-2.0-flash-preview-image-generation")
            .build()
            .unwrap();
        assert_eq!(backend.model(), "gemini-2.0-flash-preview-image-generation");
        assert_eq!(
            backend.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-preview-image-generation:generateContent"
        );
    }

    #[test]
    fn test_builder_with_explicit_key() {
        let backend = GeminiBackendBuilder::new()
            .api_key("test-key")
            .model(GeminiModel::NanoBananaPro)
            .base_url("http://localhost:8080/")
            .build()
            .unwrap();
        assert_eq!(backend.model(), "gemini-3-pro-image-preview");
        assert_eq!(
            backend.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-3-pro-image-preview:generateContent"
        );
    }

    #[test]
    fn test_builder_rejects_blank_key() {
        let err = GeminiBackendBuilder::new().api_key("  ").build().err().unwrap();
        assert!(matches!(err, NanoCanvasError::Auth(_)));
    }

    #[test]
    fn test_request_generation_mode() {
        let req = GeminiRequest::from_parts(vec![RequestPart::Text("A puppy".into())]);
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["contents"][0]["parts"][0]["text"], "A puppy");
        assert_eq!(json["contents"][0]["parts"].as_array().unwrap().len(), 1);
        assert_eq!(
            json["generationConfig"]["responseModalities"],
            serde_json::json!(["IMAGE", "TEXT"])
        );
        assert!(json.get("generation_config").is_none());
    }

    #[test]
    fn test_request_edit_mode_uses_camel_case() {
        let req = GeminiRequest::from_parts(vec![
            RequestPart::InlineData {
                mime_type: "image/jpeg".into(),
                data: "AAAA".into(),
            },
            RequestPart::Text("Make it blue".into()),
        ]);
        let json = serde_json::to_value(&req).unwrap();
        let parts = &json["contents"][0]["parts"];

        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[0]["inlineData"]["data"], "AAAA");
        assert_eq!(parts[1]["text"], "Make it blue");
    }

    #[test]
    fn test_response_mixed_parts_keep_order() {
        let resp = parse(
            r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here you go"},
                        {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
                    ]
                },
                "finishReason": "STOP"
            }]
        }"#,
        );
        assert_eq!(resp.candidates.len(), 1);
        assert_eq!(resp.candidates[0].finish_reason.as_deref(), Some("STOP"));
        assert_eq!(
            resp.candidates[0].parts,
            vec![
                ResponsePart::Text {
                    content: "Here you go".into()
                },
                ResponsePart::Image {
                    mime_type: "image/png".into(),
                    data: "iVBORw0KGgo=".into()
                },
            ]
        );
    }

    #[test]
    fn test_response_missing_mime_type_is_empty() {
        let resp = parse(
            r#"{"candidates": [{"content": {"parts": [{"inlineData": {"data": "AAAA"}}]}}]}"#,
        );
        assert_eq!(
            resp.candidates[0].parts[0],
            ResponsePart::Image {
                mime_type: String::new(),
                data: "AAAA".into()
            }
        );
    }

    #[test]
    fn test_response_drops_empty_parts() {
        let resp = parse(r#"{"candidates": [{"content": {"parts": [{}]}}]}"#);
        assert!(resp.candidates[0].parts.is_empty());
    }

    #[test]
    fn test_response_candidate_without_content() {
        let resp = parse(r#"{"candidates": [{"finishReason": "IMAGE_SAFETY"}]}"#);
        assert_eq!(
            resp.candidates[0].finish_reason.as_deref(),
            Some("IMAGE_SAFETY")
        );
        assert!(resp.candidates[0].parts.is_empty());
    }

    #[test]
    fn test_response_with_prompt_feedback_block() {
        let resp = parse(
            r#"{
            "promptFeedback": {
                "blockReason": "SAFETY",
                "blockReasonMessage": "Prompt was blocked due to safety"
            }
        }"#,
        );
        assert!(resp.candidates.is_empty());
        assert_eq!(
            resp.block_reason.as_deref(),
            Some("SAFETY: Prompt was blocked due to safety")
        );
    }

    #[test]
    fn test_parse_error_statuses() {
        let backend = GeminiBackend::builder().api_key("k").build().unwrap();

        assert!(matches!(
            backend.parse_error(403, "forbidden"),
            NanoCanvasError::Auth(_)
        ));
        match backend.parse_error(500, "internal\n  error") {
            NanoCanvasError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "internal error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
