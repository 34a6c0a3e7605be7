//! Gemini REST implementation of [`SceneService`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use shared::protocol::{AvatarVerdict, EncodedImage};
use tracing::{debug, warn};
use url::Url;

use crate::{SceneService, SceneServiceError, MAX_EDIT_IMAGES};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image-preview";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const VERIFY_INSTRUCTION: &str = "Decide whether this image is a cartoon avatar in the style \
of a Bitmoji: a stylised, illustrated character rather than a photograph, logo or landscape. \
Answer with JSON. Set isAvatar accordingly and, when it is not an avatar, give a short \
lower-case reason such as \"it looks like a photograph\".";

const SURPRISE_INSTRUCTION: &str = "These images show cartoon avatars. Invent one fun, vivid \
scene they could appear in together, described in a single sentence. Reply with the scene \
description only.";

const ENHANCE_INSTRUCTION: &str = "These images show cartoon avatars. Rewrite the scene \
description below so it is more vivid and specific about setting, lighting and mood while \
keeping its intent. Reply with the improved description only.";

const HD_CLAUSE: &str = " Render the final image in high definition with crisp, fine detail.";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    fn endpoint(&self, model: &str) -> Result<Url, SceneServiceError> {
        let mut base = self.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).map_err(|err| {
            SceneServiceError::InvalidRequest(format!("invalid base url '{base}': {err}"))
        })?;
        base.join(&format!("models/{model}:generateContent"))
            .map_err(|err| {
                SceneServiceError::InvalidRequest(format!("invalid model '{model}': {err}"))
            })
    }
}

#[derive(Clone)]
pub struct GeminiSceneService {
    client: Client,
    config: GeminiConfig,
}

impl GeminiSceneService {
    pub fn new(config: GeminiConfig) -> Result<Self, SceneServiceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| {
                SceneServiceError::Transport(format!("failed to build client: {err}"))
            })?;
        Ok(Self { client, config })
    }

    async fn send(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, SceneServiceError> {
        let url = self.config.endpoint(model)?;
        debug!(model, "sending gemini generateContent request");

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| SceneServiceError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            warn!(model, status = status.as_u16(), "gemini request rejected");
            return Err(map_http_error(status, &body_text));
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|err| SceneServiceError::InvalidResponse(err.to_string()))
    }
}

#[async_trait]
impl SceneService for GeminiSceneService {
    async fn verify_is_avatar(
        &self,
        image: &EncodedImage,
    ) -> Result<AvatarVerdict, SceneServiceError> {
        let request = GenerateContentRequest {
            contents: vec![user_content(std::slice::from_ref(image), VERIFY_INSTRUCTION)],
            generation_config: Some(GenerationConfig::json(verdict_schema())),
        };
        let response = self.send(&self.config.text_model, &request).await?;
        parse_verdict(&extract_text(response)?)
    }

    async fn edit_image(
        &self,
        images: &[EncodedImage],
        prompt: &str,
        hd: bool,
    ) -> Result<Option<String>, SceneServiceError> {
        if images.is_empty() || images.len() > MAX_EDIT_IMAGES {
            return Err(SceneServiceError::InvalidRequest(format!(
                "edit requires 1 to {MAX_EDIT_IMAGES} images, got {}",
                images.len()
            )));
        }

        let mut text = prompt.to_string();
        if hd {
            text.push_str(HD_CLAUSE);
        }
        let request = GenerateContentRequest {
            contents: vec![user_content(images, &text)],
            generation_config: Some(GenerationConfig::image_and_text()),
        };
        let response = self.send(&self.config.image_model, &request).await?;
        Ok(extract_inline_image(response))
    }

    async fn generate_surprise_prompt(
        &self,
        images: &[EncodedImage],
    ) -> Result<String, SceneServiceError> {
        let request = GenerateContentRequest {
            contents: vec![user_content(images, SURPRISE_INSTRUCTION)],
            generation_config: None,
        };
        let response = self.send(&self.config.text_model, &request).await?;
        Ok(extract_text(response)?.trim().to_string())
    }

    async fn enhance_prompt(
        &self,
        images: &[EncodedImage],
        current_prompt: &str,
    ) -> Result<String, SceneServiceError> {
        let instruction = format!("{ENHANCE_INSTRUCTION}\n\nScene: {current_prompt}");
        let request = GenerateContentRequest {
            contents: vec![user_content(images, &instruction)],
            generation_config: None,
        };
        let response = self.send(&self.config.text_model, &request).await?;
        Ok(extract_text(response)?.trim().to_string())
    }
}

fn user_content(images: &[EncodedImage], text: &str) -> Content {
    let mut parts: Vec<Part> = images
        .iter()
        .map(|image| Part::InlineData {
            inline_data: InlineData {
                mime_type: image.mime_type.clone(),
                data: image.data.clone(),
            },
        })
        .collect();
    parts.push(Part::Text {
        text: text.to_string(),
    });
    Content {
        role: "user".to_string(),
        parts,
    }
}

fn verdict_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "isAvatar": { "type": "BOOLEAN" },
            "reason": { "type": "STRING" }
        },
        "required": ["isAvatar", "reason"]
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
}

impl GenerationConfig {
    fn json(schema: serde_json::Value) -> Self {
        Self {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(schema),
            response_modalities: None,
        }
    }

    fn image_and_text() -> Self {
        Self {
            response_mime_type: None,
            response_schema: None,
            response_modalities: Some(vec!["IMAGE".to_string(), "TEXT".to_string()]),
        }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartResponse {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn response_parts(response: GenerateContentResponse) -> impl Iterator<Item = PartResponse> {
    response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
}

fn extract_text(response: GenerateContentResponse) -> Result<String, SceneServiceError> {
    let text: String = response_parts(response)
        .filter_map(|part| part.text)
        .collect::<Vec<_>>()
        .join("");
    if text.trim().is_empty() {
        return Err(SceneServiceError::InvalidResponse(
            "no text in the response candidates".into(),
        ));
    }
    Ok(text)
}

fn extract_inline_image(response: GenerateContentResponse) -> Option<String> {
    response_parts(response)
        .filter_map(|part| part.inline_data)
        .find(|inline| inline.mime_type.starts_with("image/") && !inline.data.is_empty())
        .map(|inline| inline.data)
}

fn parse_verdict(text: &str) -> Result<AvatarVerdict, SceneServiceError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str::<AvatarVerdict>(body.trim())
        .map_err(|err| SceneServiceError::InvalidResponse(format!("bad verdict json: {err}")))
}

fn map_http_error(status: StatusCode, body: &str) -> SceneServiceError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.to_string());

    SceneServiceError::Http {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
#[path = "tests/gemini_tests.rs"]
mod tests;
