//! Remote boundary for avatar verification, image editing and prompt authoring.

use async_trait::async_trait;
use shared::protocol::{AvatarVerdict, EncodedImage};
use thiserror::Error;

pub mod gemini;

pub use gemini::{GeminiConfig, GeminiSceneService};

/// Upper bound on images in a single edit request.
pub const MAX_EDIT_IMAGES: usize = 4;

#[derive(Debug, Error)]
pub enum SceneServiceError {
    #[error("Scene service request failed: {0}")]
    Transport(String),
    #[error("Scene service returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Scene service returned an unreadable response: {0}")]
    InvalidResponse(String),
    #[error("Invalid scene request: {0}")]
    InvalidRequest(String),
    #[error("Scene service unavailable: {0}")]
    Unavailable(String),
}

impl SceneServiceError {
    pub fn is_retryable(&self) -> bool {
        match self {
            SceneServiceError::Transport(_) => true,
            SceneServiceError::Http { status, .. } => {
                matches!(status, 429 | 500 | 502 | 503 | 504)
            }
            _ => false,
        }
    }
}

/// The four remote operations the wizard depends on.
///
/// `edit_image` returning `Ok(None)` means the model produced no image; callers treat
/// it as terminal for that call, the same as an `Err`.
#[async_trait]
pub trait SceneService: Send + Sync {
    async fn verify_is_avatar(
        &self,
        image: &EncodedImage,
    ) -> Result<AvatarVerdict, SceneServiceError>;
    async fn edit_image(
        &self,
        images: &[EncodedImage],
        prompt: &str,
        hd: bool,
    ) -> Result<Option<String>, SceneServiceError>;
    async fn generate_surprise_prompt(
        &self,
        images: &[EncodedImage],
    ) -> Result<String, SceneServiceError>;
    async fn enhance_prompt(
        &self,
        images: &[EncodedImage],
        current_prompt: &str,
    ) -> Result<String, SceneServiceError>;
}

/// Stand-in used when no API key is configured. Every call fails.
pub struct UnavailableSceneService {
    reason: String,
}

impl UnavailableSceneService {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SceneService for UnavailableSceneService {
    async fn verify_is_avatar(
        &self,
        _image: &EncodedImage,
    ) -> Result<AvatarVerdict, SceneServiceError> {
        Err(SceneServiceError::Unavailable(self.reason.clone()))
    }

    async fn edit_image(
        &self,
        _images: &[EncodedImage],
        _prompt: &str,
        _hd: bool,
    ) -> Result<Option<String>, SceneServiceError> {
        Err(SceneServiceError::Unavailable(self.reason.clone()))
    }

    async fn generate_surprise_prompt(
        &self,
        _images: &[EncodedImage],
    ) -> Result<String, SceneServiceError> {
        Err(SceneServiceError::Unavailable(self.reason.clone()))
    }

    async fn enhance_prompt(
        &self,
        _images: &[EncodedImage],
        _current_prompt: &str,
    ) -> Result<String, SceneServiceError> {
        Err(SceneServiceError::Unavailable(self.reason.clone()))
    }
}
