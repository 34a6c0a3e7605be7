use serde::{Deserialize, Serialize};

/// Image content in the text encoding the remote service accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    pub data: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarVerdict {
    pub is_avatar: bool,
    /// Only meaningful when `is_avatar` is false.
    #[serde(default)]
    pub reason: String,
}

impl AvatarVerdict {
    pub fn accepted() -> Self {
        Self {
            is_avatar: true,
            reason: String::new(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            is_avatar: false,
            reason: reason.into(),
        }
    }
}

/// A generated image as base64-encoded PNG bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub png_b64: String,
}

impl GeneratedImage {
    pub fn new(png_b64: impl Into<String>) -> Self {
        Self {
            png_b64: png_b64.into(),
        }
    }

    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", self.png_b64)
    }
}
