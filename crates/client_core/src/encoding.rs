//! Image files and their text encoding for the remote service.

use std::{path::Path, sync::Arc};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use shared::protocol::EncodedImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to read image '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("'{path}' is not an image (detected {mime_type})")]
    NotAnImage { path: String, mime_type: String },
}

/// An uploaded file. Bytes are shared so cloning out of the session stays cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    name: String,
    mime_type: String,
    bytes: Arc<[u8]>,
}

impl ImageFile {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, EncodeError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        if !mime_type.starts_with("image/") {
            return Err(EncodeError::NotAnImage {
                path: display,
                mime_type,
            });
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| EncodeError::Read {
                path: display.clone(),
                source,
            })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or(display);
        Ok(Self::new(name, mime_type, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Pure, deterministic text encoding of a file's bytes.
pub fn file_to_encoded_data(file: &ImageFile) -> String {
    STANDARD.encode(file.bytes())
}

pub fn encode_image(file: &ImageFile) -> EncodedImage {
    EncodedImage {
        data: file_to_encoded_data(file),
        mime_type: file.mime_type().to_string(),
    }
}

pub fn encode_all<'a>(files: impl IntoIterator<Item = &'a ImageFile>) -> Vec<EncodedImage> {
    files.into_iter().map(encode_image).collect()
}
