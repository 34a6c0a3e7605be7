//! Preview handles: locally created, revocable references to an uploaded file.
//!
//! A [`PreviewHandle`] revokes itself when dropped, so replacing, removing or clearing
//! the owning slot releases the handle exactly once.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex},
};

use tracing::warn;

use crate::encoding::{file_to_encoded_data, ImageFile};

pub trait PreviewStore: Send + Sync {
    /// Creates a preview for `file` and returns its URL.
    fn create(&self, file: &ImageFile) -> String;
    fn revoke(&self, url: &str);
}

pub struct PreviewHandle {
    url: String,
    store: Arc<dyn PreviewStore>,
}

impl PreviewHandle {
    pub fn acquire(store: &Arc<dyn PreviewStore>, file: &ImageFile) -> Self {
        Self {
            url: store.create(file),
            store: Arc::clone(store),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.store.revoke(&self.url);
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewHandle").field("url", &self.url).finish()
    }
}

/// A file together with the preview created from it.
#[derive(Debug)]
pub struct ImageSlot {
    pub(crate) file: ImageFile,
    pub(crate) preview: PreviewHandle,
}

impl ImageSlot {
    pub fn new(file: ImageFile, store: &Arc<dyn PreviewStore>) -> Self {
        let preview = PreviewHandle::acquire(store, &file);
        Self { file, preview }
    }

    pub fn file(&self) -> &ImageFile {
        &self.file
    }

    pub fn preview_url(&self) -> &str {
        self.preview.url()
    }
}

/// In-process store mapping `blob:` style URLs to data URLs.
#[derive(Default)]
pub struct LocalPreviewStore {
    entries: Mutex<HashMap<String, String>>,
}

impl LocalPreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the data URL behind a live preview.
    pub fn resolve(&self, url: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(url)
            .cloned()
    }

    pub fn live_count(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl PreviewStore for LocalPreviewStore {
    fn create(&self, file: &ImageFile) -> String {
        let url = format!("blob:snapscene/{}", uuid::Uuid::new_v4());
        let data_url = format!(
            "data:{};base64,{}",
            file.mime_type(),
            file_to_encoded_data(file)
        );
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(url.clone(), data_url);
        url
    }

    fn revoke(&self, url: &str) {
        let removed = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(url);
        if removed.is_none() {
            warn!(url, "revoked a preview that was not live");
        }
    }
}
