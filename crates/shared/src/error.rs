use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The remote service classified the upload as not an avatar.
    Rejected,
    /// A remote call raised.
    Remote,
    /// A remote call completed but produced nothing usable.
    EmptyResult,
}

/// User-visible error surfaced by the wizard. Every kind is recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct FlowError {
    pub kind: ErrorKind,
    pub message: String,
}

impl FlowError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn rejected(reason: &str) -> Self {
        Self::new(
            ErrorKind::Rejected,
            format!("Image rejected: {reason}. Please use a Bitmoji-style avatar."),
        )
    }

    pub fn remote(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            return Self::new(ErrorKind::Remote, "An unknown error occurred.");
        }
        Self::new(ErrorKind::Remote, message)
    }

    pub fn empty_result(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EmptyResult, message)
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
