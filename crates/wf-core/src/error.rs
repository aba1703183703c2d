use crate::content::DebugMetadata;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct WeftError {
    pub code: String,
    pub message: String,
    pub metadata: Option<DebugMetadata>,
}

impl WeftError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(
        code: impl Into<String>,
        message: impl Into<String>,
        metadata: DebugMetadata,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            metadata: Some(metadata),
        }
    }

    pub fn or_metadata(mut self, metadata: Option<DebugMetadata>) -> Self {
        if self.metadata.is_none() {
            self.metadata = metadata;
        }
        self
    }
}
