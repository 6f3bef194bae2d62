use crate::domain::ids::AttachmentId;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub file_name: String,
}

/// A local file waiting to be uploaded against a history record.
#[derive(Clone, PartialEq, Eq)]
pub struct StagedFile {
    file_name: String,
    content: Vec<u8>,
}

impl StagedFile {
    pub fn new(file_name: &str, content: Vec<u8>) -> Result<Self, CoreError> {
        let trimmed = file_name.trim();
        if trimmed.is_empty() {
            return Err(CoreError::EmptyFileName);
        }
        Ok(Self {
            file_name: trimmed.to_string(),
            content,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

impl fmt::Debug for StagedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedFile")
            .field("file_name", &self.file_name)
            .field("len", &self.content.len())
            .finish()
    }
}
