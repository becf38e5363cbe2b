use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reference to an immutable blob held by the file storage collaborator.
/// The bytes behind it are never interpreted by the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileRef(pub String);

impl FileRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentType {
    PowerOfAttorney,
    Certificate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub file: FileRef,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(doc_type: DocumentType, file: FileRef, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            doc_type,
            file,
            created_at,
        }
    }
}
