mod batch;
pub mod paths;
pub mod resolver;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::category::Category;
use crate::index::IndexError;

pub use batch::UploadOrchestrator;
pub use resolver::{FolderResolver, ResolutionCache};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid upload: {0}")]
    Validation(String),
    #[error("remote error: {0}")]
    Remote(#[from] drivetree_core::DriveError),
    #[error("index error: {0}")]
    Index(#[from] IndexError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One file of a batch as received from the client.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub original_name: String,
    pub content: Vec<u8>,
    pub content_type: String,
    pub size: u64,
}

impl UploadFile {
    pub fn new(
        original_name: impl Into<String>,
        content: Vec<u8>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            size: content.len() as u64,
            content,
            content_type: content_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StructureEntry {
    #[serde(rename = "originalname")]
    pub original_name: String,
    #[serde(rename = "relativePath", default)]
    pub relative_path: Option<String>,
}

/// Client-side relative paths of a batch, looked up by original file name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct StructureDescriptor {
    entries: Vec<StructureEntry>,
}

impl StructureDescriptor {
    pub fn new(entries: Vec<StructureEntry>) -> Self {
        Self { entries }
    }

    pub fn from_json(raw: &str) -> Result<Self, UploadError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw)
            .map_err(|err| UploadError::Validation(format!("malformed structure descriptor: {err}")))
    }

    /// First entry for `original_name` wins.
    pub fn relative_path(&self, original_name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.original_name == original_name)
            .and_then(|entry| entry.relative_path.as_deref())
            .filter(|path| !path.is_empty())
    }

    pub fn entries(&self) -> &[StructureEntry] {
        &self.entries
    }
}

/// Per-file result returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub id: i64,
    pub filename: String,
    pub remote_file_id: String,
    pub category: Category,
    pub web_view_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareSettings {
    pub role: String,
    pub scope: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSettings {
    pub root_folder_id: String,
    /// Sharing applied to each new file; `None` leaves files private.
    pub share: Option<ShareSettings>,
    pub convert_office_documents: bool,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            root_folder_id: drivetree_core::ROOT_FOLDER_ID.to_string(),
            share: Some(ShareSettings {
                role: "writer".to_string(),
                scope: "anyone".to_string(),
            }),
            convert_office_documents: true,
        }
    }
}
