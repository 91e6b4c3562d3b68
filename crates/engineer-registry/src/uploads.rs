//! Acceptance rules for files attached to evidence items.
//!
//! Storage is handled elsewhere; this module only decides whether a file may be attached and
//! produces the opaque [`DocumentRef`] kept on the evidence item.

use serde::{Deserialize, Serialize};
use std::path::Path;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// File metadata as reported by the upload collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: String,
    pub size_bytes: u64,
}

/// Reference stored on an evidence item once an upload is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub name: String,
    pub content_type: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("file '{0}' has no extension")]
    MissingExtension(String),
    #[error("extension '.{extension}' is not allowed (expected one of {allowed})")]
    ExtensionNotAllowed { extension: String, allowed: String },
    #[error("file is {size_bytes} bytes, limit is {max_size_mb} MB")]
    TooLarge { size_bytes: u64, max_size_mb: u32 },
    #[error("file is empty")]
    Empty,
    #[error("content type '{0}' is not a valid MIME type")]
    InvalidContentType(String),
    #[error("declared content type '{declared}' does not match '{expected}' for this extension")]
    ContentTypeMismatch { declared: String, expected: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    allowed_extensions: Vec<&'static str>,
    max_size_mb: u32,
}

impl UploadPolicy {
    pub fn new(allowed_extensions: Vec<&'static str>, max_size_mb: u32) -> Self {
        Self {
            allowed_extensions,
            max_size_mb,
        }
    }

    /// Degree certificates, licences, and similar scans.
    pub fn certificates() -> Self {
        Self::new(vec!["pdf", "jpg", "jpeg", "png"], 5)
    }

    /// Accreditation packs and other institutional paperwork.
    pub fn institutional_documents() -> Self {
        Self::new(vec!["pdf", "doc", "docx", "jpg", "jpeg", "png"], 10)
    }

    pub fn max_size_mb(&self) -> u32 {
        self.max_size_mb
    }

    pub fn accept(&self, file: &UploadedFile) -> Result<DocumentRef, UploadError> {
        let extension = Path::new(&file.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| UploadError::MissingExtension(file.name.clone()))?;

        if !self.allowed_extensions.contains(&extension.as_str()) {
            return Err(UploadError::ExtensionNotAllowed {
                extension,
                allowed: self.allowed_extensions.join(", "),
            });
        }

        if file.size_bytes == 0 {
            return Err(UploadError::Empty);
        }

        if file.size_bytes > u64::from(self.max_size_mb) * BYTES_PER_MB {
            return Err(UploadError::TooLarge {
                size_bytes: file.size_bytes,
                max_size_mb: self.max_size_mb,
            });
        }

        let declared: mime::Mime = file
            .content_type
            .parse()
            .map_err(|_| UploadError::InvalidContentType(file.content_type.clone()))?;

        let guesses = mime_guess::from_ext(&extension);
        if !guesses.is_empty()
            && !guesses
                .iter()
                .any(|guess| guess.essence_str() == declared.essence_str())
        {
            let expected = guesses
                .first()
                .map(|guess| guess.essence_str().to_string())
                .unwrap_or_default();
            return Err(UploadError::ContentTypeMismatch {
                declared: declared.essence_str().to_string(),
                expected,
            });
        }

        Ok(DocumentRef {
            name: file.name.clone(),
            content_type: declared.essence_str().to_string(),
            size_bytes: file.size_bytes,
        })
    }
}
