//! Image attachment for picture-based tasks.
//!
//! The core only cares whether an image is attached; the payload is passed
//! through untouched to the generation service.

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

use crate::error::AttachmentError;

#[derive(Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

impl std::fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("mime_type", &self.mime_type)
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl ImageAttachment {
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Result<Self, AttachmentError> {
        if bytes.is_empty() {
            return Err(AttachmentError::Empty);
        }
        Ok(Self {
            mime_type: mime_type.into(),
            data: BASE64_STANDARD.encode(bytes),
        })
    }

    /// Parse `data:<mime>;base64,<payload>`. A missing MIME type defaults to
    /// `image/png`.
    pub fn from_data_url(url: &str) -> Result<Self, AttachmentError> {
        let rest = url.strip_prefix("data:").ok_or(AttachmentError::NotDataUrl)?;
        let (header, payload) = rest.split_once(',').ok_or(AttachmentError::NotDataUrl)?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(AttachmentError::NotDataUrl)?;
        if payload.is_empty() {
            return Err(AttachmentError::Empty);
        }
        Ok(Self {
            mime_type: if mime.is_empty() { "image/png" } else { mime }.to_string(),
            data: payload.to_string(),
        })
    }

    /// Read an image file. The MIME type comes from the extension only.
    pub fn from_path(path: &Path) -> Result<Self, AttachmentError> {
        let bytes = std::fs::read(path)
            .map_err(|e| AttachmentError::Read(format!("{}: {e}", path.display())))?;
        Self::from_bytes(&bytes, mime_for_path(path))
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
