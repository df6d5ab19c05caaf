use std::path::Path;

use anyhow::Context;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{ThumbError, ThumbResult};

/// Self-contained reference to encoded image bytes, stored as a `data:` URI.
///
/// Templates embed these directly so they stay portable without any external file references.
/// The string doubles as the content address of the decoded pixels (see [`crate::ImageKey`]).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageSource(String);

impl ImageSource {
    /// Wrap an already-encoded `data:` URI without parsing it.
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Encode raw image file bytes; the MIME type is sniffed from the bytes.
    pub fn from_image_bytes(bytes: &[u8]) -> ThumbResult<Self> {
        let format = image::guess_format(bytes)
            .map_err(|e| ThumbError::decode(format!("unrecognized image format: {e}")))?;
        Ok(Self(DataUri::encode(format.to_mime_type(), bytes)))
    }

    /// Read an image file from disk and embed it.
    pub fn from_path(path: &Path) -> ThumbResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read image file '{}'", path.display()))?;
        Self::from_image_bytes(&bytes)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parse(&self) -> ThumbResult<DataUri> {
        DataUri::parse(&self.0)
    }
}

/// A parsed `data:<mime>;base64,<payload>` URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    pub fn encode(mime: &str, bytes: &[u8]) -> String {
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        format!("data:{mime};base64,{payload}")
    }

    /// Only base64 payloads are accepted; that is the only form the importer produces.
    pub fn parse(uri: &str) -> ThumbResult<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| ThumbError::validation("data URI must start with 'data:'"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ThumbError::validation("data URI is missing ',' separator"))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| ThumbError::validation("data URI payload must be base64"))?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| ThumbError::decode(format!("invalid base64 payload: {e}")))?;
        Ok(Self {
            mime: mime.to_string(),
            bytes,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/datauri.rs"]
mod tests;
