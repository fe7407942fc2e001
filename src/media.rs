//! Data URI helpers and inline media payloads.
//!
//! These are pure string operations. Payloads are carried as base64 text and
//! are never validated, so malformed input passes through untouched.

use crate::error::{GenLabError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image formats recognised from file contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
}

impl ImageFormat {
    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }
        None
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// An image payload ready to be embedded in a request: base64 text plus MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    /// Full MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Base64 payload, without any `data:` prefix.
    pub data: String,
}

impl InlineImage {
    /// Creates a payload from a MIME type and base64 text.
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Splits a data URI into payload and MIME type.
    ///
    /// Input without a `data:<mime>;base64,` prefix is kept verbatim as the
    /// payload and labelled `image/png`.
    pub fn from_data_uri(uri: &str) -> Self {
        let (mime_type, payload) = split_data_uri(uri);
        Self::new(mime_type, payload)
    }

    /// Encodes raw bytes, detecting the format from magic bytes (PNG if unknown).
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let format = ImageFormat::from_magic_bytes(bytes).unwrap_or_default();
        Self::new(
            format.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(bytes),
        )
    }

    /// Reads an image file and encodes it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Re-encodes the payload as `data:<mime>;base64,<data>`.
    pub fn to_data_uri(&self) -> String {
        to_data_uri(&self.mime_type, &self.data)
    }

    /// Decodes the base64 payload into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| GenLabError::Decode(e.to_string()))
    }
}

/// Strips a `data:<mime>;base64,` prefix, returning the MIME type and payload.
///
/// Without such a prefix the MIME type defaults to `image/png` and the input
/// is returned unchanged.
pub fn split_data_uri(uri: &str) -> (&str, &str) {
    match parse_data_uri(uri) {
        Some((mime_type, payload)) if !mime_type.is_empty() => (mime_type, payload),
        _ => (ImageFormat::Png.mime_type(), uri),
    }
}

/// Builds `data:<mime>;base64,<payload>`.
pub fn to_data_uri(mime_type: &str, payload: &str) -> String {
    format!("data:{mime_type};base64,{payload}")
}

/// Parses any `data:<mime>;base64,<payload>` URI into its MIME type and payload.
pub fn parse_data_uri(uri: &str) -> Option<(&str, &str)> {
    uri.strip_prefix("data:")?.split_once(";base64,")
}

/// Decodes the bytes of a base64 data URI (e.g. a generated image) so it can be saved.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let (mime_type, payload) = parse_data_uri(uri)
        .ok_or_else(|| GenLabError::Decode("not a base64 data URI".into()))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| GenLabError::Decode(e.to_string()))?;
    Ok((mime_type.to_string(), bytes))
}
