//! Base64 data URLs: the image representation shared with the backend.
//!
//! Every image crossing the wire (example faces, the user's photo, the
//! composited result) is a data URL with a MIME prefix:
//!
//! ```text
//! data:image/png;base64,iVBORw0KGgo...
//! data:image/jpeg;base64,/9j/4AAQSkZJRg...
//! ```
//!
//! [`ImageSource`] validates that shape once, on construction, so the MIME
//! type and file extension can be read back without re-checking. The payload
//! sits behind an `Arc<str>`: gallery slots, the overlay and the selection all
//! hold the same image without copying a multi-megabyte string around.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageSourceError {
    #[error("image source is not a data URL")]
    NotDataUrl,
    #[error("data URL has no base64 payload marker")]
    NotBase64,
    #[error("data URL MIME type '{0}' is not an image type")]
    NotImage(String),
    #[error("data URL MIME type '{0}' carries parameters")]
    MimeParameters(String),
    #[error("invalid base64 payload: {0}")]
    Payload(String),
}

/// A validated `data:<mime>;base64,<payload>` image. The MIME type is a
/// bare `image/<subtype>` without parameters.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageSource {
    url: Arc<str>,
    /// Byte offset of the `;base64,` marker inside `url`.
    marker: usize,
}

impl ImageSource {
    /// Validate and wrap a data URL.
    pub fn parse(url: impl Into<String>) -> Result<Self, ImageSourceError> {
        let url = url.into();
        if !url.starts_with(DATA_PREFIX) {
            return Err(ImageSourceError::NotDataUrl);
        }
        let marker = url.find(BASE64_MARKER).ok_or(ImageSourceError::NotBase64)?;
        let mime = &url[DATA_PREFIX.len()..marker];
        if mime.contains(';') {
            return Err(ImageSourceError::MimeParameters(mime.to_string()));
        }
        match mime.split_once('/') {
            Some(("image", subtype)) if !subtype.is_empty() => {}
            _ => return Err(ImageSourceError::NotImage(mime.to_string())),
        }
        Ok(Self {
            url: url.into(),
            marker,
        })
    }

    /// Encode raw image bytes under the given MIME type.
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Result<Self, ImageSourceError> {
        Self::parse(format!(
            "{DATA_PREFIX}{mime}{BASE64_MARKER}{}",
            BASE64.encode(bytes)
        ))
    }

    /// The full data URL.
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// MIME type from the prefix, e.g. `image/png`.
    pub fn mime_type(&self) -> &str {
        &self.url[DATA_PREFIX.len()..self.marker]
    }

    /// File extension derived from the MIME subtype, e.g. `png` or `jpeg`.
    pub fn extension(&self) -> &str {
        let mime = self.mime_type();
        mime.split_once('/').map_or(mime, |(_, subtype)| subtype)
    }

    /// The base64 payload, without the prefix.
    pub fn payload(&self) -> &str {
        &self.url[self.marker + BASE64_MARKER.len()..]
    }

    /// Decode the payload into raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>, ImageSourceError> {
        BASE64
            .decode(self.payload())
            .map_err(|e| ImageSourceError::Payload(e.to_string()))
    }
}

impl TryFrom<String> for ImageSource {
    type Error = ImageSourceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ImageSource> for String {
    fn from(value: ImageSource) -> Self {
        value.url.to_string()
    }
}

// Payloads are huge; keep debug output readable.
impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ImageSource({}, {} bytes)",
            self.mime_type(),
            self.payload().len()
        )
    }
}
