//! The compositing backend as seen from the client.
//!
//! The [`Backend`] trait is the seam for the two remote calls the core makes:
//!
//! | Call | Request | Response |
//! |---|---|---|
//! | **Load example faces** | `{partOfFace}` | `{example_faces: [{id, name, source}]}` |
//! | **Process photo** | `{activePartOfFace, inputPhoto, faceId}` | `{face_detected_successfully, img_src?, number_of_detected_faces?}` |
//!
//! The production implementation is [`HttpBackend`] (form POST, JSON reply).
//! Neither call is retried or cancelled here; the swap timeout is applied by
//! the caller in [`crate::swap`].

mod http;

pub use http::HttpBackend;

use crate::image_source::ImageSource;
use crate::types::FaceId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("backend responded with status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// One example face as sent by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleFaceRecord {
    pub id: FaceId,
    pub name: String,
    pub source: ImageSource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadFacesResponse {
    pub example_faces: Vec<ExampleFaceRecord>,
}

/// Form body of a swap request. Field names are the backend's.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessPhotoRequest {
    #[serde(rename = "activePartOfFace")]
    pub active_part: String,
    #[serde(rename = "inputPhoto")]
    pub input_photo: ImageSource,
    #[serde(rename = "faceId")]
    pub face_id: FaceId,
}

/// Reply to a swap request.
///
/// The documented shapes are `{true, img_src}` and `{false,
/// number_of_detected_faces}`; anything else is classified by
/// [`crate::swap::classify_response`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessPhotoResponse {
    pub face_detected_successfully: bool,
    #[serde(default)]
    pub img_src: Option<ImageSource>,
    #[serde(default)]
    pub number_of_detected_faces: Option<i64>,
}

/// Remote procedures the client core depends on.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetch the ordered example faces of one part.
    async fn load_example_faces(&self, part: &str) -> Result<Vec<ExampleFaceRecord>, BackendError>;

    /// Submit a swap job and wait for the composited result.
    async fn process_photo(
        &self,
        request: &ProcessPhotoRequest,
    ) -> Result<ProcessPhotoResponse, BackendError>;
}
