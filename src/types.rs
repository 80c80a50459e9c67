//! Gallery data shared by the cache, the ring and the overlay.
//!
//! Galleries are created from the backend's wire records once per part and
//! never change afterwards. Ring and overlay refer into them by ordinal.

use crate::backend::ExampleFaceRecord;
use crate::image_source::ImageSource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend identifier of an example face (its database row id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceId(pub i64);

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One candidate image of a part.
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleFace {
    pub id: FaceId,
    pub name: String,
    pub image: ImageSource,
    /// Position within the part's gallery; the ring's navigable index.
    pub ordinal: usize,
}

/// All example faces of one part, in backend order.
#[derive(Debug, Clone, PartialEq)]
pub struct PartGallery {
    pub part: String,
    pub faces: Vec<ExampleFace>,
    pub loaded: bool,
}

impl PartGallery {
    /// Build a loaded gallery, assigning ordinals by list position.
    pub fn from_records(part: &str, records: Vec<ExampleFaceRecord>) -> Self {
        let faces = records
            .into_iter()
            .enumerate()
            .map(|(ordinal, record)| ExampleFace {
                id: record.id,
                name: record.name,
                image: record.source,
                ordinal,
            })
            .collect();
        Self {
            part: part.to_string(),
            faces,
            loaded: true,
        }
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn face(&self, ordinal: usize) -> Option<&ExampleFace> {
        self.faces.get(ordinal)
    }
}
