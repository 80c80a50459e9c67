//! Shared test utilities for the unit test suite.
//!
//! Builders for wire records, galleries and photos so tests can describe a
//! gallery by its face ids alone:
//!
//! ```text
//! let gallery = gallery("lips", 3);          // ids 1, 2, 3 → ordinals 0, 1, 2
//! let ring = GalleryRing::from_gallery(&gallery).unwrap();
//! overlay.open_for_browse(&ring, &gallery);
//! ```

use crate::backend::ExampleFaceRecord;
use crate::backend::tests::MockBackend;
use crate::config::ClientConfig;
use crate::image_source::ImageSource;
use crate::session::Session;
use crate::types::{FaceId, PartGallery};
use std::sync::Arc;

/// A tiny valid data URL whose payload encodes `tag`.
pub fn image(tag: &str) -> ImageSource {
    ImageSource::from_bytes("image/png", tag.as_bytes()).unwrap()
}

/// Wire records with the given ids, named `face-<id>`.
pub fn face_records(ids: &[i64]) -> Vec<ExampleFaceRecord> {
    ids.iter()
        .map(|&id| ExampleFaceRecord {
            id: FaceId(id),
            name: format!("face-{id}"),
            source: image(&format!("face-{id}")),
        })
        .collect()
}

/// A loaded gallery of `size` faces with ids `1..=size`.
pub fn gallery(part: &str, size: usize) -> PartGallery {
    let ids: Vec<i64> = (1..=size as i64).collect();
    PartGallery::from_records(part, face_records(&ids))
}

/// A user photo as the upload collaborator would hand it over.
pub fn user_photo() -> ImageSource {
    ImageSource::from_bytes("image/jpeg", b"user photo").unwrap()
}

/// A session over `backend` with stock config.
pub fn session_with(backend: MockBackend) -> (Session, Arc<MockBackend>) {
    let backend = Arc::new(backend);
    let session = Session::new(ClientConfig::default(), backend.clone());
    (session, backend)
}

// =========================================================================
// Assertions
// =========================================================================

/// Assert the ordinals shown in the overlay's (upper, lower, main) slots.
#[track_caller]
pub fn assert_slots(
    state: &crate::overlay::BrowseState,
    upper: usize,
    lower: usize,
    main: usize,
) {
    let actual = (
        state.upper.face_ordinal,
        state.lower.face_ordinal,
        state.main.face_ordinal,
    );
    assert_eq!(
        actual,
        (upper, lower, main),
        "(upper, lower, main) ordinals differ"
    );
}
