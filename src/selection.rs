//! The user's current choices and the two in-flight guards.
//!
//! One `SelectionState` exists per session. It is mutated only through the
//! session's action handlers; the guards are handed out as RAII values so a
//! pending gallery load or swap job holds its flag until it resolves.

use crate::guard::{InFlightFlag, Operation};
use crate::image_source::ImageSource;
use crate::swap::SwapJob;
use crate::types::{ExampleFace, FaceId};
use thiserror::Error;

/// A submission is missing something the user has to supply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("You haven't chosen your photo.")]
    MissingPhoto,
    #[error("You haven't chosen {part} you want to have.")]
    MissingFace { part: String },
}

/// The example face picked for the swap, with its preview image.
#[derive(Debug, Clone, PartialEq)]
pub struct ChosenFace {
    pub id: FaceId,
    pub image: ImageSource,
}

impl From<&ExampleFace> for ChosenFace {
    fn from(face: &ExampleFace) -> Self {
        Self {
            id: face.id,
            image: face.image.clone(),
        }
    }
}

#[derive(Debug)]
pub struct SelectionState {
    active_part: String,
    chosen_face: Option<ChosenFace>,
    user_photo: Option<ImageSource>,
    part_load: InFlightFlag,
    swap: InFlightFlag,
}

impl SelectionState {
    pub fn new(default_part: &str) -> Self {
        Self {
            active_part: default_part.to_string(),
            chosen_face: None,
            user_photo: None,
            part_load: InFlightFlag::new(Operation::PartLoad),
            swap: InFlightFlag::new(Operation::Swap),
        }
    }

    pub fn active_part(&self) -> &str {
        &self.active_part
    }

    pub fn chosen_face(&self) -> Option<&ChosenFace> {
        self.chosen_face.as_ref()
    }

    pub fn user_photo(&self) -> Option<&ImageSource> {
        self.user_photo.as_ref()
    }

    /// Make `part` active. Any previously chosen face belonged to the old
    /// part and is cleared.
    pub fn set_active_part(&mut self, part: &str) {
        self.active_part = part.to_string();
        self.chosen_face = None;
    }

    pub fn choose(&mut self, face: &ExampleFace) {
        self.chosen_face = Some(ChosenFace::from(face));
    }

    pub fn set_user_photo(&mut self, photo: ImageSource) {
        self.user_photo = Some(photo);
    }

    pub fn part_load_flag(&self) -> &InFlightFlag {
        &self.part_load
    }

    pub fn swap_flag(&self) -> &InFlightFlag {
        &self.swap
    }

    pub fn part_load_in_flight(&self) -> bool {
        self.part_load.is_set()
    }

    pub fn swap_in_flight(&self) -> bool {
        self.swap.is_set()
    }

    /// Both a photo and a face are present, so the swap control can be offered.
    pub fn swap_ready(&self) -> bool {
        self.user_photo.is_some() && self.chosen_face.is_some()
    }

    /// Build a swap job from the current choices.
    ///
    /// The photo is checked first; with both missing the photo is reported.
    pub fn validate_submission(&self) -> Result<SwapJob, ValidationError> {
        let photo = self.user_photo.as_ref().ok_or(ValidationError::MissingPhoto)?;
        let face = self
            .chosen_face
            .as_ref()
            .ok_or_else(|| ValidationError::MissingFace {
                part: self.active_part.clone(),
            })?;
        Ok(SwapJob {
            part: self.active_part.clone(),
            face_id: face.id,
            user_photo: photo.clone(),
        })
    }
}
