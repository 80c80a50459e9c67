//! The zoom/comparison overlay: compare two faces, view one enlarged.
//!
//! # Slots
//!
//! ```text
//! ┌────────┐ ┌──────────────────┐
//! │ upper  │ │                  │
//! ├────────┤ │       main       │
//! │ lower  │ │                  │
//! └────────┘ └──────────────────┘
//! ```
//!
//! While browsing, `upper` and `lower` show two neighbouring ordinals of the
//! ring and `main` shows whichever of them the user picked. The invariants:
//!
//! - at most one of `upper`/`lower` is chosen;
//! - a slot is chosen exactly when its ordinal equals `main`'s.
//!
//! Paging moves the visible pair around the ring without touching `main`, so
//! after a rotation the chosen mark can land on the other slot or disappear
//! entirely (the enlarged face scrolled out of the pair). [`rotate`] is the
//! pure function implementing that; the overlay methods only wrap it.
//!
//! # Processing mode
//!
//! During a swap the same overlay shows the user's photo (upper) and the
//! chosen face (lower), both marked, with a status or the composited result
//! in `main`. Slots cannot be selected or paged in that mode.

use crate::image_source::ImageSource;
use crate::notice::Notice;
use crate::ring::{Direction, GalleryRing, step};
use crate::types::{ExampleFace, PartGallery};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayError {
    #[error("the {0} slot is not showing an example face")]
    SlotUnavailable(SlotKind),
    #[error("paging is not available for this gallery")]
    PagingSuppressed,
    #[error("no example face is chosen in the overlay")]
    NothingChosen,
    #[error("the overlay cannot be closed while a photo is being processed")]
    Blocked,
}

/// One of the two comparison slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Upper,
    Lower,
}

impl std::fmt::Display for SlotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotKind::Upper => f.write_str("upper"),
            SlotKind::Lower => f.write_str("lower"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonSlot {
    pub face_ordinal: usize,
    pub image: ImageSource,
    pub is_chosen: bool,
}

/// The enlarged face.
#[derive(Debug, Clone, PartialEq)]
pub struct MainSlot {
    pub face_ordinal: usize,
    pub image: ImageSource,
}

/// Slot contents while browsing a gallery.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseState {
    pub upper: ComparisonSlot,
    pub lower: ComparisonSlot,
    pub main: MainSlot,
    /// Paging controls shown; false for galleries of two faces or fewer.
    pub paging: bool,
}

impl BrowseState {
    pub fn slot(&self, which: SlotKind) -> &ComparisonSlot {
        match which {
            SlotKind::Upper => &self.upper,
            SlotKind::Lower => &self.lower,
        }
    }

    /// The slot currently marked chosen, if any.
    pub fn chosen(&self) -> Option<SlotKind> {
        if self.upper.is_chosen {
            Some(SlotKind::Upper)
        } else if self.lower.is_chosen {
            Some(SlotKind::Lower)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingStatus {
    InProgress,
    Done(ImageSource),
    Failed(Notice),
}

/// Slot contents while a swap is handled.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingView {
    pub user_photo: ImageSource,
    pub chosen_face: ImageSource,
    pub status: ProcessingStatus,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum OverlayView {
    #[default]
    Closed,
    Browse(BrowseState),
    Processing(ProcessingView),
}

fn slot(gallery: &PartGallery, ordinal: usize, main: usize) -> ComparisonSlot {
    ComparisonSlot {
        face_ordinal: ordinal,
        image: gallery.faces[ordinal].image.clone(),
        is_chosen: ordinal == main,
    }
}

/// Move the visible pair one step around the ring.
///
/// `Next` shifts lower into upper and brings in the ordinal after it;
/// `Previous` shifts upper into lower and brings in the ordinal before it.
/// `main` is untouched and chosen-ness is recomputed from it, so it follows
/// the ordinal rather than the slot. When both slots show the same ordinal
/// (a one-face ring) only upper is marked.
pub fn rotate(state: &BrowseState, direction: Direction, gallery: &PartGallery) -> BrowseState {
    let size = gallery.len();
    let (upper, lower) = match direction {
        Direction::Next => {
            let upper = state.lower.face_ordinal;
            (upper, step(upper, Direction::Next, size))
        }
        Direction::Previous => {
            let lower = state.upper.face_ordinal;
            (step(lower, Direction::Previous, size), lower)
        }
    };
    let main = state.main.face_ordinal;
    let upper = slot(gallery, upper, main);
    let mut lower = slot(gallery, lower, main);
    lower.is_chosen &= !upper.is_chosen;
    BrowseState {
        upper,
        lower,
        main: state.main.clone(),
        paging: state.paging,
    }
}

#[derive(Debug, Default)]
pub struct ComparisonOverlay {
    view: OverlayView,
}

impl ComparisonOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &OverlayView {
        &self.view
    }

    pub fn browse_state(&self) -> Option<&BrowseState> {
        match &self.view {
            OverlayView::Browse(state) => Some(state),
            _ => None,
        }
    }

    /// Open on the ring's current face: main and upper show it (upper
    /// chosen), lower shows the next one.
    pub fn open_for_browse(&mut self, ring: &GalleryRing, gallery: &PartGallery) {
        let current = ring.current_ordinal();
        let next = ring.neighbour(current, Direction::Next);
        let upper = slot(gallery, current, current);
        let mut lower = slot(gallery, next, current);
        lower.is_chosen &= !upper.is_chosen;
        self.view = OverlayView::Browse(BrowseState {
            main: MainSlot {
                face_ordinal: current,
                image: upper.image.clone(),
            },
            upper,
            lower,
            paging: ring.size() > 2,
        });
    }

    /// Mark `which` chosen and enlarge it.
    pub fn select_slot(&mut self, which: SlotKind) -> Result<(), OverlayError> {
        let OverlayView::Browse(state) = &mut self.view else {
            return Err(OverlayError::SlotUnavailable(which));
        };
        state.upper.is_chosen = which == SlotKind::Upper;
        state.lower.is_chosen = which == SlotKind::Lower;
        let picked = state.slot(which);
        state.main = MainSlot {
            face_ordinal: picked.face_ordinal,
            image: picked.image.clone(),
        };
        Ok(())
    }

    pub fn page_forward(&mut self, gallery: &PartGallery) -> Result<(), OverlayError> {
        self.page(Direction::Next, gallery)
    }

    pub fn page_backward(&mut self, gallery: &PartGallery) -> Result<(), OverlayError> {
        self.page(Direction::Previous, gallery)
    }

    fn page(&mut self, direction: Direction, gallery: &PartGallery) -> Result<(), OverlayError> {
        match &mut self.view {
            OverlayView::Browse(state) if state.paging => {
                *state = rotate(state, direction, gallery);
                Ok(())
            }
            _ => Err(OverlayError::PagingSuppressed),
        }
    }

    /// Write the enlarged face back into the ring and close the overlay.
    ///
    /// Fails without touching the ring when no slot is chosen.
    pub fn commit<'g>(
        &mut self,
        ring: &mut GalleryRing,
        gallery: &'g PartGallery,
    ) -> Result<&'g ExampleFace, OverlayError> {
        let ordinal = match &self.view {
            OverlayView::Browse(state) if state.chosen().is_some() => state.main.face_ordinal,
            _ => return Err(OverlayError::NothingChosen),
        };
        ring.jump_to(ordinal as i64);
        self.view = OverlayView::Closed;
        Ok(&gallery.faces[ring.current_ordinal()])
    }

    /// Close without committing. Not allowed while a swap is in progress.
    pub fn close(&mut self) -> Result<(), OverlayError> {
        if self.is_screen_blocked() {
            return Err(OverlayError::Blocked);
        }
        self.view = OverlayView::Closed;
        Ok(())
    }

    /// Switch to processing mode for a swap that was just submitted.
    pub fn start_processing(&mut self, user_photo: ImageSource, chosen_face: ImageSource) {
        self.view = OverlayView::Processing(ProcessingView {
            user_photo,
            chosen_face,
            status: ProcessingStatus::InProgress,
        });
    }

    /// Show the swap's outcome in the main slot.
    pub fn finish_processing(&mut self, status: ProcessingStatus) {
        if let OverlayView::Processing(view) = &mut self.view {
            view.status = status;
        }
    }

    /// True while a swap is in flight: the rest of the UI ignores input.
    pub fn is_screen_blocked(&self) -> bool {
        matches!(
            &self.view,
            OverlayView::Processing(ProcessingView {
                status: ProcessingStatus::InProgress,
                ..
            })
        )
    }

    /// The composited result currently shown, which is also the download target.
    pub fn displayed_result(&self) -> Option<&ImageSource> {
        match &self.view {
            OverlayView::Processing(ProcessingView {
                status: ProcessingStatus::Done(image),
                ..
            }) => Some(image),
            _ => None,
        }
    }
}
