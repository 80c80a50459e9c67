//! Cyclic cursor over the active part's example faces.
//!
//! The ring only stores the gallery size and a cursor. Navigation wraps in
//! both directions:
//!
//! ```text
//! next     = (cursor + 1) mod size
//! previous = (size + cursor - 1) mod size
//! ```
//!
//! A ring is never built over an empty gallery, so `size >= 1` always holds
//! and the arithmetic above is total.

use crate::backend::Backend;
use crate::cache::{GalleryCache, GalleryError};
use crate::types::PartGallery;

/// Navigation direction, shared by the ring and the overlay's paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryRing {
    part: String,
    size: usize,
    cursor: usize,
}

impl GalleryRing {
    /// Load `part` through the cache and build a fresh ring at ordinal 0.
    ///
    /// On failure nothing is built; the caller's current ring stays valid.
    pub async fn activate<B>(
        cache: &mut GalleryCache,
        backend: &B,
        part: &str,
    ) -> Result<Self, GalleryError>
    where
        B: Backend + ?Sized,
    {
        let gallery = cache.fetch(backend, part).await?;
        Self::from_gallery(gallery)
    }

    /// Build a ring at ordinal 0 over an already loaded gallery.
    pub fn from_gallery(gallery: &PartGallery) -> Result<Self, GalleryError> {
        if gallery.is_empty() {
            return Err(GalleryError::Empty(gallery.part.clone()));
        }
        Ok(Self {
            part: gallery.part.clone(),
            size: gallery.len(),
            cursor: 0,
        })
    }

    pub fn part(&self) -> &str {
        &self.part
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn current_ordinal(&self) -> usize {
        self.cursor
    }

    /// Move the cursor one step. A single-face ring stays where it is.
    pub fn advance(&mut self, direction: Direction) {
        self.cursor = self.neighbour(self.cursor, direction);
    }

    /// Set the cursor to `ordinal mod size`; negative ordinals wrap backwards.
    pub fn jump_to(&mut self, ordinal: i64) {
        self.cursor = ordinal.rem_euclid(self.size as i64) as usize;
    }

    /// The ordinal one step away from `from`.
    pub fn neighbour(&self, from: usize, direction: Direction) -> usize {
        step(from, direction, self.size)
    }
}

/// One circular step over `size` ordinals. `size` must be non-zero.
pub fn step(from: usize, direction: Direction, size: usize) -> usize {
    match direction {
        Direction::Next => (from + 1) % size,
        Direction::Previous => (size + from - 1) % size,
    }
}
