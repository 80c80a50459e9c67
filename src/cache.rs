//! Per-part gallery cache.
//!
//! Loading a part's example faces is a backend round trip carrying every
//! image of the part as base64. This module keeps each successfully loaded
//! gallery for the rest of the session so switching back to a part is free.
//!
//! # Contract
//!
//! - A part with `loaded = true` is served from memory: no backend access,
//!   no side effects beyond the hit counter.
//! - A miss issues exactly one "load example faces" call. On success the
//!   records are stored in backend order, ordinals assigned by position.
//! - A failed call stores nothing, so the next explicit attempt retries.
//! - Entries are never removed. A session reload drops the whole cache.
//!
//! The event loop cannot hold `&mut GalleryCache` across the network call
//! (other events must keep flowing), so besides [`GalleryCache::fetch`] the
//! cache exposes the two halves separately: [`GalleryCache::get`] for the
//! hit path and [`GalleryCache::insert`] to store a completed load.

use crate::backend::{Backend, BackendError, ExampleFaceRecord};
use crate::types::PartGallery;
use log::{debug, warn};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GalleryError {
    #[error("failed to load example faces for '{part}': {source}")]
    Transport {
        part: String,
        #[source]
        source: BackendError,
    },
    #[error("part '{0}' has no example faces")]
    Empty(String),
}

#[derive(Debug, Default)]
pub struct GalleryCache {
    galleries: HashMap<String, PartGallery>,
    stats: CacheStats,
}

impl GalleryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the gallery for `part`, loading it through `backend` on a miss.
    pub async fn fetch<B>(&mut self, backend: &B, part: &str) -> Result<&PartGallery, GalleryError>
    where
        B: Backend + ?Sized,
    {
        if self.is_loaded(part) {
            self.stats.hit();
            debug!("gallery cache hit for '{part}'");
            return Ok(&self.galleries[part]);
        }
        match backend.load_example_faces(part).await {
            Ok(records) => Ok(self.insert(part, records)),
            Err(source) => Err(self.record_failure(part, source)),
        }
    }

    /// Cache-hit lookup. Counts as a hit when the part is present.
    pub fn get(&mut self, part: &str) -> Option<&PartGallery> {
        let gallery = self.galleries.get(part).filter(|g| g.loaded)?;
        self.stats.hit();
        debug!("gallery cache hit for '{part}'");
        Some(gallery)
    }

    /// Store a freshly loaded gallery and return it.
    ///
    /// A part already present is kept as is: galleries are immutable once
    /// loaded.
    pub fn insert(&mut self, part: &str, records: Vec<ExampleFaceRecord>) -> &PartGallery {
        match self.galleries.entry(part.to_string()) {
            Entry::Occupied(entry) => {
                debug!("'{part}' already cached, dropping {} records", records.len());
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                self.stats.miss();
                debug!("loaded {} example faces for '{part}'", records.len());
                entry.insert(PartGallery::from_records(part, records))
            }
        }
    }

    /// Log and count a failed load; nothing is stored.
    pub fn record_failure(&mut self, part: &str, source: BackendError) -> GalleryError {
        self.stats.failure();
        warn!("during loading example faces for '{part}' an error occurred: {source}");
        GalleryError::Transport {
            part: part.to_string(),
            source,
        }
    }

    pub fn is_loaded(&self, part: &str) -> bool {
        self.galleries.get(part).is_some_and(|g| g.loaded)
    }

    /// Read-only access that does not touch the counters.
    pub fn peek(&self, part: &str) -> Option<&PartGallery> {
        self.galleries.get(part)
    }

    /// Names of all loaded parts, sorted.
    pub fn parts(&self) -> Vec<&str> {
        let mut parts: Vec<&str> = self.galleries.keys().map(String::as_str).collect();
        parts.sort_unstable();
        parts
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

/// Summary of cache behaviour over a session.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
    pub failures: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn failure(&mut self) {
        self.failures += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses + self.failures
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(f, "{} cached, {} fetched", self.hits, self.misses)?;
        } else {
            write!(f, "{} fetched", self.misses)?;
        }
        if self.failures > 0 {
            write!(f, ", {} failed", self.failures)?;
        }
        if self.hits > 0 || self.failures > 0 {
            write!(f, " ({} total)", self.total())?;
        }
        Ok(())
    }
}
