//! One visitor's session: every piece of client state plus the action handlers.
//!
//! All user input arrives as a [`UiAction`] through [`Session::dispatch`].
//! Handlers are synchronous. The two remote calls are not made here; instead
//! a handler returns an [`Effect`] carrying a pending job that owns its
//! in-flight guard. The event loop runs the job and feeds the result back
//! through [`Session::finish_part_switch`] or [`Session::finish_swap`].
//!
//! Results are tagged with the session generation that started them. A
//! reload bumps the generation, so results of jobs started before a reload
//! are discarded instead of leaking into the fresh state.

use crate::backend::{Backend, BackendError, ExampleFaceRecord};
use crate::cache::{GalleryCache, GalleryError};
use crate::config::ClientConfig;
use crate::guard::{InFlightGuard, Operation, ReentrancyRejected};
use crate::image_source::ImageSource;
use crate::overlay::{ComparisonOverlay, OverlayError, SlotKind};
use crate::ring::{Direction, GalleryRing};
use crate::selection::SelectionState;
use crate::swap::{self, PendingSwap, SwapError, SwapJob, SwapOutcome, SwapPhase, SwapResolution};
use crate::types::{ExampleFace, PartGallery};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("no gallery is active yet")]
    NoGallery,
    #[error("the screen is blocked while a photo is being processed")]
    ScreenBlocked,
    #[error(transparent)]
    Overlay(#[from] OverlayError),
    #[error(transparent)]
    Swap(#[from] SwapError),
    #[error(transparent)]
    Busy(#[from] ReentrancyRejected),
    #[error(transparent)]
    Gallery(#[from] GalleryError),
}

impl SessionError {
    /// Errors the user caused and can fix, as opposed to dropped or failed work.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SessionError::Swap(SwapError::Validation(_))
                | SessionError::Overlay(OverlayError::NothingChosen)
        )
    }
}

/// Everything a user can do.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    /// Step the gallery ring.
    Navigate { direction: Direction },
    /// Choose the face the ring currently shows.
    ChooseCurrent,
    /// Open the comparison overlay on the current face.
    OpenOverlay,
    SelectSlot { which: SlotKind },
    PageOverlay { direction: Direction },
    /// Choose the overlay's enlarged face and close it.
    CommitSelection,
    CloseOverlay,
    SwitchPart { part: String },
    SupplyPhoto { photo: ImageSource },
    SubmitSwap,
}

/// Work a handler asks the event loop to run.
#[derive(Debug)]
pub enum Effect {
    None,
    LoadGallery(PendingGalleryLoad),
    RunSwap(SubmittedSwap),
}

/// A gallery fetch for a part that missed the cache. Holds the part-load guard.
pub struct PendingGalleryLoad {
    part: String,
    generation: u64,
    guard: InFlightGuard,
    backend: Arc<dyn Backend>,
}

impl std::fmt::Debug for PendingGalleryLoad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingGalleryLoad")
            .field("part", &self.part)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl PendingGalleryLoad {
    pub fn part(&self) -> &str {
        &self.part
    }

    pub async fn run(self) -> GalleryLoaded {
        let result = self.backend.load_example_faces(&self.part).await;
        GalleryLoaded {
            part: self.part,
            generation: self.generation,
            result,
            guard: self.guard,
        }
    }
}

/// A completed gallery fetch, still holding the part-load guard.
#[derive(Debug)]
pub struct GalleryLoaded {
    pub part: String,
    generation: u64,
    pub result: Result<Vec<ExampleFaceRecord>, BackendError>,
    guard: InFlightGuard,
}

/// A swap job started by this session.
#[derive(Debug)]
pub struct SubmittedSwap {
    generation: u64,
    swap: PendingSwap,
}

impl SubmittedSwap {
    pub fn job(&self) -> &SwapJob {
        self.swap.job()
    }

    pub async fn run(self) -> SwapFinished {
        SwapFinished {
            generation: self.generation,
            resolution: self.swap.run().await,
        }
    }
}

/// A swap result tagged with the generation that started it.
#[derive(Debug)]
pub struct SwapFinished {
    generation: u64,
    pub resolution: SwapResolution,
}

/// What the event loop has to do after a swap resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapReport {
    pub outcome: SwapOutcome,
    /// Set after transport errors: reload the session after this delay.
    pub reload_after: Option<Duration>,
}

pub struct Session {
    config: ClientConfig,
    backend: Arc<dyn Backend>,
    cache: GalleryCache,
    ring: Option<GalleryRing>,
    overlay: ComparisonOverlay,
    selection: SelectionState,
    phase: SwapPhase,
    alert: Option<String>,
    generation: u64,
}

impl Session {
    pub fn new(config: ClientConfig, backend: Arc<dyn Backend>) -> Self {
        let selection = SelectionState::new(&config.default_part);
        Self {
            config,
            backend,
            cache: GalleryCache::new(),
            ring: None,
            overlay: ComparisonOverlay::new(),
            selection,
            phase: SwapPhase::Idle,
            alert: None,
            generation: 0,
        }
    }

    /// Activate the default part. Call once after construction.
    pub fn start(&mut self) -> Result<Effect, SessionError> {
        let part = self.config.default_part.clone();
        self.begin_part_switch(&part)
    }

    /// Drop all in-memory state and start over on the default part.
    pub fn reload(&mut self) -> Result<Effect, SessionError> {
        info!("reloading session");
        self.generation += 1;
        self.cache = GalleryCache::new();
        self.ring = None;
        self.overlay = ComparisonOverlay::new();
        self.selection = SelectionState::new(&self.config.default_part);
        self.phase = SwapPhase::Idle;
        self.alert = None;
        self.start()
    }

    pub fn dispatch(&mut self, action: UiAction) -> Result<Effect, SessionError> {
        self.alert = None;
        if self.overlay.is_screen_blocked() && !matches!(action, UiAction::SubmitSwap) {
            debug!("ignoring {action:?} while the screen is blocked");
            return Err(SessionError::ScreenBlocked);
        }
        let result = self.apply(action);
        if let Err(e) = &result {
            self.note_failure(e);
        }
        result
    }

    fn apply(&mut self, action: UiAction) -> Result<Effect, SessionError> {
        match action {
            UiAction::Navigate { direction } => {
                self.ring.as_mut().ok_or(SessionError::NoGallery)?.advance(direction);
                Ok(Effect::None)
            }
            UiAction::ChooseCurrent => {
                let face = self.current_face().cloned().ok_or(SessionError::NoGallery)?;
                self.selection.choose(&face);
                Ok(Effect::None)
            }
            UiAction::OpenOverlay => {
                let ring = self.ring.as_ref().ok_or(SessionError::NoGallery)?;
                let gallery = self.cache.peek(ring.part()).ok_or(SessionError::NoGallery)?;
                self.overlay.open_for_browse(ring, gallery);
                Ok(Effect::None)
            }
            UiAction::SelectSlot { which } => {
                self.overlay.select_slot(which)?;
                Ok(Effect::None)
            }
            UiAction::PageOverlay { direction } => {
                let ring = self.ring.as_ref().ok_or(SessionError::NoGallery)?;
                let gallery = self.cache.peek(ring.part()).ok_or(SessionError::NoGallery)?;
                match direction {
                    Direction::Next => self.overlay.page_forward(gallery)?,
                    Direction::Previous => self.overlay.page_backward(gallery)?,
                }
                Ok(Effect::None)
            }
            UiAction::CommitSelection => self.commit_selection(),
            UiAction::CloseOverlay => {
                self.overlay.close()?;
                Ok(Effect::None)
            }
            UiAction::SwitchPart { part } => self.begin_part_switch(&part),
            UiAction::SupplyPhoto { photo } => {
                info!("user photo supplied ({})", photo.mime_type());
                self.selection.set_user_photo(photo);
                Ok(Effect::None)
            }
            UiAction::SubmitSwap => self.begin_swap(),
        }
    }

    fn note_failure(&mut self, error: &SessionError) {
        match error {
            e if e.is_validation() => {
                warn!("{e}");
                self.alert = Some(e.to_string());
            }
            SessionError::Busy(e) | SessionError::Swap(SwapError::Busy(e)) => {
                warn!("dropped: {e}");
            }
            e => debug!("action failed: {e}"),
        }
    }

    fn commit_selection(&mut self) -> Result<Effect, SessionError> {
        let ring = self.ring.as_mut().ok_or(SessionError::NoGallery)?;
        let gallery = self.cache.peek(ring.part()).ok_or(SessionError::NoGallery)?;
        let face = self.overlay.commit(ring, gallery)?;
        info!("chose {} face {}", gallery.part, face.name);
        self.selection.choose(face);
        Ok(Effect::None)
    }

    // =========================================================================
    // Part switching
    // =========================================================================

    /// Switch to `part`: served from the cache when loaded, otherwise a
    /// gallery fetch is returned for the event loop to run.
    pub fn begin_part_switch(&mut self, part: &str) -> Result<Effect, SessionError> {
        let guard = self.selection.part_load_flag().try_acquire()?;
        if self.cache.get(part).is_some() {
            self.activate_loaded(part)?;
            drop(guard);
            return Ok(Effect::None);
        }
        info!("loading example faces for '{part}'");
        Ok(Effect::LoadGallery(PendingGalleryLoad {
            part: part.to_string(),
            generation: self.generation,
            guard,
            backend: Arc::clone(&self.backend),
        }))
    }

    /// Apply a completed fetch. The part-load guard is released on return.
    pub fn finish_part_switch(&mut self, loaded: GalleryLoaded) -> Result<(), SessionError> {
        let GalleryLoaded {
            part,
            generation,
            result,
            guard: _guard,
        } = loaded;
        if generation != self.generation {
            debug!("discarding gallery for '{part}' from before a reload");
            return Ok(());
        }
        match result {
            Ok(records) => {
                self.cache.insert(&part, records);
                self.activate_loaded(&part)
            }
            Err(source) => Err(self.cache.record_failure(&part, source).into()),
        }
    }

    /// Rebuild ring and overlay for a cached part. A failure leaves the
    /// previous part active.
    fn activate_loaded(&mut self, part: &str) -> Result<(), SessionError> {
        let gallery = self.cache.peek(part).ok_or(SessionError::NoGallery)?;
        let ring = GalleryRing::from_gallery(gallery)?;
        debug!("activated '{part}' with {} faces", ring.size());
        self.ring = Some(ring);
        self.overlay = ComparisonOverlay::new();
        self.selection.set_active_part(part);
        Ok(())
    }

    // =========================================================================
    // Swapping
    // =========================================================================

    fn begin_swap(&mut self) -> Result<Effect, SessionError> {
        // The incoming gallery would reset the chosen face and the overlay
        if self.selection.part_load_in_flight() {
            return Err(ReentrancyRejected(Operation::PartLoad).into());
        }
        // A rejected re-entry must leave the running job's phase alone
        let busy = self.selection.swap_in_flight();
        if !busy {
            self.phase = SwapPhase::Validating;
        }
        let pending = match swap::begin(&self.selection, Arc::clone(&self.backend), self.timeout())
        {
            Ok(pending) => pending,
            Err(e) => {
                if !busy {
                    self.phase = SwapPhase::Idle;
                }
                return Err(e.into());
            }
        };
        if let Some(face) = self.selection.chosen_face() {
            self.overlay
                .start_processing(pending.job().user_photo.clone(), face.image.clone());
        }
        self.phase = SwapPhase::Submitting;
        Ok(Effect::RunSwap(SubmittedSwap {
            generation: self.generation,
            swap: pending,
        }))
    }

    /// Apply a swap's outcome and release the swap guard.
    ///
    /// Returns `None` when the result predates a reload.
    pub fn finish_swap(&mut self, finished: SwapFinished) -> Option<SwapReport> {
        let outcome = finished.resolution.release();
        if finished.generation != self.generation {
            debug!("discarding swap result from before a reload");
            return None;
        }
        self.phase = outcome.phase();
        self.overlay.finish_processing(outcome.processing_status());
        match &outcome {
            SwapOutcome::Succeeded { .. } => info!("swap succeeded"),
            other => {
                if let Some(notice) = other.notice() {
                    warn!("swap failed: {notice}");
                }
            }
        }
        let reload_after = outcome
            .needs_reload()
            .then(|| self.config.swap.reload_delay());
        Some(SwapReport {
            outcome,
            reload_after,
        })
    }

    fn timeout(&self) -> Duration {
        self.config.swap.timeout()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn ring(&self) -> Option<&GalleryRing> {
        self.ring.as_ref()
    }

    pub fn overlay(&self) -> &ComparisonOverlay {
        &self.overlay
    }

    pub fn cache(&self) -> &GalleryCache {
        &self.cache
    }

    pub fn phase(&self) -> SwapPhase {
        self.phase
    }

    /// The last validation message, cleared by the next action.
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn active_gallery(&self) -> Option<&PartGallery> {
        self.ring.as_ref().and_then(|ring| self.cache.peek(ring.part()))
    }

    pub fn current_face(&self) -> Option<&ExampleFace> {
        let ring = self.ring.as_ref()?;
        self.active_gallery()?.face(ring.current_ordinal())
    }

    /// The composited image currently on screen, if any.
    pub fn download_target(&self) -> Option<&ImageSource> {
        self.overlay.displayed_result()
    }
}
