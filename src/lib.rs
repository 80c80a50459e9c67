//! # Face Part Swap
//!
//! Client core for a face-part swap service. A visitor browses galleries of
//! example face parts (lips, nose, eyes, ...), picks one, supplies a photo
//! of their own, and asks the backend to composite the chosen part onto it.
//!
//! # Architecture: State Machine Plus Event Loop
//!
//! All client state lives in one [`session::Session`]. It is changed only by
//! synchronous handlers reacting to a closed set of user actions:
//!
//! ```text
//! UiAction ──► Session::dispatch ──► Effect ──► EventLoop spawns task
//!                    ▲                                    │
//!                    └── finish_part_switch / finish_swap ◄┘
//! ```
//!
//! The two remote calls (load a part's gallery, process a photo) are the only
//! suspension points. Handlers never await them; they hand a pending job to
//! the [`runtime::EventLoop`], which runs it on the same thread and feeds the
//! result back. This keeps every state transition atomic with respect to
//! other user input while a call is outstanding.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`cache`] | Per-part gallery cache with hit/miss counters |
//! | [`ring`] | Cyclic cursor over the active part's example faces |
//! | [`overlay`] | Two-slot comparison overlay with an enlarged main slot; processing view |
//! | [`swap`] | Swap job submission, timeout and reply classification |
//! | [`selection`] | Active part, chosen face, user photo, in-flight flags, validation |
//! | [`guard`] | RAII in-flight guards for part loads and swaps |
//! | [`session`] | Action dispatch tying the components together |
//! | [`runtime`] | Single-threaded event loop running remote calls and timers |
//! | [`backend`] | Backend trait, wire types, and the HTTP implementation |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`render`] | Declarative slot description and text output |
//! | [`upload`] | Reading and type-checking the user's photo |
//! | [`download`] | Naming and saving the composited result |
//! | [`script`] | Command scripts driving a session from the CLI |
//! | [`image_source`] | Base64 data URL images |
//! | [`notice`] | User-facing status texts |
//! | [`types`] | Gallery data shared by cache, ring and overlay |
//!
//! # Design Decisions
//!
//! ## Ordinals, Not Copies
//!
//! Galleries are owned by the cache for the whole session. The ring and the
//! overlay only hold ordinals into the active gallery plus shared handles to
//! image data, so a part switch rebuilds them from scratch instead of
//! patching stale views.
//!
//! ## Guards As Values
//!
//! "A swap is in flight" is not a boolean someone has to remember to reset.
//! It is a [`guard::InFlightGuard`] owned by the pending job; whatever way
//! the job ends, dropping it clears the flag.
//!
//! ## Chosen Follows The Ordinal
//!
//! When the overlay pages, the chosen mark is recomputed from the main
//! slot's ordinal rather than carried along with a slot. [`overlay::rotate`]
//! is a pure function so this is testable without any UI.
//!
//! ## Reload Is A New Generation
//!
//! A transport error ends in a full reload. Jobs started before the reload
//! may still complete; their results carry the old generation and are
//! dropped.

use log::LevelFilter;

pub mod backend;
pub mod cache;
pub mod config;
pub mod download;
pub mod guard;
pub mod image_source;
pub mod notice;
pub mod overlay;
pub mod render;
pub mod ring;
pub mod runtime;
pub mod script;
pub mod selection;
pub mod session;
pub mod swap;
pub mod types;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;

/// Initialize logging once.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies.
pub fn init_logging(default_filter: LevelFilter) {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter.as_str()),
    );
    // Already initialized (tests, embedding); keep the existing logger
    let _ = builder.try_init();
}
