//! Single-threaded event loop owning the session.
//!
//! Everything that touches the session happens on one task, one event at a
//! time. Network calls and the reload timer run as `spawn_local` tasks and
//! report back by sending an [`Event`]; the loop must therefore run inside a
//! [`tokio::task::LocalSet`].
//!
//! ```text
//!   producer ──Event::Action──►┌───────────┐──spawn_local──► gallery load / swap
//!                              │ EventLoop │                       │
//!   timers  ──Event::ReloadDue►└───────────┘◄──Event::*Loaded──────┘
//! ```
//!
//! [`Event::Idle`] is a barrier: its sender is answered once no spawned work
//! is outstanding, which makes scripted sessions deterministic.

use crate::download::{DownloadError, save_image};
use crate::render::{self, SessionView};
use crate::session::{
    Effect, GalleryLoaded, Session, SessionError, SwapFinished, SwapReport, UiAction,
};
use log::{debug, error, info};
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug)]
pub enum Event {
    Action(UiAction),
    GalleryLoaded(GalleryLoaded),
    SwapFinished(SwapFinished),
    /// The delay after a failed swap has elapsed.
    ReloadDue,
    Download { dir: PathBuf },
    Show,
    /// Answer once all spawned work has finished.
    Idle(oneshot::Sender<()>),
    Quit,
}

/// What the loop reports to its front end.
#[derive(Debug)]
pub enum Update {
    View(Box<SessionView>),
    Rejected(SessionError),
    Swap(SwapReport),
    Saved(PathBuf),
    DownloadFailed(DownloadError),
    Reloaded,
}

pub type EventSender = mpsc::UnboundedSender<Event>;

pub struct EventLoop {
    session: Session,
    tx: EventSender,
    rx: mpsc::UnboundedReceiver<Event>,
    outstanding: usize,
    waiters: Vec<oneshot::Sender<()>>,
}

impl EventLoop {
    pub fn new(session: Session) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            session,
            tx,
            rx,
            outstanding: 0,
            waiters: Vec::new(),
        }
    }

    pub fn sender(&self) -> EventSender {
        self.tx.clone()
    }

    /// Start the session and handle events until [`Event::Quit`].
    ///
    /// Returns the session so callers can inspect the final state.
    pub async fn run<F>(mut self, mut on_update: F) -> Session
    where
        F: FnMut(Update),
    {
        let started = self.session.start();
        self.apply(started, &mut on_update);
        while let Some(event) = self.rx.recv().await {
            if matches!(event, Event::Quit) {
                debug!("event loop quitting with {} tasks outstanding", self.outstanding);
                break;
            }
            self.handle(event, &mut on_update);
            if self.outstanding == 0 {
                for waiter in self.waiters.drain(..) {
                    let _ = waiter.send(());
                }
            }
        }
        self.session
    }

    fn handle<F: FnMut(Update)>(&mut self, event: Event, on_update: &mut F) {
        match event {
            Event::Action(action) => {
                let result = self.session.dispatch(action);
                self.apply(result, on_update);
            }
            Event::GalleryLoaded(loaded) => {
                self.outstanding -= 1;
                if let Err(e) = self.session.finish_part_switch(loaded) {
                    on_update(Update::Rejected(e));
                }
            }
            Event::SwapFinished(finished) => {
                self.outstanding -= 1;
                if let Some(report) = self.session.finish_swap(finished) {
                    if let Some(delay) = report.reload_after {
                        info!("reloading in {}s", delay.as_secs());
                        self.spawn_timer(delay);
                    }
                    on_update(Update::Swap(report));
                }
            }
            Event::ReloadDue => {
                self.outstanding -= 1;
                let result = self.session.reload();
                on_update(Update::Reloaded);
                self.apply(result, on_update);
            }
            Event::Download { dir } => {
                let prefix = self.session.config().download.file_prefix.clone();
                let saved = self
                    .session
                    .download_target()
                    .ok_or(DownloadError::NothingToDownload)
                    .and_then(|image| save_image(image, &dir, &prefix));
                match saved {
                    Ok(path) => on_update(Update::Saved(path)),
                    Err(e) => {
                        error!("download failed: {e}");
                        on_update(Update::DownloadFailed(e));
                    }
                }
            }
            Event::Show => on_update(Update::View(Box::new(render::describe(&self.session)))),
            Event::Idle(waiter) => self.waiters.push(waiter),
            Event::Quit => {}
        }
    }

    /// Run an effect, or report why the action produced none.
    fn apply<F: FnMut(Update)>(&mut self, result: Result<Effect, SessionError>, on_update: &mut F) {
        match result {
            Ok(effect) => self.spawn(effect),
            // Dropped re-entries are only logged
            Err(SessionError::Busy(_)) => {}
            Err(e) => on_update(Update::Rejected(e)),
        }
    }

    fn spawn(&mut self, effect: Effect) {
        let tx = self.tx.clone();
        match effect {
            Effect::None => return,
            Effect::LoadGallery(load) => {
                tokio::task::spawn_local(async move {
                    let _ = tx.send(Event::GalleryLoaded(load.run().await));
                });
            }
            Effect::RunSwap(swap) => {
                tokio::task::spawn_local(async move {
                    let _ = tx.send(Event::SwapFinished(swap.run().await));
                });
            }
        }
        self.outstanding += 1;
    }

    fn spawn_timer(&mut self, delay: std::time::Duration) {
        let tx = self.tx.clone();
        tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Event::ReloadDue);
        });
        self.outstanding += 1;
    }
}

/// Wait until the loop behind `sender` has no spawned work left.
///
/// Returns immediately when the loop has already stopped.
pub async fn idle(sender: &EventSender) {
    let (tx, rx) = oneshot::channel();
    if sender.send(Event::Idle(tx)).is_ok() {
        let _ = rx.await;
    }
}
