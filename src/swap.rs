//! Swap jobs: submit the user's photo plus a chosen face, classify the reply.
//!
//! ```text
//! Idle ─► Validating ─► Submitting ─┬─► Succeeded
//!   ▲          │                    ├─► DetectionError(count)
//!   └──────────┘                    └─► TransportError ─► reload
//! ```
//!
//! [`begin`] covers validation and guard acquisition synchronously and hands
//! back a [`PendingSwap`] that owns everything the network call needs. Running
//! it never borrows the session, so other events keep flowing while the call
//! is outstanding. The swap guard travels inside the pending job and its
//! [`SwapResolution`]; it is released when the resolution is consumed, or
//! when either value is dropped on any other path.

use crate::backend::{Backend, BackendError, ProcessPhotoRequest, ProcessPhotoResponse};
use crate::guard::{InFlightGuard, ReentrancyRejected};
use crate::image_source::ImageSource;
use crate::notice::Notice;
use crate::overlay::ProcessingStatus;
use crate::selection::{SelectionState, ValidationError};
use crate::types::FaceId;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwapError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Busy(#[from] ReentrancyRejected),
}

/// Everything one process-photo call needs.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapJob {
    pub part: String,
    pub face_id: FaceId,
    pub user_photo: ImageSource,
}

impl SwapJob {
    pub fn to_request(&self) -> ProcessPhotoRequest {
        ProcessPhotoRequest {
            active_part: self.part.clone(),
            input_photo: self.user_photo.clone(),
            face_id: self.face_id,
        }
    }
}

/// Where the session's swap currently stands.
///
/// Terminal phases are kept until the next submission so the UI can keep
/// showing them. They count as idle: once the swap guard is released
/// (`swap_in_flight` is false) a new submission is accepted from any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwapPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
    DetectionError { count: i64 },
    TransportError,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportCause {
    Backend(BackendError),
    Timeout(Duration),
    /// The backend answered with a shape outside its contract.
    InvariantViolation(String),
}

impl std::fmt::Display for TransportCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportCause::Backend(e) => write!(f, "{e}"),
            TransportCause::Timeout(after) => {
                write!(f, "no reply within {}s", after.as_secs())
            }
            TransportCause::InvariantViolation(what) => write!(f, "unexpected reply: {what}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SwapOutcome {
    Succeeded { image: ImageSource },
    DetectionError { count: i64 },
    TransportError { cause: TransportCause },
}

impl SwapOutcome {
    pub fn phase(&self) -> SwapPhase {
        match self {
            SwapOutcome::Succeeded { .. } => SwapPhase::Succeeded,
            SwapOutcome::DetectionError { count } => SwapPhase::DetectionError { count: *count },
            SwapOutcome::TransportError { .. } => SwapPhase::TransportError,
        }
    }

    /// The notice shown instead of a result, if any.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            SwapOutcome::Succeeded { .. } => None,
            SwapOutcome::DetectionError { count } if *count < 1 => Some(Notice::NoFaces),
            SwapOutcome::DetectionError { .. } => Some(Notice::TooManyFaces),
            SwapOutcome::TransportError { .. } => Some(Notice::Error),
        }
    }

    pub fn processing_status(&self) -> ProcessingStatus {
        match (self, self.notice()) {
            (SwapOutcome::Succeeded { image }, _) => ProcessingStatus::Done(image.clone()),
            (_, Some(notice)) => ProcessingStatus::Failed(notice),
            (_, None) => ProcessingStatus::Failed(Notice::Error),
        }
    }

    /// Transport errors end in a full session reload.
    pub fn needs_reload(&self) -> bool {
        matches!(self, SwapOutcome::TransportError { .. })
    }
}

/// Map a backend reply onto an outcome.
///
/// `true` must carry an image. `false` must carry a count other than 1:
/// below 1 means no faces, above 1 means too many. Anything else is an
/// invariant violation and is handled like a transport failure.
pub fn classify_response(response: ProcessPhotoResponse) -> SwapOutcome {
    let violation = match response {
        ProcessPhotoResponse {
            face_detected_successfully: true,
            img_src: Some(image),
            ..
        } => return SwapOutcome::Succeeded { image },
        ProcessPhotoResponse {
            face_detected_successfully: true,
            img_src: None,
            ..
        } => "detection succeeded without a result image".to_string(),
        ProcessPhotoResponse {
            face_detected_successfully: false,
            number_of_detected_faces: Some(count),
            ..
        } if count != 1 => return SwapOutcome::DetectionError { count },
        ProcessPhotoResponse {
            face_detected_successfully: false,
            number_of_detected_faces: Some(count),
            ..
        } => format!("detection failed with {count} detected face"),
        ProcessPhotoResponse {
            face_detected_successfully: false,
            number_of_detected_faces: None,
            ..
        } => "detection failed without a face count".to_string(),
    };
    error!("invariant violation in swap reply: {violation}");
    SwapOutcome::TransportError {
        cause: TransportCause::InvariantViolation(violation),
    }
}

/// Validate the selection and take the swap guard.
///
/// Nothing is changed on error: a failed validation leaves the guard alone
/// and a rejected re-entry leaves the outstanding job's guard held.
pub fn begin(
    selection: &SelectionState,
    backend: Arc<dyn Backend>,
    timeout: Duration,
) -> Result<PendingSwap, SwapError> {
    let job = selection.validate_submission()?;
    let guard = selection.swap_flag().try_acquire()?;
    info!("submitting swap of {} face {}", job.part, job.face_id);
    Ok(PendingSwap {
        job,
        guard,
        backend,
        timeout,
    })
}

/// A validated job holding the swap guard, ready to be sent.
pub struct PendingSwap {
    job: SwapJob,
    guard: InFlightGuard,
    backend: Arc<dyn Backend>,
    timeout: Duration,
}

impl std::fmt::Debug for PendingSwap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingSwap")
            .field("job", &self.job)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl PendingSwap {
    pub fn job(&self) -> &SwapJob {
        &self.job
    }

    /// Issue the process-photo call, bounded by the timeout.
    pub async fn run(self) -> SwapResolution {
        let request = self.job.to_request();
        let reply = tokio::time::timeout(self.timeout, self.backend.process_photo(&request)).await;
        let outcome = match reply {
            Ok(Ok(response)) => classify_response(response),
            Ok(Err(e)) => {
                error!("during processing the photo an error occurred: {e}");
                SwapOutcome::TransportError {
                    cause: TransportCause::Backend(e),
                }
            }
            Err(_) => {
                error!("swap timed out after {}s", self.timeout.as_secs());
                SwapOutcome::TransportError {
                    cause: TransportCause::Timeout(self.timeout),
                }
            }
        };
        SwapResolution {
            job: self.job,
            outcome,
            guard: self.guard,
        }
    }
}

/// A finished swap. The guard is still held until [`SwapResolution::release`].
#[derive(Debug)]
pub struct SwapResolution {
    pub job: SwapJob,
    pub outcome: SwapOutcome,
    guard: InFlightGuard,
}

impl SwapResolution {
    /// Drop the guard and hand back the outcome.
    pub fn release(self) -> SwapOutcome {
        drop(self.guard);
        self.outcome
    }
}
