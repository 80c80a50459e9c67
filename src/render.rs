//! Declarative view of a session and its text rendering.
//!
//! [`describe`] answers "which image or label sits in which slot" without
//! doing any drawing; a front end turns a [`SessionView`] into pixels. The
//! CLI uses [`format_view`], which renders the same view as text:
//!
//! ```text
//! Gallery lips (002/003)
//!     002 face-11
//!         Image: image/png
//!     Chosen: 011
//!     Photo: image/jpeg
//!     Swap: ready
//! Overlay
//!     Upper: 002 face-11 [chosen]
//!     Lower: 003 face-12
//!     Main: 002 face-11
//!     Paging: hidden
//! ```
//!
//! While a swap is handled the overlay block reads:
//!
//! ```text
//! Overlay (screen blocked)
//!     Upper: your photo [chosen]
//!     Lower: face 011 [chosen]
//!     Main: YOUR PHOTO IS BEING PROCESSED
//! ```
//!
//! Format functions are pure; `print_view` is the only one writing to stdout.

use crate::image_source::ImageSource;
use crate::notice::Notice;
use crate::overlay::{ComparisonSlot, OverlayView, ProcessingStatus};
use crate::runtime::Update;
use crate::session::Session;
use crate::swap::{SwapOutcome, SwapPhase};
use crate::types::{FaceId, PartGallery};

/// One rendered slot: a label, the image to show if any, and the chosen mark.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotView {
    pub label: String,
    pub image: Option<ImageSource>,
    pub chosen: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayDisplay {
    Closed,
    Browse {
        upper: SlotView,
        lower: SlotView,
        main: SlotView,
        paging: bool,
    },
    Processing {
        upper: SlotView,
        lower: SlotView,
        main: SlotView,
        blocked: bool,
    },
}

/// The face the gallery strip currently shows.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryView {
    pub part: String,
    /// 1-based position in the ring.
    pub position: usize,
    pub size: usize,
    pub face: SlotView,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub active_part: String,
    pub loading: bool,
    pub gallery: Option<GalleryView>,
    pub chosen: Option<(FaceId, ImageSource)>,
    pub photo: Option<ImageSource>,
    pub swap_ready: bool,
    pub phase: SwapPhase,
    pub overlay: OverlayDisplay,
    pub alert: Option<String>,
}

fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn face_label(gallery: &PartGallery, ordinal: usize) -> String {
    match gallery.face(ordinal) {
        Some(face) => format!("{} {}", format_index(ordinal + 1), face.name),
        None => format_index(ordinal + 1),
    }
}

fn comparison_slot(gallery: &PartGallery, slot: &ComparisonSlot) -> SlotView {
    SlotView {
        label: face_label(gallery, slot.face_ordinal),
        image: Some(slot.image.clone()),
        chosen: slot.is_chosen,
    }
}

fn notice_slot(notice: Notice) -> SlotView {
    SlotView {
        label: notice.to_string(),
        image: None,
        chosen: false,
    }
}

fn describe_overlay(session: &Session) -> OverlayDisplay {
    match session.overlay().view() {
        OverlayView::Closed => OverlayDisplay::Closed,
        OverlayView::Browse(state) => match session.active_gallery() {
            Some(gallery) => OverlayDisplay::Browse {
                upper: comparison_slot(gallery, &state.upper),
                lower: comparison_slot(gallery, &state.lower),
                main: SlotView {
                    label: face_label(gallery, state.main.face_ordinal),
                    image: Some(state.main.image.clone()),
                    chosen: false,
                },
                paging: state.paging,
            },
            None => OverlayDisplay::Closed,
        },
        OverlayView::Processing(view) => {
            let chosen_label = match session.selection().chosen_face() {
                Some(face) => format!("face {}", format_index(face.id.0.max(0) as usize)),
                None => "chosen face".to_string(),
            };
            let main = match &view.status {
                ProcessingStatus::InProgress => notice_slot(Notice::Processing),
                ProcessingStatus::Failed(notice) => notice_slot(*notice),
                ProcessingStatus::Done(image) => SlotView {
                    label: "result".to_string(),
                    image: Some(image.clone()),
                    chosen: false,
                },
            };
            OverlayDisplay::Processing {
                upper: SlotView {
                    label: "your photo".to_string(),
                    image: Some(view.user_photo.clone()),
                    chosen: true,
                },
                lower: SlotView {
                    label: chosen_label,
                    image: Some(view.chosen_face.clone()),
                    chosen: true,
                },
                main,
                blocked: session.overlay().is_screen_blocked(),
            }
        }
    }
}

/// Snapshot everything a front end needs to draw the session.
pub fn describe(session: &Session) -> SessionView {
    let selection = session.selection();
    let gallery = match (session.ring(), session.active_gallery()) {
        (Some(ring), Some(gallery)) => {
            let ordinal = ring.current_ordinal();
            gallery.face(ordinal).map(|face| GalleryView {
                part: gallery.part.clone(),
                position: ordinal + 1,
                size: ring.size(),
                face: SlotView {
                    label: face_label(gallery, ordinal),
                    image: Some(face.image.clone()),
                    chosen: selection.chosen_face().is_some_and(|c| c.id == face.id),
                },
            })
        }
        _ => None,
    };
    SessionView {
        active_part: selection.active_part().to_string(),
        loading: selection.part_load_in_flight(),
        gallery,
        chosen: selection
            .chosen_face()
            .map(|face| (face.id, face.image.clone())),
        photo: selection.user_photo().cloned(),
        swap_ready: selection.swap_ready(),
        phase: session.phase(),
        overlay: describe_overlay(session),
        alert: session.alert().map(str::to_string),
    }
}

fn slot_line(name: &str, slot: &SlotView) -> String {
    let mark = if slot.chosen { " [chosen]" } else { "" };
    format!("{}{}: {}{}", indent(1), name, slot.label, mark)
}

/// Render a view as display lines.
pub fn format_view(view: &SessionView) -> Vec<String> {
    let mut lines = Vec::new();

    match &view.gallery {
        Some(gallery) => {
            lines.push(format!(
                "Gallery {} ({}/{})",
                gallery.part,
                format_index(gallery.position),
                format_index(gallery.size)
            ));
            let mark = if gallery.face.chosen { " [chosen]" } else { "" };
            lines.push(format!("{}{}{}", indent(1), gallery.face.label, mark));
            if let Some(image) = &gallery.face.image {
                lines.push(format!("{}Image: {}", indent(2), image.mime_type()));
            }
        }
        None => lines.push(format!("Gallery {} (not loaded)", view.active_part)),
    }
    if view.loading {
        lines.push(format!("{}Loading...", indent(1)));
    }
    match &view.chosen {
        Some((id, _)) => lines.push(format!(
            "{}Chosen: {}",
            indent(1),
            format_index(id.0.max(0) as usize)
        )),
        None => lines.push(format!("{}Chosen: none", indent(1))),
    }
    match &view.photo {
        Some(photo) => lines.push(format!("{}Photo: {}", indent(1), photo.mime_type())),
        None => lines.push(format!("{}Photo: none", indent(1))),
    }
    let swap = match view.phase {
        SwapPhase::Submitting => "processing",
        SwapPhase::Succeeded => "done",
        SwapPhase::DetectionError { .. } | SwapPhase::TransportError => "failed",
        SwapPhase::Idle | SwapPhase::Validating if view.swap_ready => "ready",
        SwapPhase::Idle | SwapPhase::Validating => "not ready",
    };
    lines.push(format!("{}Swap: {}", indent(1), swap));

    match &view.overlay {
        OverlayDisplay::Closed => {}
        OverlayDisplay::Browse {
            upper,
            lower,
            main,
            paging,
        } => {
            lines.push("Overlay".to_string());
            lines.push(slot_line("Upper", upper));
            lines.push(slot_line("Lower", lower));
            lines.push(slot_line("Main", main));
            let paging = if *paging { "shown" } else { "hidden" };
            lines.push(format!("{}Paging: {}", indent(1), paging));
        }
        OverlayDisplay::Processing {
            upper,
            lower,
            main,
            blocked,
        } => {
            if *blocked {
                lines.push("Overlay (screen blocked)".to_string());
            } else {
                lines.push("Overlay".to_string());
            }
            lines.push(slot_line("Upper", upper));
            lines.push(slot_line("Lower", lower));
            lines.push(slot_line("Main", main));
        }
    }

    if let Some(alert) = &view.alert {
        lines.push(format!("! {}", alert));
    }
    lines
}

/// Print a session view to stdout.
pub fn print_view(view: &SessionView) {
    for line in format_view(view) {
        println!("{}", line);
    }
}

/// List a gallery, one face per line.
///
/// ```text
/// Gallery lips (3 faces)
///     001 Full
///         Id: 4, image/jpeg
/// ```
pub fn format_gallery(gallery: &PartGallery) -> Vec<String> {
    let mut lines = vec![format!("Gallery {} ({} faces)", gallery.part, gallery.len())];
    for face in &gallery.faces {
        lines.push(format!("{}{}", indent(1), face_label(gallery, face.ordinal)));
        lines.push(format!(
            "{}Id: {}, {}",
            indent(2),
            face.id,
            face.image.mime_type()
        ));
    }
    lines
}

pub fn print_gallery(gallery: &PartGallery) {
    for line in format_gallery(gallery) {
        println!("{}", line);
    }
}

/// Render an event loop report as display lines.
///
/// ```text
/// Swap: THERE ARE NO FACES ON THE PHOTO. PLEASE CHOOSE ANOTHER ONE
/// Saved: ./Face_Swapping_16-10-2026_14-05.png
/// ```
pub fn format_update(update: &Update) -> Vec<String> {
    match update {
        Update::View(view) => format_view(view),
        Update::Rejected(e) => vec![format!("! {}", e)],
        Update::Swap(report) => {
            let mut lines = vec![match &report.outcome {
                SwapOutcome::Succeeded { image } => format!("Swap: done ({})", image.mime_type()),
                SwapOutcome::TransportError { cause } => {
                    format!("Swap: {} ({})", Notice::Error, cause)
                }
                other => format!("Swap: {}", other.notice().unwrap_or(Notice::Error)),
            }];
            if let Some(delay) = report.reload_after {
                lines.push(format!("{}Reloading in {}s", indent(1), delay.as_secs()));
            }
            lines
        }
        Update::Saved(path) => vec![format!("Saved: {}", path.display())],
        Update::DownloadFailed(e) => vec![format!("! {}", e)],
        Update::Reloaded => vec!["Session reloaded".to_string()],
    }
}

pub fn print_update(update: Update) {
    for line in format_update(&update) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ProcessPhotoResponse;
    use crate::backend::tests::{MockBackend, SwapReply};
    use crate::overlay::SlotKind;
    use crate::ring::Direction;
    use crate::session::{Effect, UiAction};
    use crate::test_helpers::{face_records, gallery, image, session_with, user_photo};

    async fn started() -> Session {
        let backend = MockBackend::new()
            .with_gallery("lips", face_records(&[10, 11, 12]))
            .with_swap_reply(SwapReply::Respond(ProcessPhotoResponse {
                face_detected_successfully: true,
                img_src: Some(image("result")),
                number_of_detected_faces: None,
            }));
        let (mut session, _) = session_with(backend);
        let Effect::LoadGallery(load) = session.start().unwrap() else {
            panic!("expected a gallery load");
        };
        let loaded = load.run().await;
        session.finish_part_switch(loaded).unwrap();
        session
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
    }

    #[test]
    fn unloaded_session_says_so() {
        let (session, _) = session_with(MockBackend::new());
        let lines = format_view(&describe(&session));
        assert_eq!(lines[0], "Gallery lips (not loaded)");
        assert!(lines.contains(&"    Swap: not ready".to_string()));
    }

    #[tokio::test]
    async fn gallery_strip_shows_current_face() {
        let mut session = started().await;
        session
            .dispatch(UiAction::Navigate {
                direction: Direction::Next,
            })
            .unwrap();
        session.dispatch(UiAction::ChooseCurrent).unwrap();

        let view = describe(&session);
        let strip = view.gallery.as_ref().unwrap();
        assert_eq!(strip.position, 2);
        assert!(strip.face.chosen);

        let lines = format_view(&view);
        assert_eq!(lines[0], "Gallery lips (002/003)");
        assert_eq!(lines[1], "    002 face-11 [chosen]");
        assert!(lines.contains(&"    Chosen: 011".to_string()));
    }

    #[tokio::test]
    async fn browse_overlay_lists_slots() {
        let mut session = started().await;
        session.dispatch(UiAction::OpenOverlay).unwrap();
        session
            .dispatch(UiAction::SelectSlot {
                which: SlotKind::Lower,
            })
            .unwrap();
        let lines = format_view(&describe(&session));
        let overlay: Vec<&str> = lines
            .iter()
            .skip_while(|l| *l != "Overlay")
            .map(String::as_str)
            .collect();
        assert_eq!(
            overlay,
            vec![
                "Overlay",
                "    Upper: 001 face-10",
                "    Lower: 002 face-11 [chosen]",
                "    Main: 002 face-11",
                "    Paging: shown",
            ]
        );
    }

    #[tokio::test]
    async fn processing_overlay_blocks_screen() {
        let mut session = started().await;
        session
            .dispatch(UiAction::SupplyPhoto {
                photo: user_photo(),
            })
            .unwrap();
        session.dispatch(UiAction::ChooseCurrent).unwrap();
        let Effect::RunSwap(submitted) = session.dispatch(UiAction::SubmitSwap).unwrap() else {
            panic!("expected a swap job");
        };

        let view = describe(&session);
        let OverlayDisplay::Processing {
            upper,
            lower,
            main,
            blocked,
        } = &view.overlay
        else {
            panic!("expected processing overlay");
        };
        assert!(*blocked);
        assert!(upper.chosen && lower.chosen);
        assert_eq!(upper.image, Some(user_photo()));
        assert_eq!(main.label, Notice::Processing.to_string());

        let finished = submitted.run().await;
        session.finish_swap(finished).unwrap();
        let lines = format_view(&describe(&session));
        assert!(lines.contains(&"Overlay".to_string()));
        assert!(lines.contains(&"    Main: result".to_string()));
        assert!(lines.contains(&"    Swap: done".to_string()));
    }

    #[tokio::test]
    async fn validation_alert_is_rendered() {
        let mut session = started().await;
        let _ = session.dispatch(UiAction::SubmitSwap);
        let lines = format_view(&describe(&session));
        assert_eq!(
            lines.last().map(String::as_str),
            Some("! You haven't chosen your photo.")
        );
    }

    #[test]
    fn swap_reports() {
        use crate::session::SwapReport;
        use crate::swap::TransportCause;
        use std::time::Duration;

        let done = Update::Swap(SwapReport {
            outcome: SwapOutcome::Succeeded {
                image: image("r"),
            },
            reload_after: None,
        });
        assert_eq!(format_update(&done), vec!["Swap: done (image/png)"]);

        let none = Update::Swap(SwapReport {
            outcome: SwapOutcome::DetectionError { count: 0 },
            reload_after: None,
        });
        assert_eq!(
            format_update(&none),
            vec!["Swap: THERE ARE NO FACES ON THE PHOTO. PLEASE CHOOSE ANOTHER ONE"]
        );

        let timeout = Update::Swap(SwapReport {
            outcome: SwapOutcome::TransportError {
                cause: TransportCause::Timeout(Duration::from_secs(60)),
            },
            reload_after: Some(Duration::from_secs(5)),
        });
        assert_eq!(
            format_update(&timeout),
            vec![
                "Swap: AN ERROR OCCURRED. PLEASE TRY AGAIN (no reply within 60s)",
                "    Reloading in 5s",
            ]
        );
    }

    #[test]
    fn gallery_listing() {
        let lines = format_gallery(&gallery("nose", 2));
        assert_eq!(
            lines,
            vec![
                "Gallery nose (2 faces)",
                "    001 face-1",
                "        Id: 1, image/png",
                "    002 face-2",
                "        Id: 2, image/png",
            ]
        );
    }
}
