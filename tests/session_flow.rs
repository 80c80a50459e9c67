//! End-to-end session flows through the public API: event loop, session,
//! overlay and swap handling against an in-process backend.

use async_trait::async_trait;
use face_part_swap::backend::{
    Backend, BackendError, ExampleFaceRecord, ProcessPhotoRequest, ProcessPhotoResponse,
};
use face_part_swap::config::ClientConfig;
use face_part_swap::image_source::ImageSource;
use face_part_swap::overlay::SlotKind;
use face_part_swap::render::{self, OverlayDisplay};
use face_part_swap::ring::Direction;
use face_part_swap::runtime::{self, Event, EventLoop, EventSender, Update};
use face_part_swap::script::{ScriptCommand, parse_line};
use face_part_swap::session::{Session, UiAction};
use face_part_swap::swap::SwapPhase;
use face_part_swap::types::FaceId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use tokio::task::LocalSet;

/// Backend serving fixed galleries and answering swaps from a queue.
struct StubBackend {
    galleries: HashMap<String, Vec<ExampleFaceRecord>>,
    replies: Mutex<Vec<ProcessPhotoResponse>>,
    requests: Mutex<Vec<ProcessPhotoRequest>>,
}

impl StubBackend {
    fn new(replies: Vec<ProcessPhotoResponse>) -> Self {
        let mut galleries = HashMap::new();
        galleries.insert("lips".to_string(), records(&[(1, "Full"), (2, "Thin"), (3, "Wide")]));
        galleries.insert("nose".to_string(), records(&[(7, "Straight"), (8, "Roman")]));
        let mut replies = replies;
        replies.reverse();
        Self {
            galleries,
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<ProcessPhotoRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for StubBackend {
    async fn load_example_faces(&self, part: &str) -> Result<Vec<ExampleFaceRecord>, BackendError> {
        self.galleries
            .get(part)
            .cloned()
            .ok_or(BackendError::Status(404))
    }

    async fn process_photo(
        &self,
        request: &ProcessPhotoRequest,
    ) -> Result<ProcessPhotoResponse, BackendError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| BackendError::Request("connection refused".into()))
    }
}

fn png(tag: &str) -> ImageSource {
    ImageSource::from_bytes("image/png", tag.as_bytes()).unwrap()
}

fn records(faces: &[(i64, &str)]) -> Vec<ExampleFaceRecord> {
    faces
        .iter()
        .map(|&(id, name)| ExampleFaceRecord {
            id: FaceId(id),
            name: name.to_string(),
            source: png(name),
        })
        .collect()
}

fn photo() -> ImageSource {
    ImageSource::from_bytes("image/jpeg", b"me").unwrap()
}

fn swapped() -> ProcessPhotoResponse {
    ProcessPhotoResponse {
        face_detected_successfully: true,
        img_src: Some(png("swapped")),
        number_of_detected_faces: None,
    }
}

/// Run `script` against a fresh session, then quit and hand back the
/// session and every update the loop produced.
async fn session_run<S, Fut>(backend: Arc<StubBackend>, script: S) -> (Session, Vec<Update>)
where
    S: FnOnce(EventSender) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let updates = Rc::new(RefCell::new(Vec::new()));
    let sink = updates.clone();
    let session = LocalSet::new()
        .run_until(async move {
            let event_loop = EventLoop::new(Session::new(ClientConfig::default(), backend));
            let tx = event_loop.sender();
            let handle =
                tokio::task::spawn_local(event_loop.run(move |u| sink.borrow_mut().push(u)));
            runtime::idle(&tx).await;
            script(tx.clone()).await;
            runtime::idle(&tx).await;
            tx.send(Event::Quit).unwrap();
            handle.await.unwrap()
        })
        .await;
    let updates = updates.take();
    (session, updates)
}

fn send(tx: &EventSender, action: UiAction) {
    tx.send(Event::Action(action)).unwrap();
}

#[tokio::test]
async fn browse_compare_choose_and_swap() {
    let backend = Arc::new(StubBackend::new(vec![swapped()]));
    let (session, updates) = session_run(backend.clone(), |tx| async move {
        send(&tx, UiAction::OpenOverlay);
        send(&tx, UiAction::PageOverlay {
            direction: Direction::Next,
        });
        send(&tx, UiAction::SelectSlot {
            which: SlotKind::Lower,
        });
        send(&tx, UiAction::CommitSelection);
        send(&tx, UiAction::SupplyPhoto { photo: photo() });
        send(&tx, UiAction::SubmitSwap);
    })
    .await;

    // Paging showed (Thin, Wide); choosing lower committed "Wide"
    assert_eq!(session.ring().unwrap().current_ordinal(), 2);
    assert_eq!(backend.requests().len(), 1);
    let request = &backend.requests()[0];
    assert_eq!(request.active_part, "lips");
    assert_eq!(request.face_id, FaceId(3));
    assert_eq!(request.input_photo, photo());

    assert_eq!(session.phase(), SwapPhase::Succeeded);
    assert_eq!(session.download_target(), Some(&png("swapped")));
    assert!(matches!(updates.as_slice(), [Update::Swap(_)]));
}

#[tokio::test]
async fn part_switch_resets_choice_and_uses_cache() {
    let backend = Arc::new(StubBackend::new(vec![]));
    let (session, updates) = session_run(backend, |tx| async move {
        send(&tx, UiAction::ChooseCurrent);
        send(&tx, UiAction::SwitchPart {
            part: "nose".into(),
        });
        runtime::idle(&tx).await;
        send(&tx, UiAction::Navigate {
            direction: Direction::Previous,
        });
        send(&tx, UiAction::SwitchPart {
            part: "lips".into(),
        });
        tx.send(Event::Show).unwrap();
    })
    .await;

    assert_eq!(session.selection().active_part(), "lips");
    assert!(session.selection().chosen_face().is_none());
    assert_eq!(session.cache().stats().hits, 1);
    assert_eq!(session.cache().stats().misses, 2);

    let [Update::View(view)] = updates.as_slice() else {
        panic!("expected one view, got {updates:?}");
    };
    assert_eq!(view.gallery.as_ref().unwrap().position, 1);
    assert_eq!(view.overlay, OverlayDisplay::Closed);
}

#[tokio::test]
async fn unknown_part_keeps_current_gallery() {
    let backend = Arc::new(StubBackend::new(vec![]));
    let (session, updates) = session_run(backend, |tx| async move {
        send(&tx, UiAction::Navigate {
            direction: Direction::Next,
        });
        send(&tx, UiAction::SwitchPart {
            part: "ears".into(),
        });
    })
    .await;

    assert_eq!(session.selection().active_part(), "lips");
    assert_eq!(session.ring().unwrap().current_ordinal(), 1);
    assert!(!session.cache().is_loaded("ears"));
    assert!(matches!(updates.as_slice(), [Update::Rejected(_)]));
}

#[tokio::test]
async fn too_many_faces_then_retry() {
    let crowd = ProcessPhotoResponse {
        face_detected_successfully: false,
        img_src: None,
        number_of_detected_faces: Some(4),
    };
    let backend = Arc::new(StubBackend::new(vec![crowd, swapped()]));
    let (session, updates) = session_run(backend.clone(), |tx| async move {
        send(&tx, UiAction::ChooseCurrent);
        send(&tx, UiAction::SupplyPhoto { photo: photo() });
        send(&tx, UiAction::SubmitSwap);
        runtime::idle(&tx).await;
        send(&tx, UiAction::CloseOverlay);
        send(&tx, UiAction::SubmitSwap);
    })
    .await;

    assert_eq!(backend.requests().len(), 2);
    assert_eq!(session.phase(), SwapPhase::Succeeded);
    let lines: Vec<String> = updates.iter().flat_map(render::format_update).collect();
    assert_eq!(
        lines,
        vec![
            "Swap: THERE ARE TOO MANY FACES ON THE PHOTO. PLEASE CHOOSE ANOTHER ONE",
            "Swap: done (image/png)",
        ]
    );
}

#[test]
fn script_lines_map_to_actions() {
    let script = "\
# pick the second nose
part nose
next
choose
swap
";
    let commands: Vec<ScriptCommand> = script
        .lines()
        .enumerate()
        .filter_map(|(i, line)| parse_line(i + 1, line).unwrap())
        .collect();
    assert_eq!(
        commands,
        vec![
            ScriptCommand::Action(UiAction::SwitchPart {
                part: "nose".into()
            }),
            ScriptCommand::Action(UiAction::Navigate {
                direction: Direction::Next
            }),
            ScriptCommand::Action(UiAction::ChooseCurrent),
            ScriptCommand::Action(UiAction::SubmitSwap),
        ]
    );
}
