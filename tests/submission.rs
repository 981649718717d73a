//! Exercises the full submission cycle against a stub analysis backend.

use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::Result;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use tabwatch::{
    popup::{PopupController, PopupEvent, UserCommand, BACKEND_ERROR_TEXT},
    report::client::ReportClient,
    tab_api::{ActiveTabData, TabProvider},
    utils::clock::DefaultClock,
    view::PopupView,
};

const ARTIFACT_NAME: &str = "report123.pdf";
const ARTIFACT_BODY: &[u8] = b"%PDF-1.4 stub";

#[derive(Clone)]
struct StubBackend {
    received: Arc<Mutex<Vec<Value>>>,
    calls: Arc<AtomicUsize>,
    /// Number of leading /analyze-work calls answered with a non-JSON body.
    garbled_calls: usize,
    /// Artifact name the analysis response advertises. Only ARTIFACT_NAME is
    /// actually served by the download route.
    pdf_name: &'static str,
}

impl Default for StubBackend {
    fn default() -> Self {
        Self {
            received: Arc::default(),
            calls: Arc::default(),
            garbled_calls: 0,
            pdf_name: ARTIFACT_NAME,
        }
    }
}

async fn analyze(State(backend): State<StubBackend>, Json(payload): Json<Value>) -> Response {
    let call = backend.calls.fetch_add(1, Ordering::SeqCst);
    if call < backend.garbled_calls {
        return "this is not json".into_response();
    }
    backend.received.lock().unwrap().push(payload);
    Json(json!({ "pdf": backend.pdf_name, "summary": "ok" })).into_response()
}

async fn download(Path(name): Path<String>) -> Response {
    if name == ARTIFACT_NAME {
        ARTIFACT_BODY.to_vec().into_response()
    } else {
        axum::http::StatusCode::NOT_FOUND.into_response()
    }
}

async fn spawn_backend(backend: StubBackend) -> Result<(StubBackend, String)> {
    let app = Router::new()
        .route("/analyze-work", post(analyze))
        .route("/download/:name", get(download))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Ok((backend, format!("http://{addr}")))
}

struct FixedTabs {
    url: &'static str,
}

impl TabProvider for FixedTabs {
    fn query_active_tab(&mut self) -> Result<ActiveTabData> {
        Ok(ActiveTabData {
            tab_id: 1,
            url: self.url.into(),
        })
    }
}

/// Answers the popup-open query, errors on the query after it, then recovers.
struct FlakyTabs {
    calls: usize,
}

impl TabProvider for FlakyTabs {
    fn query_active_tab(&mut self) -> Result<ActiveTabData> {
        self.calls += 1;
        if self.calls == 2 {
            anyhow::bail!("tab query failed");
        }
        Ok(ActiveTabData {
            tab_id: 1,
            url: "https://example.com/app".into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ViewEvent {
    Platform(String),
    Timer(u64),
    Output(String),
}

#[derive(Clone, Default)]
struct RecordingView {
    events: Arc<Mutex<Vec<ViewEvent>>>,
}

impl RecordingView {
    fn recorded(&self) -> Vec<ViewEvent> {
        self.events.lock().unwrap().clone()
    }

    async fn wait_for(&self, pred: impl Fn(&ViewEvent) -> bool) -> ViewEvent {
        for _ in 0..100 {
            if let Some(event) = self.recorded().into_iter().find(|e| pred(e)) {
                return event;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("view never recorded the expected event: {:?}", self.recorded());
    }
}

impl PopupView for RecordingView {
    fn show_platform(&mut self, label: &str) {
        self.events
            .lock()
            .unwrap()
            .push(ViewEvent::Platform(label.to_string()));
    }

    fn show_timer(&mut self, elapsed_secs: u64) {
        self.events.lock().unwrap().push(ViewEvent::Timer(elapsed_secs));
    }

    fn show_output(&mut self, text: &str) {
        self.events
            .lock()
            .unwrap()
            .push(ViewEvent::Output(text.to_string()));
    }
}

struct Popup {
    sender: mpsc::Sender<PopupEvent>,
    shutdown: CancellationToken,
    view: RecordingView,
    download_dir: TempDir,
    task: tokio::task::JoinHandle<Result<()>>,
}

fn spawn_popup(base_url: &str, url: &'static str) -> Popup {
    spawn_popup_with(base_url, FixedTabs { url })
}

fn spawn_popup_with(base_url: &str, tabs: impl TabProvider + 'static) -> Popup {
    let (sender, receiver) = mpsc::channel(32);
    let shutdown = CancellationToken::new();
    let view = RecordingView::default();
    let download_dir = TempDir::new().unwrap();
    let controller = PopupController::new(
        receiver,
        sender.clone(),
        Box::new(tabs),
        ReportClient::new(base_url, download_dir.path().to_path_buf()),
        view.clone(),
        Arc::new(DefaultClock),
        shutdown.clone(),
    );
    let task = tokio::spawn(controller.run());
    Popup {
        sender,
        shutdown,
        view,
        download_dir,
        task,
    }
}

impl Popup {
    async fn send(&self, command: UserCommand) {
        self.sender
            .send(PopupEvent::Command(command))
            .await
            .unwrap();
    }

    async fn close(self) {
        self.shutdown.cancel();
        self.task.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn submission_renders_report_downloads_artifact_and_resets() -> Result<()> {
    let (backend, base_url) = spawn_backend(StubBackend::default()).await?;
    let popup = spawn_popup(&base_url, "https://colab.research.google.com/drive/abc");

    popup.send(UserCommand::AddNote(" buy milk ".to_string())).await;
    popup.send(UserCommand::AddNote("   ".to_string())).await;
    popup.send(UserCommand::Submit).await;

    // Timer(0) is the last step of the success path, so everything before it
    // (render + download) has completed once it shows up.
    popup.view.wait_for(|e| *e == ViewEvent::Timer(0)).await;

    let payloads = backend.received.lock().unwrap().clone();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0]["platform"], "Google Colab");
    assert_eq!(payloads[0]["work_type"], "Coding / Analysis");
    assert_eq!(payloads[0]["time_spent_minutes"], 1);
    assert_eq!(payloads[0]["user_action"], "Work Session");
    assert_eq!(payloads[0]["notes"], json!(["buy milk"]));

    let expected =
        serde_json::to_string_pretty(&json!({ "pdf": ARTIFACT_NAME, "summary": "ok" }))?;
    popup
        .view
        .wait_for(|e| matches!(e, ViewEvent::Output(text) if *text == expected))
        .await;

    let artifact = popup.download_dir.path().join(ARTIFACT_NAME);
    assert_eq!(std::fs::read(&artifact)?, ARTIFACT_BODY);

    popup.close().await;
    Ok(())
}

#[tokio::test]
async fn popup_open_renders_the_three_way_platform_label() -> Result<()> {
    let (_backend, base_url) = spawn_backend(StubBackend::default()).await?;
    let popup = spawn_popup(&base_url, "https://docs.google.com/document/d/xyz");

    let event = popup
        .view
        .wait_for(|e| matches!(e, ViewEvent::Platform(_)))
        .await;
    assert_eq!(event, ViewEvent::Platform("Google Docs".to_string()));

    popup.close().await;
    Ok(())
}

#[tokio::test]
async fn failed_submission_keeps_notes_for_a_retry() -> Result<()> {
    // First /analyze-work response is garbage, so the first submission takes
    // the failure path; the retry must still carry the original notes.
    let (backend, base_url) = spawn_backend(StubBackend {
        garbled_calls: 1,
        ..StubBackend::default()
    })
    .await?;
    let popup = spawn_popup(&base_url, "https://example.com/app");

    popup.send(UserCommand::AddNote("buy milk".to_string())).await;
    popup.send(UserCommand::SetLabel("Deep work".to_string())).await;
    popup.send(UserCommand::Submit).await;

    popup
        .view
        .wait_for(|e| matches!(e, ViewEvent::Output(text) if text == BACKEND_ERROR_TEXT))
        .await;
    assert!(backend.received.lock().unwrap().is_empty());

    popup.send(UserCommand::Submit).await;
    popup.view.wait_for(|e| *e == ViewEvent::Timer(0)).await;

    let payloads = backend.received.lock().unwrap().clone();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0]["platform"], "Browser App");
    assert_eq!(payloads[0]["user_action"], "Deep work");
    assert_eq!(payloads[0]["notes"], json!(["buy milk"]));

    popup.close().await;
    Ok(())
}

#[tokio::test]
async fn failed_artifact_download_still_resets_the_session() -> Result<()> {
    // The analysis response names an artifact the download route 404s on.
    let (backend, base_url) = spawn_backend(StubBackend {
        pdf_name: "gone.pdf",
        ..StubBackend::default()
    })
    .await?;
    let popup = spawn_popup(&base_url, "https://colab.research.google.com/drive/abc");

    popup.send(UserCommand::AddNote("buy milk".to_string())).await;
    popup.send(UserCommand::Submit).await;

    // The reset still happens: the download is best effort.
    popup.view.wait_for(|e| *e == ViewEvent::Timer(0)).await;

    let payloads = backend.received.lock().unwrap().clone();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0]["notes"], json!(["buy milk"]));
    assert!(!popup.download_dir.path().join("gone.pdf").exists());

    // Notes were cleared despite the failed download.
    popup.send(UserCommand::Submit).await;
    for _ in 0..100 {
        if backend.received.lock().unwrap().len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let payloads = backend.received.lock().unwrap().clone();
    assert_eq!(payloads.len(), 2);
    assert_eq!(payloads[1]["notes"], json!([]));

    popup.close().await;
    Ok(())
}

#[tokio::test]
async fn tab_query_failure_at_submit_aborts_before_touching_state() -> Result<()> {
    let (backend, base_url) = spawn_backend(StubBackend::default()).await?;
    let popup = spawn_popup_with(&base_url, FlakyTabs { calls: 0 });

    // Popup open consumes the one good query.
    popup
        .view
        .wait_for(|e| matches!(e, ViewEvent::Platform(_)))
        .await;

    popup.send(UserCommand::AddNote("buy milk".to_string())).await;
    popup.send(UserCommand::Submit).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    // The aborted submission never reached the backend and rendered nothing.
    assert!(backend.received.lock().unwrap().is_empty());
    assert!(!popup
        .view
        .recorded()
        .iter()
        .any(|e| matches!(e, ViewEvent::Output(_))));

    // The session survived intact, so the retry carries the note.
    popup.send(UserCommand::Submit).await;
    popup.view.wait_for(|e| *e == ViewEvent::Timer(0)).await;

    let payloads = backend.received.lock().unwrap().clone();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0]["notes"], json!(["buy milk"]));

    popup.close().await;
    Ok(())
}
