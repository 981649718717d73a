//! The popup controller. One cooperative loop reacts to the second-interval
//! ticks, tab/window focus signals, and user commands, in the order they
//! arrive on a single channel.

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    report::{
        client::ReportClient,
        payload::{minutes_spent, session_label, ReportPayload, WORK_TYPE},
    },
    tab_api::{FocusSignal, TabProvider, WINDOW_ID_NONE},
    utils::clock::Clock,
    view::PopupView,
};

use self::{platform::Platform, state::SessionState, timer::SessionTimer};

pub mod notes;
pub mod platform;
pub mod state;
pub mod timer;

/// Fixed message rendered when a submission fails for any reason.
pub const BACKEND_ERROR_TEXT: &str = "Error connecting to backend";

#[derive(Debug)]
pub enum PopupEvent {
    Tick,
    Focus(FocusSignal),
    Command(UserCommand),
}

#[derive(Debug)]
pub enum UserCommand {
    AddNote(String),
    SetLabel(String),
    Submit,
}

pub struct PopupController<V> {
    session: SessionState,
    timer: SessionTimer,
    session_label: String,
    tabs: Box<dyn TabProvider>,
    reporter: ReportClient,
    view: V,
    clock: Arc<dyn Clock>,
    events: mpsc::Receiver<PopupEvent>,
    shutdown: CancellationToken,
}

impl<V: PopupView> PopupController<V> {
    pub fn new(
        events: mpsc::Receiver<PopupEvent>,
        ticks: mpsc::Sender<PopupEvent>,
        tabs: Box<dyn TabProvider>,
        reporter: ReportClient,
        view: V,
        clock: Arc<dyn Clock>,
        shutdown: CancellationToken,
    ) -> Self {
        let timer = SessionTimer::new(ticks, clock.clone());
        Self {
            session: SessionState::new(),
            timer,
            session_label: String::new(),
            tabs,
            reporter,
            view,
            clock,
            events,
            shutdown,
        }
    }

    /// Executes the popup event loop until shutdown.
    pub async fn run(mut self) -> Result<()> {
        self.detect_page();
        self.timer.start();

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    self.timer.stop();
                    return Ok(());
                }
                event = self.events.recv() => {
                    let Some(event) = event else {
                        self.timer.stop();
                        return Ok(());
                    };
                    self.handle_event(event).await;
                }
            }
        }
    }

    async fn handle_event(&mut self, event: PopupEvent) {
        match event {
            PopupEvent::Tick => {
                self.session.elapsed_secs += 1;
                self.view.show_timer(self.session.elapsed_secs);
            }
            PopupEvent::Focus(signal) => self.on_focus_signal(signal),
            PopupEvent::Command(command) => self.on_command(command).await,
        }
    }

    /// Classifies the active tab once at popup open and records it as the
    /// tracked tab. A failed query only leaves the label blank.
    fn detect_page(&mut self) {
        match self.tabs.query_active_tab() {
            Ok(tab) => {
                self.session.current_tab_id = Some(tab.tab_id);
                let platform = Platform::detect(&tab.url);
                debug!("Tracking tab {} on {platform}", tab.tab_id);
                self.view.show_platform(&platform.to_string());
            }
            Err(e) => warn!("Active tab query failed at popup open: {e:?}"),
        }
    }

    /// Time only counts while the tracked tab is focused: any other tab or a
    /// fully unfocused browser stops the timer.
    fn on_focus_signal(&mut self, signal: FocusSignal) {
        match signal {
            FocusSignal::TabActivated { tab_id } => {
                if self.session.current_tab_id == Some(tab_id) {
                    self.timer.start();
                } else {
                    self.timer.stop();
                }
            }
            FocusSignal::WindowFocusChanged { window_id } => {
                if window_id == WINDOW_ID_NONE {
                    self.timer.stop();
                } else {
                    self.timer.start();
                }
            }
        }
    }

    async fn on_command(&mut self, command: UserCommand) {
        match command {
            UserCommand::AddNote(text) => {
                if self.session.notes.append(&text) {
                    debug!("Collected note ({} total)", self.session.notes.len());
                }
            }
            UserCommand::SetLabel(label) => self.session_label = label,
            UserCommand::Submit => {
                if let Err(e) = self.submit().await {
                    error!("Submission aborted: {e:?}");
                }
            }
        }
    }

    /// Stops the timer, snapshots the session into a payload, and submits it.
    /// Session state resets only on the success path; a failed submission
    /// keeps notes and elapsed time so the user can retry.
    async fn submit(&mut self) -> Result<()> {
        self.timer.stop();

        // Re-queried on purpose: the tab may have changed since popup open.
        // This split is coarser than the one at popup open and never reports
        // the Docs label.
        let tab = self.tabs.query_active_tab()?;

        let payload = ReportPayload {
            platform: Platform::detect_coarse(&tab.url).to_string(),
            work_type: WORK_TYPE,
            time_spent_minutes: minutes_spent(self.session.elapsed_secs),
            user_action: session_label(&self.session_label),
            date: self.clock.time().date_naive(),
            notes: self.session.notes.snapshot(),
        };
        debug!("Submitting report {payload:?}");

        match self.reporter.analyze(&payload).await {
            Ok(result) => {
                self.view
                    .show_output(&serde_json::to_string_pretty(&result)?);
                if let Some(artifact) = result.get("pdf").and_then(Value::as_str) {
                    match self.reporter.download(artifact).await {
                        Ok(path) => info!("Saved report artifact to {path:?}"),
                        Err(e) => error!("Artifact {artifact} download failed: {e:?}"),
                    }
                }
                self.session.reset();
                self.view.show_timer(0);
            }
            Err(e) => {
                warn!("Submission failed, keeping session state for retry: {e:?}");
                self.view.show_output(BACKEND_ERROR_TEXT);
            }
        }
        Ok(())
    }
}
