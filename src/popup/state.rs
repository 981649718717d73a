use crate::tab_api::TabId;

use super::notes::NoteCollector;

/// Everything one popup-open-to-submission cycle accumulates. Owned by the
/// controller, never persisted; it dies with the popup.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Seconds the tracked tab has been focused since the last reset.
    pub elapsed_secs: u64,
    pub notes: NoteCollector,
    /// Tab recorded at popup open. Focus signals are matched against it.
    pub current_tab_id: Option<TabId>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ends the submission cycle. The tracked tab stays recorded so the timer
    /// keeps reacting to focus signals after a submission.
    pub fn reset(&mut self) {
        self.elapsed_secs = 0;
        self.notes.clear();
    }
}
