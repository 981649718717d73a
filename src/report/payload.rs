use chrono::NaiveDate;
use serde::Serialize;

/// Every report carries the same work type; the backend keys its analysis on
/// the other fields.
pub const WORK_TYPE: &str = "Coding / Analysis";

pub const DEFAULT_SESSION_LABEL: &str = "Work Session";

/// Snapshot of one session, taken at submission time. Immutable once built
/// and sent exactly once.
#[derive(Debug, Clone, Serialize)]
pub struct ReportPayload {
    pub platform: String,
    pub work_type: &'static str,
    pub time_spent_minutes: u64,
    pub user_action: String,
    pub date: NaiveDate,
    pub notes: Vec<String>,
}

/// Elapsed seconds rounded half-up to minutes, floored at one so even an
/// instant submission counts as a minute of work.
pub fn minutes_spent(elapsed_secs: u64) -> u64 {
    ((elapsed_secs + 30) / 60).max(1)
}

/// Session label as entered by the user, defaulting when left blank.
pub fn session_label(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        DEFAULT_SESSION_LABEL.to_string()
    } else {
        trimmed.to_string()
    }
}
