//! Headless counterpart of a browser work-session popup. Counts elapsed
//! seconds while a tracked tab stays focused, collects freeform notes, and on
//! demand submits a session summary to a local analysis backend, saving any
//! generated report artifact.
//!

pub mod cli;
pub mod popup;
pub mod report;
pub mod tab_api;
pub mod utils;
pub mod view;
