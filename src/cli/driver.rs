//! Line-oriented bridge between a terminal and the popup. Each stdin line is
//! one browser event or user action:
//!
//! ```text
//! tab <id> <url>    activate a tab (also registers it for tab queries)
//! focus <id|none>   window focus change; `none` means no window is focused
//! note <text>       append a note
//! label <text>      set the session label
//! submit            submit the session report
//! quit              close the popup
//! ```

use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{
    popup::{PopupEvent, UserCommand},
    tab_api::{ActiveTabData, FocusSignal, TabProvider, WINDOW_ID_NONE},
};

/// Tab registry fed by `tab` lines. Stands in for the browser's tab-query
/// capability when the popup runs from a terminal.
#[derive(Clone, Default)]
pub struct BridgeTabs {
    active: Arc<Mutex<Option<ActiveTabData>>>,
}

impl BridgeTabs {
    pub fn set_active(&self, tab: ActiveTabData) {
        *self.active.lock().expect("tab registry lock poisoned") = Some(tab);
    }
}

impl TabProvider for BridgeTabs {
    fn query_active_tab(&mut self) -> Result<ActiveTabData> {
        self.active
            .lock()
            .expect("tab registry lock poisoned")
            .clone()
            .context("No active tab has been reported to the bridge")
    }
}

enum LineOutcome {
    Ignored,
    Event(PopupEvent),
    Quit,
}

fn parse_line(line: &str, tabs: &BridgeTabs) -> Result<LineOutcome> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(LineOutcome::Ignored);
    }
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    match command {
        "tab" => {
            let (id, url) = rest.split_once(' ').context("Usage: tab <id> <url>")?;
            let tab_id = id.parse().with_context(|| format!("Bad tab id {id:?}"))?;
            tabs.set_active(ActiveTabData {
                tab_id,
                url: url.into(),
            });
            Ok(LineOutcome::Event(PopupEvent::Focus(
                FocusSignal::TabActivated { tab_id },
            )))
        }
        "focus" => {
            let window_id = if rest == "none" {
                WINDOW_ID_NONE
            } else {
                rest.parse()
                    .with_context(|| format!("Bad window id {rest:?}"))?
            };
            Ok(LineOutcome::Event(PopupEvent::Focus(
                FocusSignal::WindowFocusChanged { window_id },
            )))
        }
        "note" => Ok(LineOutcome::Event(PopupEvent::Command(
            UserCommand::AddNote(rest.to_string()),
        ))),
        "label" => Ok(LineOutcome::Event(PopupEvent::Command(
            UserCommand::SetLabel(rest.to_string()),
        ))),
        "submit" => Ok(LineOutcome::Event(PopupEvent::Command(UserCommand::Submit))),
        "quit" => Ok(LineOutcome::Quit),
        other => bail!("Unknown command {other:?}"),
    }
}

/// Forwards stdin lines to the popup until `quit`, end of input, or shutdown.
/// Malformed lines are logged and skipped.
pub async fn run_bridge(
    tabs: BridgeTabs,
    events: mpsc::Sender<PopupEvent>,
    shutdown: CancellationToken,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            line = lines.next_line() => {
                let Some(line) = line? else {
                    shutdown.cancel();
                    return Ok(());
                };
                match parse_line(&line, &tabs) {
                    Ok(LineOutcome::Event(event)) => {
                        if events.send(event).await.is_err() {
                            return Ok(());
                        }
                    }
                    Ok(LineOutcome::Quit) => {
                        shutdown.cancel();
                        return Ok(());
                    }
                    Ok(LineOutcome::Ignored) => {}
                    Err(e) => warn!("Ignoring bridge line {line:?}: {e}"),
                }
            }
        }
    }
}
