use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::utils::clock::Clock;

use super::PopupEvent;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Stopped,
    Running,
}

/// Two-state machine around the recurring one-second tick. At most one ticker
/// task is alive at any time; both transitions are idempotent.
pub struct SessionTimer {
    state: TimerState,
    ticker: Option<CancellationToken>,
    events: mpsc::Sender<PopupEvent>,
    clock: Arc<dyn Clock>,
}

impl SessionTimer {
    pub fn new(events: mpsc::Sender<PopupEvent>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: TimerState::Stopped,
            ticker: None,
            events,
            clock,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn start(&mut self) {
        if self.state == TimerState::Running {
            return;
        }
        debug!("Starting session ticker");
        let stop = CancellationToken::new();
        tokio::spawn(run_ticker(
            self.events.clone(),
            self.clock.clone(),
            stop.clone(),
        ));
        self.ticker = Some(stop);
        self.state = TimerState::Running;
    }

    pub fn stop(&mut self) {
        if self.state == TimerState::Stopped {
            return;
        }
        debug!("Stopping session ticker");
        if let Some(stop) = self.ticker.take() {
            stop.cancel();
        }
        self.state = TimerState::Stopped;
    }
}

async fn run_ticker(
    events: mpsc::Sender<PopupEvent>,
    clock: Arc<dyn Clock>,
    stop: CancellationToken,
) {
    let mut next = clock.instant() + TICK_INTERVAL;
    loop {
        tokio::select! {
            // Checked first so a stopped timer can never emit a late tick.
            biased;
            _ = stop.cancelled() => return,
            _ = clock.sleep_until(next) => {}
        }
        // A closed channel means the popup is gone and the ticker with it.
        if events.send(PopupEvent::Tick).await.is_err() {
            return;
        }
        next += TICK_INTERVAL;
    }
}
