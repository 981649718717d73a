//! Contract with the browser side of the system. The popup only ever sees the
//! active tab through [TabProvider] and learns about focus changes through
//! [FocusSignal] values delivered over a channel.

use std::sync::Arc;

use anyhow::Result;

#[cfg(test)]
use mockall::automock;

pub type TabId = i32;
pub type WindowId = i32;

/// Sentinel delivered when every browser window has lost focus.
pub const WINDOW_ID_NONE: WindowId = -1;

#[derive(Debug, Clone)]
pub struct ActiveTabData {
    pub tab_id: TabId,
    /// Full address of the tab. For example 'https://colab.research.google.com/drive/abc'
    pub url: Arc<str>,
}

/// Query capability for the currently active tab in the current window.
#[cfg_attr(test, automock)]
pub trait TabProvider: Send {
    fn query_active_tab(&mut self) -> Result<ActiveTabData>;
}

/// Focus change notifications the popup subscribes to at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusSignal {
    /// A tab became the active one in its window.
    TabActivated { tab_id: TabId },
    /// Browser window focus moved, possibly away from the browser entirely.
    WindowFocusChanged { window_id: WindowId },
}
