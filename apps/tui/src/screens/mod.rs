//! TUI screen definitions.
//!
//! Each screen corresponds to a tab in the TUI and encapsulates its own
//! state and rendering. Work that needs the router or the database is
//! returned as an [`Action`] for the event loop to run.

pub(crate) mod chat;
pub(crate) mod history;
pub(crate) mod knowledge;

use std::fmt;

/// Screen identifiers, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScreenId {
    Chat,
    Knowledge,
    History,
}

impl ScreenId {
    pub(crate) const ALL: [ScreenId; 3] = [ScreenId::Chat, ScreenId::Knowledge, ScreenId::History];
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat => write!(f, "Chat"),
            Self::Knowledge => write!(f, "Knowledge"),
            Self::History => write!(f, "History"),
        }
    }
}

/// Async work requested by a screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    /// Route a chat message.
    Send(String),
    RefreshKnowledge,
    SeedKnowledge,
    RefreshHistory,
}
