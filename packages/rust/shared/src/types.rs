//! Core domain types shared by the router, the store and the front-ends.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClariqError;

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

/// Which handler produced the response for one user turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// The message carried a URL; the page content answered it.
    WebQuery,
    /// The message asked about the assistant itself.
    IdentityQuery,
    /// A stored knowledge entry answered it.
    KnowledgeQuery,
    /// A canned small-talk response answered it.
    GeneralChat,
    /// Routing failed; the response is an error message.
    Error,
}

impl Intent {
    /// Every intent, in routing order.
    pub const ALL: [Intent; 5] = [
        Intent::WebQuery,
        Intent::IdentityQuery,
        Intent::KnowledgeQuery,
        Intent::GeneralChat,
        Intent::Error,
    ];

    /// The label stored in the `conversation_logs.intent` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WebQuery => "web_query",
            Self::IdentityQuery => "identity_query",
            Self::KnowledgeQuery => "knowledge_query",
            Self::GeneralChat => "general_chat",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = ClariqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|intent| intent.as_str() == s)
            .ok_or_else(|| ClariqError::parse(format!("unknown intent label '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Reply
// ---------------------------------------------------------------------------

/// The outcome of routing one message: the text shown to the user and the
/// intent recorded for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Response text returned to the caller.
    pub text: String,
    /// Intent label of the handler that produced `text`.
    pub intent: Intent,
}

impl Reply {
    pub fn new(text: impl Into<String>, intent: Intent) -> Self {
        Self {
            text: text.into(),
            intent,
        }
    }
}

// ---------------------------------------------------------------------------
// KnowledgeEntry
// ---------------------------------------------------------------------------

/// A stored question/answer pair. Never updated once inserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Row id; insertion order.
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ConversationLogEntry
// ---------------------------------------------------------------------------

/// One audited request/response turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationLogEntry {
    /// The raw user message.
    pub user_input: String,
    /// The text returned to the user.
    pub bot_response: String,
    /// Intent recorded for the turn.
    pub intent: Intent,
    /// Handler label; `None` for failed turns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_used: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ConversationLogEntry {
    /// Build the log row for a routed turn, stamped now.
    ///
    /// Successful turns record their intent label as the tool used; error
    /// turns leave it empty.
    pub fn for_turn(user_input: &str, reply: &Reply) -> Self {
        let tools_used = match reply.intent {
            Intent::Error => None,
            intent => Some(intent.as_str().to_string()),
        };
        Self {
            user_input: user_input.to_string(),
            bot_response: reply.text.clone(),
            intent: reply.intent,
            tools_used,
            timestamp: Utc::now(),
        }
    }
}
