//! Conversational core for ClariQ.
//!
//! This crate decides how each user message is answered:
//! - [`router`]: the ordered intent policy (web → identity → knowledge → chat)
//! - [`canned`]: keyword-matched canned responses for small talk
//! - [`bootstrap`]: builds the production router from configuration

pub mod bootstrap;
pub mod canned;
pub mod router;

pub use bootstrap::{ChatRouter, build_router, open_router};
pub use canned::{CannedResponder, CannedResponseTable, Category};
pub use router::{IntentRouter, KnowledgeBase, PageFetcher, extract_url};
