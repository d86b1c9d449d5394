//! Web page fetching and paragraph-text extraction.
//!
//! This crate provides:
//! - [`ContentFetcher`]: single-shot HTTP GET with timeout, user agent and SSRF guard
//! - [`extract_paragraph_text`]: reduces an HTML document to its visible `<p>` text

mod client;
mod extract;

pub use client::ContentFetcher;
pub use extract::extract_paragraph_text;
