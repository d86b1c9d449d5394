//! Intent routing: picks exactly one handler per message and logs the turn.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::LazyLock;

use futures::FutureExt;
use regex::Regex;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use clariq_fetcher::ContentFetcher;
use clariq_shared::{ConversationLogEntry, Intent, Reply, Result};
use clariq_storage::Storage;

use crate::canned::CannedResponder;

/// Default number of page-text characters shown in a web reply.
pub const DEFAULT_PREVIEW_CHARS: usize = 500;

/// Lowercase phrases that route a message to the identity handler.
pub const IDENTITY_PHRASES: &[&str] = &["who are you", "what are you", "your name", "what can you do"];

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[a-zA-Z0-9$-_@.&+!*(),%]+").expect("valid URL pattern")
});

/// First `http(s)://` URL in `message`, as written.
pub fn extract_url(message: &str) -> Option<&str> {
    URL_PATTERN.find(message).map(|m| m.as_str())
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Question/answer lookup plus the append-only turn log.
pub trait KnowledgeBase: Send + Sync {
    /// Answer of the first stored question containing `query`.
    fn lookup(&self, query: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Append one conversation log row.
    fn log(&self, entry: &ConversationLogEntry) -> impl Future<Output = Result<()>> + Send;
}

/// "GET page, return paragraph text."
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<String>> + Send;
}

impl KnowledgeBase for Storage {
    async fn lookup(&self, query: &str) -> Result<Option<String>> {
        self.lookup_answer(query).await
    }

    async fn log(&self, entry: &ConversationLogEntry) -> Result<()> {
        self.insert_conversation_log(entry).await
    }
}

impl PageFetcher for ContentFetcher {
    async fn fetch(&self, url: &Url) -> Result<String> {
        ContentFetcher::fetch(self, url).await
    }
}

// ---------------------------------------------------------------------------
// IntentRouter
// ---------------------------------------------------------------------------

/// Routes a message to the web, identity, knowledge or general-chat handler.
///
/// Holds only read-only collaborators, so one instance can serve concurrent
/// requests behind an `Arc`.
#[derive(Debug)]
pub struct IntentRouter<K, F> {
    knowledge: K,
    fetcher: F,
    responder: CannedResponder,
    preview_chars: usize,
}

impl<K: KnowledgeBase, F: PageFetcher> IntentRouter<K, F> {
    pub fn new(knowledge: K, fetcher: F, responder: CannedResponder) -> Self {
        Self {
            knowledge,
            fetcher,
            responder,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }

    /// Override how many characters of fetched text a web reply shows.
    pub fn with_preview_chars(mut self, preview_chars: usize) -> Self {
        self.preview_chars = preview_chars;
        self
    }

    pub fn knowledge(&self) -> &K {
        &self.knowledge
    }

    /// Route `message` and return only the response text.
    pub async fn respond(&self, message: &str) -> String {
        self.reply(message).await.text
    }

    /// Route `message`, log the turn, and return the text with its intent.
    ///
    /// Never fails: a panic while routing becomes an `error` reply.
    #[instrument(skip_all, fields(message_len = message.len()))]
    pub async fn reply(&self, message: &str) -> Reply {
        let reply = match AssertUnwindSafe(self.route(message)).catch_unwind().await {
            Ok(reply) => reply,
            Err(panic) => {
                let detail = panic_detail(panic.as_ref());
                error!(%detail, "routing failed");
                Reply::new(
                    format!("Error processing your request: {detail}"),
                    Intent::Error,
                )
            }
        };

        info!(intent = %reply.intent, "turn routed");
        self.record(message, &reply).await;
        reply
    }

    async fn route(&self, message: &str) -> Reply {
        if let Some(url) = extract_url(message) {
            return Reply::new(self.web_reply(url).await, Intent::WebQuery);
        }

        let lowered = message.to_lowercase();
        if IDENTITY_PHRASES.iter().any(|phrase| lowered.contains(phrase)) {
            return Reply::new(self.responder.respond(message, None), Intent::IdentityQuery);
        }

        match self.knowledge.lookup(message).await {
            Ok(Some(answer)) if !answer.is_empty() => {
                return Reply::new(answer, Intent::KnowledgeQuery);
            }
            Ok(_) => debug!("no knowledge match"),
            Err(e) => warn!(error = %e, "knowledge lookup failed, treating as no match"),
        }

        Reply::new(self.responder.respond(message, None), Intent::GeneralChat)
    }

    /// `From {url}: {preview}...`; fetch failures become the preview text.
    async fn web_reply(&self, raw_url: &str) -> String {
        let text = match Url::parse(raw_url) {
            Ok(url) => match self.fetcher.fetch(&url).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(url = raw_url, error = %e, "fetch failed");
                    format!("Error accessing URL: {e}")
                }
            },
            Err(e) => format!("Error accessing URL: {e}"),
        };

        let preview: String = text.chars().take(self.preview_chars).collect();
        format!("From {raw_url}: {preview}...")
    }

    async fn record(&self, message: &str, reply: &Reply) {
        let entry = ConversationLogEntry::for_turn(message, reply);
        if let Err(e) = self.knowledge.log(&entry).await {
            warn!(error = %e, "failed to log conversation turn");
        }
    }
}

fn panic_detail(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected internal failure".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use clariq_shared::ClariqError;

    use super::*;
    use crate::canned::{CannedResponseTable, Category};

    /// In-memory knowledge base recording every logged turn.
    #[derive(Default)]
    struct MemoryKnowledge {
        entries: Vec<(String, String)>,
        logs: Mutex<Vec<ConversationLogEntry>>,
        lookups: AtomicUsize,
        fail_lookup: bool,
        fail_log: bool,
    }

    impl MemoryKnowledge {
        fn with(entries: &[(&str, &str)]) -> Self {
            Self {
                entries: entries
                    .iter()
                    .map(|(q, a)| (q.to_string(), a.to_string()))
                    .collect(),
                ..Self::default()
            }
        }

        fn logged(&self) -> Vec<ConversationLogEntry> {
            self.logs.lock().unwrap().clone()
        }
    }

    impl KnowledgeBase for MemoryKnowledge {
        async fn lookup(&self, query: &str) -> Result<Option<String>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.fail_lookup {
                return Err(ClariqError::storage("database is locked"));
            }
            Ok(self
                .entries
                .iter()
                .find(|(q, _)| q.contains(query))
                .map(|(_, a)| a.clone()))
        }

        async fn log(&self, entry: &ConversationLogEntry) -> Result<()> {
            if self.fail_log {
                return Err(ClariqError::storage("disk I/O error"));
            }
            self.logs.lock().unwrap().push(entry.clone());
            Ok(())
        }
    }

    enum StubFetcher {
        Text(String),
        Fail,
        Panic,
    }

    impl PageFetcher for StubFetcher {
        async fn fetch(&self, url: &Url) -> Result<String> {
            match self {
                Self::Text(text) => Ok(text.clone()),
                Self::Fail => Err(ClariqError::Network(format!("{url}: connection refused"))),
                Self::Panic => panic!("fetcher exploded"),
            }
        }
    }

    fn router(
        knowledge: MemoryKnowledge,
        fetcher: StubFetcher,
    ) -> IntentRouter<MemoryKnowledge, StubFetcher> {
        IntentRouter::new(
            knowledge,
            fetcher,
            CannedResponder::seeded(CannedResponseTable::builtin(), 7),
        )
    }

    fn pool(category: Category) -> Vec<String> {
        CannedResponseTable::builtin().pool(category).to_vec()
    }

    #[test]
    fn extract_url_finds_first_url() {
        assert_eq!(
            extract_url("see https://a.example/x and http://b.example"),
            Some("https://a.example/x")
        );
        assert_eq!(extract_url("go to http://example.com?q=1"), Some("http://example.com?q=1"));
        assert_eq!(extract_url("no links here"), None);
        assert_eq!(extract_url("ftp://example.com"), None);
    }

    #[tokio::test]
    async fn url_dominates_other_keywords() {
        let router = router(
            MemoryKnowledge::default(),
            StubFetcher::Text("Example page text.".into()),
        );
        let reply = router
            .reply("hello, who are you? tell me a joke about https://example.com/page")
            .await;
        assert_eq!(reply.intent, Intent::WebQuery);
        assert_eq!(reply.text, "From https://example.com/page: Example page text....");
        assert_eq!(router.knowledge().lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn web_reply_truncates_long_text() {
        let long = "a".repeat(1200);
        let router = router(MemoryKnowledge::default(), StubFetcher::Text(long));
        let reply = router.reply("summarize https://example.com").await;

        let prefix = "From https://example.com: ";
        assert!(reply.text.starts_with(prefix));
        assert!(reply.text.ends_with("..."));
        let content = &reply.text[prefix.len()..reply.text.len() - 3];
        assert_eq!(content.chars().count(), 500);
    }

    #[tokio::test]
    async fn preview_length_is_configurable_and_counts_chars() {
        let router = router(
            MemoryKnowledge::default(),
            StubFetcher::Text("héllo wörld".into()),
        )
        .with_preview_chars(4);
        let reply = router.reply("https://example.com").await;
        assert_eq!(reply.text, "From https://example.com: héll...");
    }

    #[tokio::test]
    async fn fetch_failure_is_reported_in_band() {
        let router = router(MemoryKnowledge::default(), StubFetcher::Fail);
        let reply = router.reply("read https://example.com/down").await;
        assert_eq!(reply.intent, Intent::WebQuery);
        assert!(
            reply
                .text
                .starts_with("From https://example.com/down: Error accessing URL:")
        );
        assert!(reply.text.ends_with("..."));
    }

    #[tokio::test]
    async fn identity_phrases_route_to_canned_responses() {
        let router = router(
            MemoryKnowledge::with(&[("who are you really", "A knowledge answer")]),
            StubFetcher::Fail,
        );

        let reply = router.reply("Who are you?").await;
        assert_eq!(reply.intent, Intent::IdentityQuery);
        assert!(pool(Category::Identity).contains(&reply.text));

        let reply = router.reply("What can you do").await;
        assert_eq!(reply.intent, Intent::IdentityQuery);
        assert!(pool(Category::Capabilities).contains(&reply.text));

        assert_eq!(router.knowledge().lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn knowledge_match_returns_answer_verbatim() {
        let router = router(
            MemoryKnowledge::with(&[("What is AI?", "AI stands for Artificial Intelligence.")]),
            StubFetcher::Fail,
        );
        for query in ["AI", "What is AI"] {
            let reply = router.reply(query).await;
            assert_eq!(reply.intent, Intent::KnowledgeQuery);
            assert_eq!(reply.text, "AI stands for Artificial Intelligence.");
        }
    }

    #[tokio::test]
    async fn unmatched_messages_fall_through_to_general_chat() {
        let router = router(MemoryKnowledge::default(), StubFetcher::Fail);

        let reply = router.reply("Hello there").await;
        assert_eq!(reply.intent, Intent::GeneralChat);
        assert!(pool(Category::Greeting).contains(&reply.text));

        let reply = router.reply("Tell me a joke").await;
        assert_eq!(reply.intent, Intent::GeneralChat);
        assert!(pool(Category::Joke).contains(&reply.text));

        let reply = router.reply("quantum chromodynamics").await;
        assert_eq!(reply.intent, Intent::GeneralChat);
        assert!(pool(Category::Default).contains(&reply.text));
    }

    #[tokio::test]
    async fn lookup_failure_falls_through_to_general_chat() {
        let knowledge = MemoryKnowledge {
            fail_lookup: true,
            ..MemoryKnowledge::default()
        };
        let router = router(knowledge, StubFetcher::Fail);
        let reply = router.reply("Hello there").await;
        assert_eq!(reply.intent, Intent::GeneralChat);
    }

    #[tokio::test]
    async fn every_turn_is_logged_with_its_intent() {
        let router = router(
            MemoryKnowledge::with(&[("What is Python?", "A programming language.")]),
            StubFetcher::Text("page".into()),
        );
        router.reply("Python").await;
        router.reply("https://example.com").await;
        router.reply("Hello there").await;

        let logs = router.knowledge().logged();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].user_input, "Python");
        assert_eq!(logs[0].bot_response, "A programming language.");
        assert_eq!(logs[0].intent, Intent::KnowledgeQuery);
        assert_eq!(logs[0].tools_used.as_deref(), Some("knowledge_query"));
        assert_eq!(logs[1].intent, Intent::WebQuery);
        assert_eq!(logs[2].intent, Intent::GeneralChat);
    }

    #[tokio::test]
    async fn logging_failure_does_not_change_reply() {
        let knowledge = MemoryKnowledge {
            entries: vec![("What is AI?".into(), "Artificial Intelligence.".into())],
            fail_log: true,
            ..MemoryKnowledge::default()
        };
        let router = router(knowledge, StubFetcher::Fail);
        let reply = router.reply("What is AI").await;
        assert_eq!(reply.intent, Intent::KnowledgeQuery);
        assert_eq!(reply.text, "Artificial Intelligence.");
    }

    #[tokio::test]
    async fn panics_become_error_replies_and_are_logged() {
        let router = router(MemoryKnowledge::default(), StubFetcher::Panic);
        let reply = router.reply("open https://example.com").await;
        assert_eq!(reply.intent, Intent::Error);
        assert_eq!(reply.text, "Error processing your request: fetcher exploded");

        let logs = router.knowledge().logged();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].intent, Intent::Error);
        assert_eq!(logs[0].tools_used, None);
    }

    #[tokio::test]
    async fn respond_returns_reply_text() {
        let router = router(
            MemoryKnowledge::with(&[("What is Rust?", "A systems language.")]),
            StubFetcher::Fail,
        );
        assert_eq!(router.respond("Rust").await, "A systems language.");
    }
}
