//! Keyword-triggered canned responses for small talk.
//!
//! A message is classified into a [`Category`] by case-insensitive substring
//! match against fixed trigger phrases, then one response is drawn uniformly
//! at random from that category's pool.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use clariq_shared::{ClariqError, Result};

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Small-talk category, in classification priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Greeting,
    Farewell,
    Thanks,
    Identity,
    Name,
    Capabilities,
    Joke,
    /// Follow-up asking for another joke.
    Repeat,
    /// Conversation reset request. Only acknowledged here.
    ClearHistory,
    Default,
}

impl Category {
    /// All categories in the order they are tested.
    pub const ALL: [Category; 10] = [
        Category::Greeting,
        Category::Farewell,
        Category::Thanks,
        Category::Identity,
        Category::Name,
        Category::Capabilities,
        Category::Joke,
        Category::Repeat,
        Category::ClearHistory,
        Category::Default,
    ];

    /// Config/table key for this category.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Farewell => "farewell",
            Self::Thanks => "thanks",
            Self::Identity => "identity",
            Self::Name => "name",
            Self::Capabilities => "capabilities",
            Self::Joke => "joke",
            Self::Repeat => "repeat",
            Self::ClearHistory => "clear_history",
            Self::Default => "default",
        }
    }

    /// Lowercase trigger phrases. `Default` has none.
    pub fn triggers(self) -> &'static [&'static str] {
        match self {
            Self::Greeting => &["hello", "hi", "hey", "howdy"],
            Self::Farewell => &["bye", "goodbye", "later", "see you"],
            Self::Thanks => &["thank", "thanks", "appreciate"],
            Self::Identity => &[
                "who are you",
                "what are you",
                "tell me about yourself",
                "your purpose",
            ],
            Self::Name => &[
                "your name",
                "what's your name",
                "what are you called",
                "what should i call you",
            ],
            Self::Capabilities => &[
                "what can you do",
                "your abilities",
                "your capabilities",
                "help me with",
                "how can you help",
            ],
            Self::Joke => &[
                "tell me a joke",
                "say something funny",
                "make me laugh",
                "know any joke",
                "tell joke",
            ],
            Self::Repeat => &[
                "another",
                "another one",
                "tell me more",
                "can you repeat",
                "another joke",
                "one more",
            ],
            Self::ClearHistory => &["clear", "reset conversation", "start over"],
            Self::Default => &[],
        }
    }

    /// Classify `message`: the first category with a trigger contained in
    /// the lowercased message, or [`Category::Default`].
    ///
    /// Matching is plain substring containment, so "this" triggers the
    /// greeting via "hi".
    pub fn classify(message: &str) -> Category {
        let lowered = message.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| {
                category
                    .triggers()
                    .iter()
                    .any(|trigger| lowered.contains(trigger))
            })
            .unwrap_or(Category::Default)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ClariqError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ClariqError::validation(format!("unknown response category '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// CannedResponseTable
// ---------------------------------------------------------------------------

/// Category → non-empty pool of literal responses. Immutable once built.
#[derive(Debug, Clone)]
pub struct CannedResponseTable {
    pools: HashMap<Category, Vec<String>>,
}

impl CannedResponseTable {
    /// The built-in pools.
    pub fn builtin() -> Self {
        let pools = Category::ALL
            .into_iter()
            .map(|category| {
                let pool = builtin_pool(category)
                    .iter()
                    .map(|s| (*s).to_string())
                    .collect();
                (category, pool)
            })
            .collect();
        Self { pools }
    }

    /// Built-in pools with per-category replacements (the `[responses]`
    /// config section). Unknown category names and empty pools are rejected.
    pub fn with_overrides(overrides: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut table = Self::builtin();
        for (name, pool) in overrides {
            let category: Category = name.parse().map_err(|_| {
                ClariqError::config(format!("unknown response category '{name}'"))
            })?;
            if pool.is_empty() {
                return Err(ClariqError::config(format!(
                    "response pool for '{category}' must not be empty"
                )));
            }
            table.pools.insert(category, pool.clone());
        }
        Ok(table)
    }

    /// The response pool for `category`.
    pub fn pool(&self, category: Category) -> &[String] {
        self.pools
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl Default for CannedResponseTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_pool(category: Category) -> &'static [&'static str] {
    match category {
        Category::Greeting => &["Hello!", "Hi there!", "Hey! How can I help you?"],
        Category::Farewell => &["Goodbye!", "See you later!", "Have a nice day!"],
        Category::Thanks => &["You're welcome!", "My pleasure!", "Happy to help!"],
        Category::Identity => &[
            "I'm an AI chatbot designed to assist you with information, web searches, and conversation.",
            "I'm your friendly AI assistant, ready to help with your questions!",
            "I'm a conversational AI built to provide information and assistance.",
        ],
        Category::Name => &[
            "You can call me ChatBot!",
            "I'm ChatBot, your AI assistant.",
            "My name is ChatBot, how can I help you today?",
        ],
        Category::Capabilities => &[
            "I can answer questions, search for information in my knowledge base, and extract content from websites.",
            "I'm capable of answering questions, having conversations, and helping you find information online.",
            "My capabilities include answering questions, web searching, and friendly conversation.",
        ],
        Category::Joke => &[
            "Why don't scientists trust atoms? Because they make up everything!",
            "Why did the math book look sad? Because it had too many problems!",
            "What do you get if you cross a cat with a dark horse? Kitty Perry!",
        ],
        Category::Repeat => &["Sure! Here's another one:", "Let me tell you another."],
        Category::ClearHistory => &["Chat history cleared.", "Starting fresh!", "Conversation reset."],
        Category::Default => &[
            "I'm not sure how to respond to that.",
            "Could you rephrase your question?",
            "I don't have information on that yet.",
        ],
    }
}

// ---------------------------------------------------------------------------
// CannedResponder
// ---------------------------------------------------------------------------

/// Random source used to pick from a pool.
#[derive(Debug)]
enum Chooser {
    /// Thread-local entropy.
    Entropy,
    /// Fixed seed; reproducible sequences for tests.
    Seeded(Mutex<StdRng>),
}

impl Chooser {
    fn index(&self, len: usize) -> usize {
        match self {
            Self::Entropy => rand::thread_rng().gen_range(0..len),
            Self::Seeded(rng) => {
                let mut rng = rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                rng.gen_range(0..len)
            }
        }
    }
}

/// Picks a canned response for a message.
#[derive(Debug)]
pub struct CannedResponder {
    table: CannedResponseTable,
    chooser: Chooser,
}

impl CannedResponder {
    /// Responder drawing from thread-local entropy.
    pub fn new(table: CannedResponseTable) -> Self {
        Self {
            table,
            chooser: Chooser::Entropy,
        }
    }

    /// Responder whose choices are reproducible for a given `seed`.
    pub fn seeded(table: CannedResponseTable, seed: u64) -> Self {
        Self {
            table,
            chooser: Chooser::Seeded(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    pub fn table(&self) -> &CannedResponseTable {
        &self.table
    }

    /// Pick a response for `message`. With a `category_hint` the message is
    /// not classified and the hinted pool is used directly.
    pub fn respond(&self, message: &str, category_hint: Option<Category>) -> String {
        let category = category_hint.unwrap_or_else(|| Category::classify(message));
        let pool = self.table.pool(category);
        // Pools are non-empty by construction of the table.
        let choice = self.chooser.index(pool.len());
        tracing::debug!(%category, choice, "canned response selected");
        pool[choice].clone()
    }
}

impl Default for CannedResponder {
    fn default() -> Self {
        Self::new(CannedResponseTable::builtin())
    }
}
