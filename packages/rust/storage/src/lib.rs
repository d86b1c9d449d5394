//! libSQL storage layer for the knowledge table and the conversation log.
//!
//! The [`Storage`] struct wraps a local libSQL database holding:
//! - `knowledge`: question/answer pairs matched by substring lookup
//! - `conversation_logs`: the append-only audit trail of routed turns
//!
//! **Access rules:**
//! - CLI / server / TUI chat: read-write via [`Storage::open`]
//! - Inspection commands (`clariq logs`, `clariq knowledge list`): read-only via
//!   [`Storage::open_readonly`]

mod migrations;
mod seed;

use std::path::Path;

use chrono::{DateTime, Utc};
use clariq_shared::{ClariqError, ConversationLogEntry, KnowledgeEntry, Result};
use libsql::{Connection, Database, params};

pub use seed::DEFAULT_KNOWLEDGE;

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ClariqError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(ClariqError::storage)?;

        let conn = db.connect().map_err(ClariqError::storage)?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ClariqError::Storage(format!(
                "database not found at {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(ClariqError::storage)?;

        let conn = db.connect().map_err(ClariqError::storage)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        ClariqError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(ClariqError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Knowledge operations
    // -----------------------------------------------------------------------

    /// Insert a question/answer pair. Returns the new row id.
    pub async fn insert_knowledge(&self, question: &str, answer: &str) -> Result<i64> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO knowledge (question, answer, created_at) VALUES (?1, ?2, ?3)",
                params![question, answer, now.as_str()],
            )
            .await
            .map_err(ClariqError::storage)?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Find the answer of the first stored question (by insertion order)
    /// that contains `query` as a substring.
    ///
    /// Matching follows SQLite `LIKE` semantics (ASCII case-insensitive);
    /// wildcard characters in `query` are escaped so they match literally.
    /// The query is not normalized: an empty query matches every question.
    pub async fn lookup_answer(&self, query: &str) -> Result<Option<String>> {
        let pattern = format!("%{}%", escape_like(query));
        let mut rows = self
            .conn
            .query(
                r"SELECT answer FROM knowledge
                 WHERE question LIKE ?1 ESCAPE '\'
                 ORDER BY id
                 LIMIT 1",
                params![pattern.as_str()],
            )
            .await
            .map_err(ClariqError::storage)?;

        match rows.next().await {
            Ok(Some(row)) => {
                let answer: String = row.get(0).map_err(ClariqError::storage)?;
                Ok(Some(answer))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(ClariqError::storage(e)),
        }
    }

    /// List all knowledge entries in insertion order.
    pub async fn list_knowledge(&self) -> Result<Vec<KnowledgeEntry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, question, answer, created_at FROM knowledge ORDER BY id",
                params![],
            )
            .await
            .map_err(ClariqError::storage)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(ClariqError::storage)? {
            results.push(row_to_knowledge_entry(&row)?);
        }
        Ok(results)
    }

    /// Number of stored knowledge entries.
    pub async fn knowledge_count(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM knowledge", params![])
            .await
            .map_err(ClariqError::storage)?;

        match rows.next().await {
            Ok(Some(row)) => {
                let count: i64 = row.get(0).map_err(ClariqError::storage)?;
                Ok(count.max(0) as u64)
            }
            Ok(None) => Ok(0),
            Err(e) => Err(ClariqError::storage(e)),
        }
    }

    /// Insert [`DEFAULT_KNOWLEDGE`] if the knowledge table is empty.
    /// Returns how many entries were inserted.
    pub async fn seed_default_knowledge(&self) -> Result<usize> {
        self.check_writable()?;
        if self.knowledge_count().await? > 0 {
            tracing::debug!("knowledge table not empty, skipping seed");
            return Ok(0);
        }

        for (question, answer) in DEFAULT_KNOWLEDGE {
            self.insert_knowledge(question, answer).await?;
        }
        tracing::info!(count = DEFAULT_KNOWLEDGE.len(), "seeded default knowledge");
        Ok(DEFAULT_KNOWLEDGE.len())
    }

    // -----------------------------------------------------------------------
    // Conversation log operations
    // -----------------------------------------------------------------------

    /// Append one turn to the conversation log.
    pub async fn insert_conversation_log(&self, entry: &ConversationLogEntry) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "INSERT INTO conversation_logs (user_input, bot_response, intent, tools_used, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    entry.user_input.as_str(),
                    entry.bot_response.as_str(),
                    entry.intent.as_str(),
                    entry.tools_used.as_deref(),
                    entry.timestamp.to_rfc3339(),
                ],
            )
            .await
            .map_err(ClariqError::storage)?;
        Ok(())
    }

    /// The most recent `limit` turns, newest first.
    pub async fn recent_conversation_logs(&self, limit: u32) -> Result<Vec<ConversationLogEntry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT user_input, bot_response, intent, tools_used, timestamp
                 FROM conversation_logs
                 ORDER BY id DESC
                 LIMIT ?1",
                params![limit],
            )
            .await
            .map_err(ClariqError::storage)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(ClariqError::storage)? {
            results.push(row_to_log_entry(&row)?);
        }
        Ok(results)
    }
}

/// Escape `LIKE` wildcards (`%`, `_`) and the escape character itself.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ClariqError::Storage(format!("invalid date: {e}")))
}

/// Convert a database row to a [`KnowledgeEntry`].
fn row_to_knowledge_entry(row: &libsql::Row) -> Result<KnowledgeEntry> {
    let created_at: String = row.get(3).map_err(ClariqError::storage)?;
    Ok(KnowledgeEntry {
        id: row.get::<i64>(0).map_err(ClariqError::storage)?,
        question: row.get::<String>(1).map_err(ClariqError::storage)?,
        answer: row.get::<String>(2).map_err(ClariqError::storage)?,
        created_at: parse_timestamp(&created_at)?,
    })
}

/// Convert a database row to a [`ConversationLogEntry`].
fn row_to_log_entry(row: &libsql::Row) -> Result<ConversationLogEntry> {
    let intent: String = row.get(2).map_err(ClariqError::storage)?;
    let timestamp: String = row.get(4).map_err(ClariqError::storage)?;
    Ok(ConversationLogEntry {
        user_input: row.get::<String>(0).map_err(ClariqError::storage)?,
        bot_response: row.get::<String>(1).map_err(ClariqError::storage)?,
        intent: intent.parse()?,
        tools_used: row.get::<String>(3).ok(),
        timestamp: parse_timestamp(&timestamp)?,
    })
}
