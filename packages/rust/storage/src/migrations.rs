//! SQL migration definitions for the ClariQ database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Initial schema: knowledge, conversation_logs",
            sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Question/answer pairs for substring lookup
CREATE TABLE IF NOT EXISTS knowledge (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    question   TEXT NOT NULL,
    answer     TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Append-only audit trail of routed turns
CREATE TABLE IF NOT EXISTS conversation_logs (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    user_input   TEXT NOT NULL,
    bot_response TEXT NOT NULL,
    intent       TEXT NOT NULL,
    tools_used   TEXT,
    timestamp    TEXT NOT NULL
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
        Migration {
            version: 2,
            description: "Index conversation_logs by intent",
            sql: r#"
CREATE INDEX IF NOT EXISTS idx_conversation_logs_intent ON conversation_logs(intent);

INSERT INTO schema_migrations (version) VALUES (2);
"#,
        },
    ]
}
