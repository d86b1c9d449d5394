//! Production wiring: config → storage + fetcher + canned table → router.

use tracing::info;

use clariq_fetcher::ContentFetcher;
use clariq_shared::{AppConfig, Result};
use clariq_storage::Storage;

use crate::canned::{CannedResponder, CannedResponseTable};
use crate::router::IntentRouter;

/// Router backed by the libSQL store and the HTTP fetcher.
pub type ChatRouter = IntentRouter<Storage, ContentFetcher>;

/// Open the configured database (migrating it) and build a router over it.
pub async fn open_router(config: &AppConfig) -> Result<ChatRouter> {
    let db_path = config.storage.resolved_db_path()?;
    let storage = Storage::open(&db_path).await?;
    info!(db = %db_path.display(), "storage opened");
    build_router(config, storage)
}

/// Build a router over an already-open `storage`.
pub fn build_router(config: &AppConfig, storage: Storage) -> Result<ChatRouter> {
    let fetcher = ContentFetcher::new(&config.fetch)?;
    let table = CannedResponseTable::with_overrides(&config.responses)?;
    Ok(IntentRouter::new(storage, fetcher, CannedResponder::new(table))
        .with_preview_chars(config.fetch.preview_chars))
}
