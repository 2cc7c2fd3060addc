pub mod file;
pub mod sqlite;
pub mod title;
pub mod traits;


use anyhow::Result;
use tracing::info;

use crate::config::{Backend, StoreConfig};

// Re-export
pub use file::JsonTaskStore;
pub use sqlite::SqliteTaskStore;
pub use title::unique_title;
pub use traits::TaskStore;

/// Opens the backend named by `config`.
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn TaskStore>> {
    let path = config.storage_path();
    info!(backend = %config.backend, path = %path.display(), "opening task store");
    let store: Box<dyn TaskStore> = match config.backend {
        Backend::Json => Box::new(JsonTaskStore::open(path)?),
        Backend::Sqlite => Box::new(SqliteTaskStore::open(&path)?),
    };
    Ok(store)
}
