use thiserror::Error;

/// Typed failures from the store layer. Everything else (I/O, JSON, SQLite)
/// is propagated as-is through `anyhow`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unsupported storage backend '{0}' (expected 'json' or 'sqlite')")]
    UnsupportedBackend(String),

    #[error("stored task has an invalid id '{0}'")]
    InvalidId(String),

    #[error("stored task {id} has an invalid {field} timestamp '{value}'")]
    InvalidTimestamp {
        id: String,
        field: &'static str,
        value: String,
    },
}
