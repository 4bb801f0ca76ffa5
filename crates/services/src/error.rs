//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use workout_core::finish::FinishError;

/// Errors emitted by the live workout engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("workout already finished")]
    Completed,
    #[error(transparent)]
    Finish(#[from] FinishError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
