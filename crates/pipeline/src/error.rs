use signage_core::error::CoreError;
use signage_fal::FalApiError;

use crate::storage::StorageError;

/// Errors raised while executing a generation.
///
/// The `Display` text of the error is what ends up in the record's
/// `error_message` when a run fails.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Generation API error: {0}")]
    Api(#[from] FalApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Generation result contained no output files")]
    MissingOutput,

    #[error("Timed out after {0} seconds waiting for the generation API")]
    TimedOut(u64),
}
