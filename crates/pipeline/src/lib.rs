//! Generation pipeline: submit a request to the generation API, wait for
//! it (synchronously or by polling the queue), download the outputs and
//! persist them.

pub mod backend;
pub mod error;
pub mod media;
pub mod poll;
pub mod registry;
pub mod runner;
pub mod storage;

pub use backend::GenerationBackend;
pub use error::PipelineError;
pub use poll::{poll_until_terminal, PollOutcome};
pub use registry::{PollGuard, PollRegistry};
pub use runner::{GenerationRunner, RunnerSettings};
pub use storage::{FileStorage, StorageError};
