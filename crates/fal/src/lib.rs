//! fal.ai REST client.
//!
//! Wraps the synchronous run endpoint, the request queue
//! (submit / status / result / cancel) and plain file downloads, and
//! parses generated output files out of result documents.

pub mod api;
pub mod messages;

pub use api::{DownloadedFile, FalApi, FalApiError, FalConfig};
pub use messages::{extract_output_files, OutputFile, QueueState, QueueStatus, QueueSubmission};
