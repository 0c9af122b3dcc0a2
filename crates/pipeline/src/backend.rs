//! The seam between the runner and the generation API.
//!
//! [`GenerationRunner`](crate::GenerationRunner) is generic over
//! [`GenerationBackend`] so the poll loop and the persistence steps can be
//! exercised against an in-memory fake.

use std::future::Future;

use signage_fal::{DownloadedFile, FalApi, FalApiError, QueueStatus, QueueSubmission};

/// Operations the pipeline needs from a generation API.
pub trait GenerationBackend: Send + Sync + 'static {
    /// Run a model and wait for its result document.
    fn run(
        &self,
        model: &str,
        input: &serde_json::Value,
    ) -> impl Future<Output = Result<serde_json::Value, FalApiError>> + Send;

    /// Queue a request and return its id.
    fn submit(
        &self,
        model: &str,
        input: &serde_json::Value,
    ) -> impl Future<Output = Result<QueueSubmission, FalApiError>> + Send;

    fn status(
        &self,
        model: &str,
        request_id: &str,
    ) -> impl Future<Output = Result<QueueStatus, FalApiError>> + Send;

    fn result(
        &self,
        model: &str,
        request_id: &str,
    ) -> impl Future<Output = Result<serde_json::Value, FalApiError>> + Send;

    fn cancel(
        &self,
        model: &str,
        request_id: &str,
    ) -> impl Future<Output = Result<(), FalApiError>> + Send;

    fn download(&self, url: &str)
        -> impl Future<Output = Result<DownloadedFile, FalApiError>> + Send;
}

impl GenerationBackend for FalApi {
    fn run(
        &self,
        model: &str,
        input: &serde_json::Value,
    ) -> impl Future<Output = Result<serde_json::Value, FalApiError>> + Send {
        FalApi::run(self, model, input)
    }

    fn submit(
        &self,
        model: &str,
        input: &serde_json::Value,
    ) -> impl Future<Output = Result<QueueSubmission, FalApiError>> + Send {
        FalApi::submit(self, model, input)
    }

    fn status(
        &self,
        model: &str,
        request_id: &str,
    ) -> impl Future<Output = Result<QueueStatus, FalApiError>> + Send {
        FalApi::status(self, model, request_id)
    }

    fn result(
        &self,
        model: &str,
        request_id: &str,
    ) -> impl Future<Output = Result<serde_json::Value, FalApiError>> + Send {
        FalApi::result(self, model, request_id)
    }

    fn cancel(
        &self,
        model: &str,
        request_id: &str,
    ) -> impl Future<Output = Result<(), FalApiError>> + Send {
        FalApi::cancel(self, model, request_id)
    }

    fn download(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<DownloadedFile, FalApiError>> + Send {
        FalApi::download(self, url)
    }
}
