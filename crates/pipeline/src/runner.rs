//! Generation runner: drives one generation record from `pending` to a
//! terminal state.
//!
//! The cycle is: submit the request (synchronous run for images, queue +
//! poll for videos), download every output file into [`FileStorage`], then
//! record the files and mark the record completed in one transaction. Any
//! error marks the record failed with the error text and leaves no output
//! files behind. Each status change is published on the [`EventBus`].
//!
//! One task per generation id at a time, enforced by the [`PollRegistry`].

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use signage_core::error::CoreError;
use signage_core::generation::{
    build_input, validate_model_id, validate_prompt, GenerationKind, GenerationStatus, SubmitMode,
    CANCELLED_MESSAGE, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT, INTERRUPTED_MESSAGE,
    INTERRUPTED_RUN_MESSAGE,
};
use signage_core::storage::{
    content_type_from_path, extension_for_content_type, fingerprint, generation_dir_key,
    generation_file_key,
};
use signage_core::DbId;
use signage_db::models::generation::{CreateGenerationFile, Generation, NewGeneration};
use signage_db::repositories::{GenerationFileRepo, GenerationRepo};
use signage_events::names::{
    ENTITY_GENERATION, GENERATION_COMPLETED, GENERATION_CREATED, GENERATION_FAILED,
    GENERATION_PROCESSING,
};
use signage_events::{EventBus, SignageEvent};
use signage_fal::{extract_output_files, OutputFile};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::backend::GenerationBackend;
use crate::error::PipelineError;
use crate::media::image_dimensions;
use crate::poll::{poll_until_terminal, PollOutcome};
use crate::registry::{PollGuard, PollRegistry};
use crate::storage::FileStorage;

/// How long [`GenerationRunner::shutdown`] waits for tasks to exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Content type recorded when neither the result nor the download names one.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Polling settings.
#[derive(Debug, Clone, Copy)]
pub struct RunnerSettings {
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

/// Counts reported by [`GenerationRunner::resume_in_flight`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResumeSummary {
    /// Processing records whose polling was restarted.
    pub resumed: usize,
    /// Records that could not be resumed and were marked failed: pending
    /// ones and synchronous runs.
    pub interrupted: usize,
}

/// Runs generations against a [`GenerationBackend`].
///
/// Shared as `Arc<GenerationRunner<B>>`; [`start`](Self::start) spawns
/// tasks that hold a clone of the `Arc`.
pub struct GenerationRunner<B: GenerationBackend> {
    pool: PgPool,
    backend: Arc<B>,
    storage: FileStorage,
    events: Arc<EventBus>,
    registry: PollRegistry,
    tasks: TaskTracker,
    settings: RunnerSettings,
}

impl<B: GenerationBackend> GenerationRunner<B> {
    pub fn new(
        pool: PgPool,
        backend: Arc<B>,
        storage: FileStorage,
        events: Arc<EventBus>,
        settings: RunnerSettings,
    ) -> Self {
        Self {
            pool,
            backend,
            storage,
            events,
            registry: PollRegistry::new(),
            tasks: TaskTracker::new(),
            settings,
        }
    }

    pub fn registry(&self) -> &PollRegistry {
        &self.registry
    }

    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }

    /// Validate the request, insert a `pending` record and start it.
    pub async fn launch(self: &Arc<Self>, input: &NewGeneration) -> Result<Generation, PipelineError> {
        GenerationKind::parse(&input.kind)?;
        validate_model_id(&input.model)?;
        validate_prompt(&input.prompt)?;
        build_input(&input.prompt, input.image_url.as_deref(), Some(&input.parameters))?;

        let generation = GenerationRepo::create(&self.pool, input).await?;
        tracing::info!(
            generation_id = generation.id,
            kind = %generation.kind,
            model = %generation.model,
            "Generation created",
        );
        self.publish(GENERATION_CREATED, &generation, json!({}));
        self.start(generation.clone());
        Ok(generation)
    }

    /// Spawn a task that drives `generation` to a terminal state.
    ///
    /// Returns `false` when a task for the same id is already running or
    /// the runner is shutting down.
    pub fn start(self: &Arc<Self>, generation: Generation) -> bool {
        let Some(guard) = self.registry.try_acquire(generation.id) else {
            tracing::debug!(generation_id = generation.id, "Generation already running");
            return false;
        };
        let runner = Arc::clone(self);
        self.tasks.spawn(async move { runner.drive(generation, guard).await });
        true
    }

    /// Task body: execute and turn any error into a failed record. The
    /// guard is released when this returns.
    async fn drive(&self, generation: Generation, guard: PollGuard) {
        let id = generation.id;
        if let Err(e) = self.execute(&generation, guard.token()).await {
            tracing::error!(generation_id = id, error = %e, "Generation failed");
            self.fail(id, &e.to_string()).await;
        }
    }

    /// Run `generation` until it completes, fails or `cancel` fires.
    ///
    /// A record that is already `processing` with a request id resumes
    /// polling instead of submitting again. Cancellation returns `Ok`
    /// without touching the record.
    pub async fn execute(
        &self,
        generation: &Generation,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        match self.submit_and_wait(generation, cancel).await? {
            PollOutcome::Completed(result) => self.complete(generation, result, cancel).await,
            PollOutcome::Failed(message) => {
                self.fail(generation.id, &message).await;
                Ok(())
            }
            PollOutcome::TimedOut => Err(PipelineError::TimedOut(
                self.settings.poll_timeout.as_secs(),
            )),
            PollOutcome::Cancelled => {
                tracing::info!(generation_id = generation.id, "Generation task stopped");
                Ok(())
            }
        }
    }

    /// Cancel a generation that has not finished.
    ///
    /// Stops its task, asks the API to drop the queued request and marks
    /// the record failed with [`CANCELLED_MESSAGE`].
    pub async fn cancel(&self, id: DbId) -> Result<Generation, PipelineError> {
        let generation = GenerationRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Generation",
                id,
            })?;

        let status = GenerationStatus::parse(&generation.status)?;
        if status.is_terminal() {
            return Err(CoreError::Conflict(format!("Generation {id} is already {status}")).into());
        }

        let stopped = self.registry.cancel(id);
        if let Some(request_id) = &generation.request_id {
            self.cancel_remote(&generation.model, request_id).await;
        }

        let updated = GenerationRepo::mark_failed(&self.pool, id, CANCELLED_MESSAGE)
            .await?
            .ok_or_else(|| {
                CoreError::Conflict(format!("Generation {id} finished before it could be cancelled"))
            })?;

        tracing::info!(generation_id = id, task_stopped = stopped, "Generation cancelled");
        self.publish(
            GENERATION_FAILED,
            &updated,
            json!({ "error": CANCELLED_MESSAGE, "cancelled": true }),
        );
        Ok(updated)
    }

    /// Pick up records left unfinished by a previous process.
    ///
    /// `processing` records with a request id resume polling. A
    /// `processing` record without one was a synchronous run and is marked
    /// failed with [`INTERRUPTED_RUN_MESSAGE`]; `pending` records never
    /// reached the API and get [`INTERRUPTED_MESSAGE`].
    pub async fn resume_in_flight(self: &Arc<Self>) -> Result<ResumeSummary, PipelineError> {
        let mut summary = ResumeSummary::default();

        for generation in GenerationRepo::list_in_flight(&self.pool).await? {
            let status = GenerationStatus::parse(&generation.status)?;
            match (status, generation.request_id.is_some()) {
                (GenerationStatus::Processing, true) => {
                    if self.start(generation) {
                        summary.resumed += 1;
                    }
                }
                (GenerationStatus::Processing, false) => {
                    self.fail(generation.id, INTERRUPTED_RUN_MESSAGE).await;
                    summary.interrupted += 1;
                }
                _ => {
                    self.fail(generation.id, INTERRUPTED_MESSAGE).await;
                    summary.interrupted += 1;
                }
            }
        }

        tracing::info!(
            resumed = summary.resumed,
            interrupted = summary.interrupted,
            "Resumed in-flight generations",
        );
        Ok(summary)
    }

    /// Stop every running task and wait briefly for them to exit.
    ///
    /// Interrupted `processing` records keep their request id and are
    /// resumed on the next start.
    pub async fn shutdown(&self) {
        self.registry.shutdown();
        self.tasks.close();
        if tokio::time::timeout(SHUTDOWN_GRACE, self.tasks.wait())
            .await
            .is_err()
        {
            tracing::warn!("Generation tasks did not exit within the grace period");
        }
    }

    // ---- private helpers ----

    async fn submit_and_wait(
        &self,
        generation: &Generation,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, PipelineError> {
        if let (GenerationStatus::Processing, Some(request_id)) = (
            GenerationStatus::parse(&generation.status)?,
            &generation.request_id,
        ) {
            tracing::info!(generation_id = generation.id, %request_id, "Resuming polling");
            return Ok(self.poll(generation, request_id, cancel).await);
        }

        let kind = GenerationKind::parse(&generation.kind)?;
        let input = build_input(
            &generation.prompt,
            generation.image_url.as_deref(),
            Some(&generation.parameters),
        )?;

        match kind.default_submit_mode() {
            SubmitMode::Sync => {
                let Some(updated) = GenerationRepo::mark_running(&self.pool, generation.id).await?
                else {
                    // Cancelled or deleted before the run started.
                    return Ok(PollOutcome::Cancelled);
                };
                tracing::debug!(generation_id = generation.id, "Running synchronously");
                self.publish(GENERATION_PROCESSING, &updated, json!({}));
                tokio::select! {
                    _ = cancel.cancelled() => Ok(PollOutcome::Cancelled),
                    result = self.backend.run(&generation.model, &input) => {
                        Ok(PollOutcome::Completed(result?))
                    }
                }
            }
            SubmitMode::Queued => {
                let submission = self.backend.submit(&generation.model, &input).await?;
                let request_id = submission.request_id;

                let Some(updated) =
                    GenerationRepo::mark_processing(&self.pool, generation.id, &request_id).await?
                else {
                    // Cancelled or deleted while the submission was in flight.
                    self.cancel_remote(&generation.model, &request_id).await;
                    return Ok(PollOutcome::Cancelled);
                };

                tracing::info!(
                    generation_id = generation.id,
                    %request_id,
                    queue_position = ?submission.queue_position,
                    "Generation queued",
                );
                self.publish(
                    GENERATION_PROCESSING,
                    &updated,
                    json!({ "request_id": request_id }),
                );
                Ok(self.poll(generation, &request_id, cancel).await)
            }
        }
    }

    async fn poll(
        &self,
        generation: &Generation,
        request_id: &str,
        cancel: &CancellationToken,
    ) -> PollOutcome {
        poll_until_terminal(
            self.backend.as_ref(),
            &generation.model,
            request_id,
            self.settings.poll_interval,
            self.settings.poll_timeout,
            cancel,
        )
        .await
    }

    /// Store every output file, then record them and mark the record
    /// completed together.
    ///
    /// Files from an earlier interrupted attempt are discarded first. If
    /// storing fails, `cancel` fires or the record is no longer in flight,
    /// the files written by this attempt are removed again.
    async fn complete(
        &self,
        generation: &Generation,
        result: serde_json::Value,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        let outputs = extract_output_files(&result);
        if outputs.is_empty() {
            return Err(PipelineError::MissingOutput);
        }

        self.discard_outputs(generation.id).await?;

        let mut stored: Vec<CreateGenerationFile> = Vec::with_capacity(outputs.len());
        for (index, output) in outputs.iter().enumerate() {
            if cancel.is_cancelled() {
                self.remove_stored(&stored).await;
                tracing::info!(
                    generation_id = generation.id,
                    stored = stored.len(),
                    "Generation task stopped while storing outputs",
                );
                return Ok(());
            }
            match self.store_output(generation.id, index, output).await {
                Ok(file) => stored.push(file),
                Err(e) => {
                    self.remove_stored(&stored).await;
                    return Err(e);
                }
            }
        }

        if cancel.is_cancelled() {
            self.remove_stored(&stored).await;
            tracing::info!(generation_id = generation.id, "Generation task stopped before completion");
            return Ok(());
        }

        match GenerationRepo::complete_with_files(&self.pool, generation.id, &result, &stored).await
        {
            Ok(Some((updated, files))) => {
                let file_ids: Vec<DbId> = files.iter().map(|f| f.id).collect();
                tracing::info!(
                    generation_id = generation.id,
                    files = file_ids.len(),
                    "Generation completed",
                );
                self.publish(GENERATION_COMPLETED, &updated, json!({ "file_ids": file_ids }));
                Ok(())
            }
            Ok(None) => {
                self.remove_stored(&stored).await;
                tracing::warn!(
                    generation_id = generation.id,
                    "Generation finished after it was already cancelled or removed",
                );
                Ok(())
            }
            Err(e) => {
                self.remove_stored(&stored).await;
                Err(e.into())
            }
        }
    }

    /// Download one output and write it to storage. Returns the row to
    /// insert once every output is stored.
    async fn store_output(
        &self,
        generation_id: DbId,
        index: usize,
        output: &OutputFile,
    ) -> Result<CreateGenerationFile, PipelineError> {
        let downloaded = self.backend.download(&output.url).await?;

        let content_type = output
            .content_type
            .clone()
            .or(downloaded.content_type)
            .or_else(|| content_type_from_path(&output.url).map(String::from))
            .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());

        let key = generation_file_key(
            generation_id,
            index,
            extension_for_content_type(&content_type),
        );
        self.storage.put(&key, &downloaded.bytes).await?;

        let (width, height) = match (output.width, output.height) {
            (Some(w), Some(h)) => (Some(w), Some(h)),
            _ => image_dimensions(&downloaded.bytes).unzip(),
        };

        tracing::debug!(generation_id, storage_key = %key, "Stored generation output");
        Ok(CreateGenerationFile {
            generation_id,
            position: index as i32,
            source_url: output.url.clone(),
            storage_key: key,
            content_type,
            size_bytes: downloaded.bytes.len() as i64,
            width,
            height,
            sha256: fingerprint(&downloaded.bytes),
        })
    }

    /// Drop file rows and stored files left by an earlier attempt.
    async fn discard_outputs(&self, generation_id: DbId) -> Result<(), PipelineError> {
        let stale = GenerationFileRepo::delete_by_generation(&self.pool, generation_id).await?;
        for file in &stale {
            self.remove_file(&file.storage_key).await;
        }
        self.storage.delete_dir(&generation_dir_key(generation_id)).await?;
        if !stale.is_empty() {
            tracing::info!(generation_id, files = stale.len(), "Discarded earlier outputs");
        }
        Ok(())
    }

    async fn remove_stored(&self, stored: &[CreateGenerationFile]) {
        for file in stored {
            self.remove_file(&file.storage_key).await;
        }
    }

    async fn remove_file(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            tracing::warn!(storage_key = %key, error = %e, "Failed to remove generation output");
        }
    }

    /// Mark a record failed and publish the change. Errors are logged; a
    /// record that is already terminal is left alone.
    async fn fail(&self, id: DbId, message: &str) {
        match GenerationRepo::mark_failed(&self.pool, id, message).await {
            Ok(Some(updated)) => {
                self.publish(GENERATION_FAILED, &updated, json!({ "error": message }));
            }
            Ok(None) => {
                tracing::debug!(generation_id = id, "Generation already terminal, not failing");
            }
            Err(e) => {
                tracing::error!(generation_id = id, error = %e, "Failed to mark generation failed");
            }
        }
    }

    /// Best-effort remote cancellation.
    async fn cancel_remote(&self, model: &str, request_id: &str) {
        if let Err(e) = self.backend.cancel(model, request_id).await {
            tracing::warn!(%request_id, error = %e, "Remote cancellation failed");
        }
    }

    fn publish(&self, event_type: &str, generation: &Generation, extra: serde_json::Value) {
        let mut payload = json!({
            "status": generation.status,
            "kind": generation.kind,
            "model": generation.model,
        });
        if let (Some(base), serde_json::Value::Object(extra)) = (payload.as_object_mut(), extra) {
            base.extend(extra);
        }
        self.events.publish(
            SignageEvent::new(event_type)
                .with_source(ENTITY_GENERATION, generation.id)
                .with_actor(generation.created_by)
                .with_payload(payload),
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
