//! Generation status machine, kinds, polling constants and request shaping.
//!
//! A generation record moves `pending -> processing -> completed | failed`
//! (synchronous runs may jump straight from `pending` to a terminal
//! state). Terminal states are final.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Polling defaults
// ---------------------------------------------------------------------------

/// Fixed interval between status checks of a queued request.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Shortest poll interval the runner uses; smaller values are raised to it.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Give up on a queued request after this long.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(600);

/// Maximum prompt length accepted by the API.
pub const MAX_PROMPT_LEN: usize = 4000;

/// Error message stored when a generation is cancelled by the user.
pub const CANCELLED_MESSAGE: &str = "Cancelled";

/// Error message stored for pending records found at startup.
pub const INTERRUPTED_MESSAGE: &str = "Interrupted before submission";

/// Error message stored for synchronous runs found `processing` at startup.
pub const INTERRUPTED_RUN_MESSAGE: &str = "Interrupted during a synchronous run";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_PROCESSING: &str = "processing";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_FAILED: &str = "failed";

pub const VALID_STATUSES: &[&str] = &[
    STATUS_PENDING,
    STATUS_PROCESSING,
    STATUS_COMPLETED,
    STATUS_FAILED,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl GenerationStatus {
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            STATUS_PENDING => Ok(Self::Pending),
            STATUS_PROCESSING => Ok(Self::Processing),
            STATUS_COMPLETED => Ok(Self::Completed),
            STATUS_FAILED => Ok(Self::Failed),
            other => Err(CoreError::Validation(format!(
                "Invalid generation status '{other}'. Must be one of: {}",
                VALID_STATUSES.join(", ")
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => STATUS_PENDING,
            Self::Processing => STATUS_PROCESSING,
            Self::Completed => STATUS_COMPLETED,
            Self::Failed => STATUS_FAILED,
        }
    }

    /// Completed and failed records never change status again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn can_transition_to(self, next: GenerationStatus) -> bool {
        match self {
            Self::Pending => matches!(next, Self::Processing | Self::Completed | Self::Failed),
            Self::Processing => matches!(next, Self::Completed | Self::Failed),
            Self::Completed | Self::Failed => false,
        }
    }
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Kind / submit mode
// ---------------------------------------------------------------------------

pub const KIND_IMAGE: &str = "image";
pub const KIND_VIDEO: &str = "video";

pub const VALID_KINDS: &[&str] = &[KIND_IMAGE, KIND_VIDEO];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    Image,
    Video,
}

/// How a request is handed to the generation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// Blocking call that returns the result in the response.
    Sync,
    /// Queue submission followed by status polling.
    Queued,
}

impl GenerationKind {
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            KIND_IMAGE => Ok(Self::Image),
            KIND_VIDEO => Ok(Self::Video),
            other => Err(CoreError::Validation(format!(
                "Invalid generation kind '{other}'. Must be one of: {}",
                VALID_KINDS.join(", ")
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => KIND_IMAGE,
            Self::Video => KIND_VIDEO,
        }
    }

    /// Images come back fast enough for a blocking call; videos are queued.
    pub fn default_submit_mode(self) -> SubmitMode {
        match self {
            Self::Image => SubmitMode::Sync,
            Self::Video => SubmitMode::Queued,
        }
    }
}

impl std::fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Validate a prompt: non-blank and at most [`MAX_PROMPT_LEN`] characters.
pub fn validate_prompt(prompt: &str) -> Result<(), CoreError> {
    if prompt.trim().is_empty() {
        return Err(CoreError::Validation("Prompt must not be empty".into()));
    }
    if prompt.chars().count() > MAX_PROMPT_LEN {
        return Err(CoreError::Validation(format!(
            "Prompt must be at most {MAX_PROMPT_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a model identifier such as `fal-ai/flux/dev`.
///
/// Must contain at least an owner and a name segment, no whitespace and
/// no empty segments.
pub fn validate_model_id(model: &str) -> Result<(), CoreError> {
    if model.is_empty() || model.chars().any(char::is_whitespace) {
        return Err(CoreError::Validation(format!(
            "Invalid model id '{model}'"
        )));
    }
    let segments: Vec<&str> = model.split('/').collect();
    if segments.len() < 2 || segments.iter().any(|s| s.is_empty()) {
        return Err(CoreError::Validation(format!(
            "Model id '{model}' must look like 'owner/model[/variant]'"
        )));
    }
    Ok(())
}

/// The application id of a model: its first two path segments.
///
/// Queue status and result URLs are addressed by application, so
/// `fal-ai/flux/dev` polls under `fal-ai/flux`.
pub fn app_id(model: &str) -> &str {
    match model.match_indices('/').nth(1) {
        Some((idx, _)) => &model[..idx],
        None => model,
    }
}

/// Build the request body sent to the generation API.
///
/// Starts from the free-form `parameters` object and sets `prompt` (and
/// `image_url`, when given) on top of it.
pub fn build_input(
    prompt: &str,
    image_url: Option<&str>,
    parameters: Option<&serde_json::Value>,
) -> Result<serde_json::Value, CoreError> {
    let mut body = match parameters {
        None | Some(serde_json::Value::Null) => serde_json::Map::new(),
        Some(serde_json::Value::Object(map)) => map.clone(),
        Some(_) => {
            return Err(CoreError::Validation(
                "Generation parameters must be a JSON object".into(),
            ))
        }
    };
    body.insert("prompt".into(), serde_json::Value::String(prompt.to_string()));
    if let Some(url) = image_url {
        body.insert("image_url".into(), serde_json::Value::String(url.to_string()));
    }
    Ok(serde_json::Value::Object(body))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // -- Status machine --

    #[test]
    fn pending_can_move_anywhere_forward() {
        let pending = GenerationStatus::Pending;
        assert!(pending.can_transition_to(GenerationStatus::Processing));
        assert!(pending.can_transition_to(GenerationStatus::Completed));
        assert!(pending.can_transition_to(GenerationStatus::Failed));
        assert!(!pending.can_transition_to(GenerationStatus::Pending));
    }

    #[test]
    fn processing_cannot_go_back_to_pending() {
        let processing = GenerationStatus::Processing;
        assert!(!processing.can_transition_to(GenerationStatus::Pending));
        assert!(processing.can_transition_to(GenerationStatus::Completed));
    }

    #[test]
    fn terminal_states_are_final() {
        for status in [GenerationStatus::Completed, GenerationStatus::Failed] {
            assert!(status.is_terminal());
            for next in [
                GenerationStatus::Pending,
                GenerationStatus::Processing,
                GenerationStatus::Completed,
                GenerationStatus::Failed,
            ] {
                assert!(!status.can_transition_to(next));
            }
        }
    }

    #[test]
    fn status_round_trips_through_str() {
        for s in VALID_STATUSES {
            assert_eq!(GenerationStatus::parse(s).unwrap().as_str(), *s);
        }
        assert!(GenerationStatus::parse("queued").is_err());
    }

    // -- Kind --

    #[test]
    fn image_runs_sync_video_is_queued() {
        assert_eq!(GenerationKind::Image.default_submit_mode(), SubmitMode::Sync);
        assert_eq!(GenerationKind::Video.default_submit_mode(), SubmitMode::Queued);
    }

    #[test]
    fn unknown_kind_rejected() {
        assert!(GenerationKind::parse("audio").is_err());
    }

    // -- Validation --

    #[test]
    fn blank_prompt_rejected() {
        assert!(validate_prompt("  \n").is_err());
        assert!(validate_prompt("a bowl of ramen on a neon sign").is_ok());
    }

    #[test]
    fn overlong_prompt_rejected() {
        assert!(validate_prompt(&"a".repeat(MAX_PROMPT_LEN + 1)).is_err());
    }

    #[test]
    fn model_id_needs_owner_and_name() {
        assert!(validate_model_id("fal-ai/flux/dev").is_ok());
        assert!(validate_model_id("fal-ai/kling-video").is_ok());
        assert!(validate_model_id("flux").is_err());
        assert!(validate_model_id("fal-ai//dev").is_err());
        assert!(validate_model_id("fal-ai/flux dev").is_err());
        assert!(validate_model_id("").is_err());
    }

    #[test]
    fn app_id_keeps_first_two_segments() {
        assert_eq!(app_id("fal-ai/flux/dev"), "fal-ai/flux");
        assert_eq!(app_id("fal-ai/kling-video/v1/standard/text-to-video"), "fal-ai/kling-video");
        assert_eq!(app_id("fal-ai/fast-sdxl"), "fal-ai/fast-sdxl");
    }

    // -- Input shaping --

    #[test]
    fn build_input_sets_prompt_over_parameters() {
        let params = json!({"prompt": "old", "num_images": 2});
        let body = build_input("new", None, Some(&params)).unwrap();
        assert_eq!(body["prompt"], "new");
        assert_eq!(body["num_images"], 2);
        assert!(body.get("image_url").is_none());
    }

    #[test]
    fn build_input_adds_image_url() {
        let body = build_input("animate", Some("https://cdn/x.png"), None).unwrap();
        assert_eq!(body["image_url"], "https://cdn/x.png");
    }

    #[test]
    fn build_input_rejects_non_object_parameters() {
        assert!(build_input("p", None, Some(&json!([1, 2]))).is_err());
        assert!(build_input("p", None, Some(&serde_json::Value::Null)).is_ok());
    }
}
