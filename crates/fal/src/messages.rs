//! fal.ai queue and result payloads.
//!
//! Queue endpoints answer with small JSON documents (`request_id`,
//! `status`, ...). Result documents are model specific; the only part the
//! backend relies on is the set of generated files, which models expose
//! under `images`, `image`, `video` or `videos`.

use serde::{Deserialize, Serialize};

/// Response of `POST {queue}/{model}` after a request was queued.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueSubmission {
    /// Server-assigned identifier used for status, result and cancel calls.
    pub request_id: String,
    pub status_url: Option<String>,
    pub response_url: Option<String>,
    pub cancel_url: Option<String>,
    pub queue_position: Option<i64>,
}

/// Lifecycle state reported by the queue status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueState {
    InQueue,
    InProgress,
    Completed,
}

/// Response of `GET {queue}/{app}/requests/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueStatus {
    pub status: QueueState,
    pub queue_position: Option<i64>,
    pub response_url: Option<String>,
    /// Set by some apps when a request finished unsuccessfully.
    pub error: Option<String>,
    #[serde(default)]
    pub logs: Option<Vec<serde_json::Value>>,
}

impl QueueStatus {
    pub fn is_completed(&self) -> bool {
        self.status == QueueState::Completed
    }
}

/// A generated file referenced by a result document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFile {
    pub url: String,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

/// Result keys holding a single file object.
const SINGLE_FILE_KEYS: &[&str] = &["image", "video"];

/// Result keys holding an array of file objects.
const FILE_LIST_KEYS: &[&str] = &["images", "videos"];

/// Collect every generated file referenced by a result document, in
/// document order (`images`, `videos`, then `image`, `video`).
///
/// Entries without a `url` are skipped. Returns an empty list when the
/// result carries no files.
pub fn extract_output_files(result: &serde_json::Value) -> Vec<OutputFile> {
    let mut files = Vec::new();

    for key in FILE_LIST_KEYS {
        if let Some(items) = result.get(*key).and_then(|v| v.as_array()) {
            files.extend(items.iter().filter_map(parse_file));
        }
    }
    for key in SINGLE_FILE_KEYS {
        if let Some(file) = result.get(*key).and_then(parse_file) {
            files.push(file);
        }
    }

    files
}

/// Parse one file object, tolerating missing optional fields.
fn parse_file(value: &serde_json::Value) -> Option<OutputFile> {
    let url = value.get("url")?.as_str()?.to_string();
    let int_field = |name: &str| {
        value
            .get(name)
            .and_then(|v| v.as_i64())
            .and_then(|v| i32::try_from(v).ok())
    };
    let str_field = |name: &str| value.get(name).and_then(|v| v.as_str()).map(str::to_string);

    Some(OutputFile {
        url,
        content_type: str_field("content_type"),
        file_name: str_field("file_name"),
        width: int_field("width"),
        height: int_field("height"),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
