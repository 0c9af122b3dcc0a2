//! Query-string parameters accepted by more than one list endpoint.

use serde::Deserialize;

/// `?limit=&offset=`. Missing or out-of-range values are clamped by the
/// repository.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `?include_inactive=true` shows rows an operator switched off; they are
/// hidden by default.
#[derive(Debug, Default, Deserialize)]
pub struct ActiveFilter {
    #[serde(default)]
    pub include_inactive: bool,
}
