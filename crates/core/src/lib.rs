//! Domain types and pure rules for the signage backend.
//!
//! Nothing in this crate touches the network or the database; the
//! repositories, the fal client and the HTTP layer all build on it.

pub mod error;
pub mod generation;
pub mod pagination;
pub mod product;
pub mod screen;
pub mod storage;

/// Row id of every table (`BIGSERIAL`); user ids share the type.
pub type DbId = i64;

/// Stored timestamps are `TIMESTAMPTZ`, read back in UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
