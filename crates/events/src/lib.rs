//! Signage event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`SignageEvent`]: the canonical domain event envelope.
//! - [`names`]: dot-separated event type constants.
//!
//! The API relays every event to connected WebSocket clients so admin
//! screens can refresh without re-querying.

pub mod bus;
pub mod names;

pub use bus::{EventBus, SignageEvent};
