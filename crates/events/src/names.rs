//! Event type names published on the bus.

pub const GENERATION_CREATED: &str = "generation.created";
pub const GENERATION_PROCESSING: &str = "generation.processing";
pub const GENERATION_COMPLETED: &str = "generation.completed";
pub const GENERATION_FAILED: &str = "generation.failed";

pub const SCREEN_UPDATED: &str = "screen.updated";
pub const SCREEN_DELETED: &str = "screen.deleted";

pub const STATIC_ASSET_CREATED: &str = "static_asset.created";
pub const STATIC_ASSET_DELETED: &str = "static_asset.deleted";

/// Source entity kinds used with [`SignageEvent::with_source`](crate::SignageEvent::with_source).
pub const ENTITY_GENERATION: &str = "generation";
pub const ENTITY_SCREEN: &str = "screen";
pub const ENTITY_STATIC_ASSET: &str = "static_asset";
