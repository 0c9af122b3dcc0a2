//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod generation_file_repo;
pub mod generation_repo;
pub mod location_repo;
pub mod product_repo;
pub mod screen_repo;
pub mod static_asset_repo;
pub mod template_repo;

pub use generation_file_repo::GenerationFileRepo;
pub use generation_repo::GenerationRepo;
pub use location_repo::LocationRepo;
pub use product_repo::ProductRepo;
pub use screen_repo::ScreenRepo;
pub use static_asset_repo::StaticAssetRepo;
pub use template_repo::TemplateRepo;
