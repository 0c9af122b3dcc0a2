pub mod generations;
pub mod locations;
pub mod products;
pub mod screens;
pub mod static_assets;
pub mod templates;
