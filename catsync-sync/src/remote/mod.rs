//! Catalog server access.
//!
//! - [`CatalogClient`] is the engine's view of an external catalog
//! - [`UnityCatalogClient`] implements it over the Unity Catalog REST API
//! - [`MemoryCatalog`] implements it in process

mod client;
mod memory;
mod unity;

pub use client::{CatalogClient, Fetch, UNITY_CATALOG_CONNECTOR};
pub use memory::MemoryCatalog;
pub use unity::{UnityCatalogClient, UnityCatalogConfig};
