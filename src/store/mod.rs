//! SQLite-backed persistence for scripts, tags, and groups.

mod catalog_store;

pub use catalog_store::CatalogStore;
