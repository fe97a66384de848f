//! Shelf Catalog Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod collection_store;
pub mod config;
pub mod import_export;
pub mod server;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use collection_store::{CollectionStore, SqliteCollectionStore};
pub use import_export::{ImportExportService, ImportMode};
pub use server::{run_server, RequestsLoggingLevel};
