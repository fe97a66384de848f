//! CSV import and export of the collection.
//!
//! `ImportExportService` is the entry point: it parses with `csv_codec`,
//! checks rows with `validation`, writes them through `reconcile` and
//! serializes the collection back with `export`.

pub mod csv_codec;
mod error;
pub mod export;
mod models;
pub mod reconcile;
mod schema_doc;
mod service;
pub mod validation;

pub use error::{CsvParseError, ImportError};
pub use models::*;
pub use schema_doc::schema_document;
pub use service::ImportExportService;
