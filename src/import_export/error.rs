use crate::collection_store::StoreError;
use thiserror::Error;

/// The CSV text cannot be processed at all; no row was looked at.
#[derive(Debug, Error)]
pub enum CsvParseError {
    #[error("CSV data is empty")]
    Empty,

    #[error("CSV is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Malformed CSV: {0}")]
    Malformed(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Parse(#[from] CsvParseError),

    /// The datastore failed outside of a single group's transaction. Groups
    /// committed before the failure stay committed.
    #[error("Import aborted after {committed_groups} committed groups: {source}")]
    Fatal {
        committed_groups: usize,
        #[source]
        source: StoreError,
    },
}
