//! Storage traits for the collection.
//!
//! `CollectionStore` is what the server and the import/export engine hold on
//! to. Writes that must be atomic go through `write_transaction`, which hands
//! a `CollectionWriter` scoped to a single transaction to the caller's work.

use super::models::*;
use anyhow::Result;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The transaction could not be started; nothing was written.
    #[error("Datastore unavailable: {0}")]
    Unavailable(#[source] rusqlite::Error),

    /// The work or its commit failed; the transaction was rolled back.
    #[error("{0:#}")]
    Write(anyhow::Error),
}

/// Write primitives available inside one transaction.
pub trait CollectionWriter {
    /// Oldest physical item with exactly this name.
    fn find_physical_item_id_by_name(&self, name: &str) -> Result<Option<i64>>;

    fn create_physical_item(&self, item: &NewPhysicalItem) -> Result<i64>;

    fn format_set(&self, physical_item_id: i64) -> Result<Vec<Format>>;

    /// Replaces the stored format set. `formats` must already be normalized.
    fn set_format_set(&self, physical_item_id: i64, formats: &[Format]) -> Result<()>;

    /// Rebuilds the format set from the item's links and returns it.
    fn recompute_format_set(&self, physical_item_id: i64) -> Result<Vec<Format>>;

    fn find_media_id_by_external_id(&self, external_id: i64) -> Result<Option<i64>>;

    fn create_media(&self, media: &NewMedia) -> Result<i64>;

    fn create_link(&self, link: &NewLink) -> Result<i64>;

    /// Deletes a link, returning the physical item it belonged to.
    fn delete_link(&self, link_id: i64) -> Result<Option<i64>>;

    /// Deletes every physical item and, through cascades, every link.
    /// Media rows are kept.
    fn delete_all_physical_items(&self) -> Result<usize>;
}

pub trait CollectionStore: Send + Sync {
    /// Runs `work` inside a single transaction, committing if it returns `Ok`
    /// and rolling back otherwise.
    fn write_transaction(
        &self,
        work: &mut dyn FnMut(&dyn CollectionWriter) -> Result<()>,
    ) -> std::result::Result<(), StoreError>;

    // =========================================================================
    // Reads
    // =========================================================================

    fn get_physical_item(&self, id: i64) -> Result<Option<PhysicalItem>>;

    fn find_physical_item_by_name(&self, name: &str) -> Result<Option<PhysicalItem>>;

    /// Newest first.
    fn list_physical_items(&self) -> Result<Vec<PhysicalItem>>;

    /// Items whose format set contains `format`.
    fn physical_items_with_format(&self, format: Format) -> Result<Vec<PhysicalItem>>;

    fn get_media(&self, id: i64) -> Result<Option<Media>>;

    fn find_media_by_external_id(&self, external_id: i64) -> Result<Vec<Media>>;

    fn links_for_physical_item(&self, physical_item_id: i64) -> Result<Vec<Link>>;

    fn counts(&self) -> Result<CollectionCounts>;

    /// Every link joined with both of its ends, newest item first and then
    /// by disc number.
    fn export_rows(&self) -> Result<Vec<ExportRow>>;

    // =========================================================================
    // Manual edits (each keeps the owning item's format set in sync)
    // =========================================================================

    fn add_link(&self, link: &NewLink) -> Result<i64>;

    fn remove_link(&self, link_id: i64) -> Result<bool>;

    /// Deletes the item and its links. Media rows are kept.
    fn delete_physical_item(&self, id: i64) -> Result<bool>;
}
