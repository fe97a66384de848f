mod models;
mod schema;
mod store;
mod trait_def;

pub use models::*;
pub use schema::COLLECTION_VERSIONED_SCHEMAS;
pub use store::SqliteCollectionStore;
pub use trait_def::{CollectionStore, CollectionWriter, StoreError};
