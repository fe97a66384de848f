//! SQLite schema for the collection database.
//!
//! List-valued fields (format sets, link formats, cast, store links) live in
//! their own child tables so that membership queries such as "every item
//! that has a VHS" stay indexed lookups.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

const PHYSICAL_ITEM_FK: ForeignKey = ForeignKey {
    foreign_table: "physical_items",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const MEDIA_FK: ForeignKey = ForeignKey {
    foreign_table: "media",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const LINK_FK: ForeignKey = ForeignKey {
    foreign_table: "links",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

// =============================================================================
// Physical items
// =============================================================================

const PHYSICAL_ITEMS_TABLE: Table = Table {
    name: "physical_items",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("edition_notes", &SqlType::Text),
        sqlite_column!("purchase_date", &SqlType::Text),
        sqlite_column!("custom_image_url", &SqlType::Text),
        sqlite_column!("store_links_raw", &SqlType::Text), // cell text that was not a JSON array
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_physical_items_name", "name")],
};

/// Derived format set of a physical item, one row per member.
const PHYSICAL_ITEM_FORMATS_TABLE: Table = Table {
    name: "physical_item_formats",
    columns: &[
        sqlite_column!(
            "physical_item_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PHYSICAL_ITEM_FK)
        ),
        sqlite_column!("format", &SqlType::Text, non_null = true),
    ],
    indices: &[
        ("idx_physical_item_formats_item", "physical_item_id"),
        ("idx_physical_item_formats_format", "format"),
    ],
};

const PHYSICAL_ITEM_STORE_LINKS_TABLE: Table = Table {
    name: "physical_item_store_links",
    columns: &[
        sqlite_column!(
            "physical_item_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PHYSICAL_ITEM_FK)
        ),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
        sqlite_column!("label", &SqlType::Text, non_null = true),
        sqlite_column!("url", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_physical_item_store_links_item", "physical_item_id")],
};

// =============================================================================
// Media
// =============================================================================

const MEDIA_TABLE: Table = Table {
    name: "media",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("external_id", &SqlType::Integer), // upstream movie database id
        sqlite_column!("synopsis", &SqlType::Text),
        sqlite_column!("cover_art_url", &SqlType::Text),
        sqlite_column!("release_date", &SqlType::Text),
        sqlite_column!("director", &SqlType::Text),
        sqlite_column!("cast_raw", &SqlType::Text), // cell text that was not a JSON array
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_media_external_id", "external_id")],
};

const MEDIA_CAST_TABLE: Table = Table {
    name: "media_cast",
    columns: &[
        sqlite_column!(
            "media_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&MEDIA_FK)
        ),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_media_cast_media", "media_id")],
};

// =============================================================================
// Links
// =============================================================================

const LINKS_TABLE: Table = Table {
    name: "links",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "physical_item_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PHYSICAL_ITEM_FK)
        ),
        sqlite_column!(
            "media_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&MEDIA_FK)
        ),
        sqlite_column!(
            "disc_number",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[
        ("idx_links_physical_item", "physical_item_id"),
        ("idx_links_media", "media_id"),
    ],
};

const LINK_FORMATS_TABLE: Table = Table {
    name: "link_formats",
    columns: &[
        sqlite_column!(
            "link_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&LINK_FK)
        ),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
        sqlite_column!("format", &SqlType::Text, non_null = true),
    ],
    indices: &[
        ("idx_link_formats_link", "link_id"),
        ("idx_link_formats_format", "format"),
    ],
};

pub const COLLECTION_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[
        PHYSICAL_ITEMS_TABLE,
        PHYSICAL_ITEM_FORMATS_TABLE,
        PHYSICAL_ITEM_STORE_LINKS_TABLE,
        MEDIA_TABLE,
        MEDIA_CAST_TABLE,
        LINKS_TABLE,
        LINK_FORMATS_TABLE,
    ],
    migration: None,
}];
