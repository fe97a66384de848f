//! Collection to CSV.

use super::csv_codec::write_csv;
use crate::collection_store::{ExportRow, LooseList};
use anyhow::Result;
use serde::Serialize;

pub const EXPORT_COLUMNS: [&str; 17] = [
    "id",
    "physical_item_name",
    "title",
    "formats",
    "external_id",
    "synopsis",
    "cover_art_url",
    "release_date",
    "director",
    "cast",
    "disc_number",
    "edition_notes",
    "purchase_date",
    "store_links",
    "custom_image_url",
    "created_at",
    "updated_at",
];

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn list<T: Serialize>(value: &Option<LooseList<T>>) -> String {
    value.as_ref().map(LooseList::to_cell).unwrap_or_default()
}

/// Cells of one export row, in `EXPORT_COLUMNS` order.
pub fn export_row_cells(row: &ExportRow) -> Vec<String> {
    let item = &row.physical_item;
    let media = &row.media;
    let formats: Vec<&str> = row.formats.iter().map(|f| f.as_str()).collect();

    vec![
        item.id.to_string(),
        item.name.clone(),
        media.title.clone(),
        serde_json::to_string(&formats).unwrap_or_default(),
        media.external_id.map(|id| id.to_string()).unwrap_or_default(),
        text(&media.synopsis),
        text(&media.cover_art_url),
        text(&media.release_date),
        text(&media.director),
        list(&media.cast),
        row.disc_number.to_string(),
        text(&item.edition_notes),
        text(&item.purchase_date),
        list(&item.store_links),
        text(&item.custom_image_url),
        item.created_at.to_string(),
        item.updated_at.to_string(),
    ]
}

/// Header plus one CSV row per export row. No rows yields just the header.
pub fn rows_to_csv(rows: &[ExportRow]) -> Result<String> {
    write_csv(EXPORT_COLUMNS, rows.iter().map(export_row_cells))
}
