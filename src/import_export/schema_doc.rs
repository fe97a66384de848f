use crate::collection_store::Format;
use serde_json::{json, Value};

/// Static description of the CSV columns, served to clients building files.
pub fn schema_document() -> Value {
    let formats: Vec<&str> = Format::ALL.iter().map(|f| f.as_str()).collect();
    json!({
        "required_columns": {
            "title": "Media title",
            "physical_item_name": "Name of the owned item; rows sharing it form one item",
            "formats": "JSON array of format names, at least one",
        },
        "optional_columns": {
            "external_id": "Integer id from the movie database, used to reuse existing media",
            "synopsis": "Text",
            "cover_art_url": "URL",
            "release_date": "YYYY-MM-DD",
            "director": "Text",
            "cast": "JSON array of names",
            "disc_number": "Integer, 1 when absent",
            "edition_notes": "Text",
            "purchase_date": "YYYY-MM-DD",
            "store_links": "JSON array of {\"label\", \"url\"} objects",
            "custom_image_url": "URL",
        },
        "ignored_columns": ["id", "created_at", "updated_at"],
        "formats": formats,
        "modes": {
            "add": "Append to the existing collection",
            "replace": "Delete every physical item and link first; media are kept",
        },
        "example": "title,physical_item_name,formats,external_id,disc_number\n\"Back to the Future\",\"BTTF Trilogy\",\"[\"\"Blu-ray\"\"]\",105,1\n",
    })
}
