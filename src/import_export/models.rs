//! Typed rows and result reports of the CSV import/export pipeline.

use crate::collection_store::{Format, LooseList, NewMedia, NewPhysicalItem, StoreLink};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A CSV data row that passed strict validation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportRow {
    pub title: String,
    pub physical_item_name: String,
    pub formats: Vec<Format>,
    pub external_id: Option<i64>,
    pub synopsis: Option<String>,
    pub cover_art_url: Option<String>,
    pub release_date: Option<String>,
    pub director: Option<String>,
    pub cast: Option<LooseList<String>>,
    pub disc_number: Option<i64>,
    pub edition_notes: Option<String>,
    pub purchase_date: Option<String>,
    pub store_links: Option<LooseList<StoreLink>>,
    pub custom_image_url: Option<String>,
}

pub const DEFAULT_DISC_NUMBER: i64 = 1;

impl ImportRow {
    pub fn disc_number(&self) -> i64 {
        self.disc_number.unwrap_or(DEFAULT_DISC_NUMBER)
    }

    pub fn new_media(&self) -> NewMedia {
        NewMedia {
            title: self.title.clone(),
            external_id: self.external_id,
            synopsis: self.synopsis.clone(),
            cover_art_url: self.cover_art_url.clone(),
            release_date: self.release_date.clone(),
            director: self.director.clone(),
            cast: self.cast.clone(),
        }
    }

    pub fn new_physical_item(&self) -> NewPhysicalItem {
        NewPhysicalItem {
            name: self.physical_item_name.clone(),
            edition_notes: self.edition_notes.clone(),
            purchase_date: self.purchase_date.clone(),
            store_links: self.store_links.clone(),
            custom_image_url: self.custom_image_url.clone(),
        }
    }
}

/// An `ImportRow` together with its 1-based position among the data rows.
#[derive(Clone, Debug, PartialEq)]
pub struct NumberedRow {
    pub number: usize,
    pub row: ImportRow,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImportMode {
    /// Append to the existing collection.
    #[default]
    Add,
    /// Wipe every physical item and link first. Media rows are kept.
    Replace,
}

impl FromStr for ImportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(ImportMode::Add),
            "replace" => Ok(ImportMode::Replace),
            other => Err(format!(
                "Invalid mode '{}', expected \"add\" or \"replace\"",
                other
            )),
        }
    }
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportMode::Add => f.write_str("add"),
            ImportMode::Replace => f.write_str("replace"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImportErrorEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub error: String,
    pub data: serde_json::Value,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ImportResult {
    /// Number of data rows in the CSV.
    pub total: usize,
    /// Committed groups.
    pub successful: usize,
    /// Rolled back groups plus rows rejected by validation.
    pub failed: usize,
    pub errors: Vec<ImportErrorEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RowErrorEntry {
    pub row: usize,
    pub error: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RowWarningEntry {
    pub row: usize,
    pub warning: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub total_rows: usize,
    pub warnings: Vec<RowWarningEntry>,
    pub errors: Vec<RowErrorEntry>,
}
