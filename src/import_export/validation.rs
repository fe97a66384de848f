//! Row validation rules, shared by the strict import path and the dry run.

use super::csv_codec::RawRow;
use super::models::ImportRow;
use crate::collection_store::{Format, LooseList, StoreLink};
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::fmt;
use thiserror::Error;

lazy_static! {
    static ref DATE_RE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RowValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("formats must be a JSON array of format names")]
    FormatsNotArray,

    #[error("formats must contain at least one format")]
    EmptyFormats,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Something odd about a row that does not stop it from being imported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowWarning {
    NotAnInteger { field: &'static str, value: String },
    DiscNumberBelowOne(i64),
    NotADate { field: &'static str, value: String },
    NotAJsonArray { field: &'static str },
    UnexpectedListItems { field: &'static str, expected: &'static str },
    DuplicateLink { physical_item_name: String, external_id: i64, first_row: usize },
}

impl fmt::Display for RowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowWarning::NotAnInteger { field, value } => {
                write!(f, "{} '{}' is not an integer and will be ignored", field, value)
            }
            RowWarning::DiscNumberBelowOne(n) => {
                write!(f, "disc_number {} is below 1, disc 1 will be used", n)
            }
            RowWarning::NotADate { field, value } => {
                write!(f, "{} '{}' is not in YYYY-MM-DD format", field, value)
            }
            RowWarning::NotAJsonArray { field } => {
                write!(f, "{} is not a valid JSON array and will be stored as text", field)
            }
            RowWarning::UnexpectedListItems { field, expected } => write!(
                f,
                "{} is a JSON array but its items are not {} and it will be stored as text",
                field, expected
            ),
            RowWarning::DuplicateLink {
                physical_item_name,
                external_id,
                first_row,
            } => write!(
                f,
                "'{}' already links external_id {} on row {}",
                physical_item_name, external_id, first_row
            ),
        }
    }
}

/// Outcome of applying every rule to a row.
#[derive(Debug, PartialEq)]
pub struct RowCheck {
    pub outcome: Result<ImportRow, Vec<RowValidationError>>,
    pub warnings: Vec<RowWarning>,
}

/// Applies every rule and collects all problems.
pub fn check_row(raw: &RawRow) -> RowCheck {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let title = raw.get("title");
    if title.is_none() {
        errors.push(RowValidationError::MissingField("title"));
    }
    let physical_item_name = raw.get("physical_item_name");
    if physical_item_name.is_none() {
        errors.push(RowValidationError::MissingField("physical_item_name"));
    }
    let formats = match raw.get("formats") {
        None => {
            errors.push(RowValidationError::MissingField("formats"));
            Vec::new()
        }
        Some(text) => match parse_formats(text) {
            Ok(formats) => formats,
            Err(mut format_errors) => {
                errors.append(&mut format_errors);
                Vec::new()
            }
        },
    };

    let external_id = optional_integer(raw, "external_id", &mut warnings);
    let disc_number = match optional_integer(raw, "disc_number", &mut warnings) {
        Some(n) if n < 1 => {
            warnings.push(RowWarning::DiscNumberBelowOne(n));
            None
        }
        other => other,
    };
    let release_date = optional_date(raw, "release_date", &mut warnings);
    let purchase_date = optional_date(raw, "purchase_date", &mut warnings);
    let cast = optional_list::<String>(raw, "cast", "strings", &mut warnings);
    let store_links =
        optional_list::<StoreLink>(raw, "store_links", "{label, url} objects", &mut warnings);

    let outcome = match (title, physical_item_name) {
        (Some(title), Some(physical_item_name)) if errors.is_empty() => Ok(ImportRow {
            title: title.to_string(),
            physical_item_name: physical_item_name.to_string(),
            formats,
            external_id,
            synopsis: optional_text(raw, "synopsis"),
            cover_art_url: optional_text(raw, "cover_art_url"),
            release_date,
            director: optional_text(raw, "director"),
            cast,
            disc_number,
            edition_notes: optional_text(raw, "edition_notes"),
            purchase_date,
            store_links,
            custom_image_url: optional_text(raw, "custom_image_url"),
        }),
        _ => Err(errors),
    };

    RowCheck { outcome, warnings }
}

/// Import path: stops at the first problem of the row.
pub fn validate_strict(raw: &RawRow) -> Result<ImportRow, RowValidationError> {
    match check_row(raw).outcome {
        Ok(row) => Ok(row),
        Err(mut errors) => Err(errors.remove(0)),
    }
}

/// Dry-run path: every error and warning of the row.
pub fn validate_dry_run(raw: &RawRow) -> (Vec<RowValidationError>, Vec<RowWarning>) {
    let check = check_row(raw);
    let errors = check.outcome.err().unwrap_or_default();
    (errors, check.warnings)
}

fn parse_formats(text: &str) -> Result<Vec<Format>, Vec<RowValidationError>> {
    let elements = match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Array(elements)) => elements,
        _ => return Err(vec![RowValidationError::FormatsNotArray]),
    };
    if elements.is_empty() {
        return Err(vec![RowValidationError::EmptyFormats]);
    }

    let mut formats = Vec::with_capacity(elements.len());
    let mut errors = Vec::new();
    for element in elements {
        let parsed = element.as_str().and_then(|name| name.parse::<Format>().ok());
        match parsed {
            Some(format) => formats.push(format),
            None => {
                let shown = match element {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                errors.push(RowValidationError::InvalidFormat(shown));
            }
        }
    }

    if errors.is_empty() {
        Ok(formats)
    } else {
        Err(errors)
    }
}

fn optional_text(raw: &RawRow, field: &str) -> Option<String> {
    raw.get(field).map(str::to_string)
}

fn optional_integer(
    raw: &RawRow,
    field: &'static str,
    warnings: &mut Vec<RowWarning>,
) -> Option<i64> {
    let value = raw.get(field)?;
    match value.trim().parse::<i64>() {
        Ok(n) => Some(n),
        Err(_) => {
            warnings.push(RowWarning::NotAnInteger {
                field,
                value: value.to_string(),
            });
            None
        }
    }
}

fn optional_date(
    raw: &RawRow,
    field: &'static str,
    warnings: &mut Vec<RowWarning>,
) -> Option<String> {
    let value = raw.get(field)?;
    if !DATE_RE.is_match(value.trim()) {
        warnings.push(RowWarning::NotADate {
            field,
            value: value.to_string(),
        });
    }
    Some(value.to_string())
}

/// Parses a JSON array cell. Text that is not a JSON array, or an array whose
/// items do not have the expected shape, is kept verbatim with a warning.
fn optional_list<T: DeserializeOwned>(
    raw: &RawRow,
    field: &'static str,
    expected: &'static str,
    warnings: &mut Vec<RowWarning>,
) -> Option<LooseList<T>> {
    let value = raw.get(field)?;
    let elements = match serde_json::from_str::<Vec<serde_json::Value>>(value) {
        Ok(elements) => elements,
        Err(_) => {
            warnings.push(RowWarning::NotAJsonArray { field });
            return Some(LooseList::Raw(value.to_string()));
        }
    };
    let items = elements
        .into_iter()
        .map(serde_json::from_value::<T>)
        .collect::<Result<Vec<T>, _>>();
    match items {
        Ok(items) => Some(LooseList::Items(items)),
        Err(_) => {
            warnings.push(RowWarning::UnexpectedListItems { field, expected });
            Some(LooseList::Raw(value.to_string()))
        }
    }
}
