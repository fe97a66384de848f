//! Collection entities: owned physical items, the shared media records they
//! contain, and the links between the two.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Physical media format of a disc or tape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    #[serde(rename = "4K UHD")]
    UltraHd4k,
    #[serde(rename = "3D Blu-ray")]
    BluRay3d,
    #[serde(rename = "Blu-ray")]
    BluRay,
    #[serde(rename = "DVD")]
    Dvd,
    #[serde(rename = "LaserDisc")]
    LaserDisc,
    #[serde(rename = "VHS")]
    Vhs,
}

impl Format {
    pub const ALL: [Format; 6] = [
        Format::UltraHd4k,
        Format::BluRay3d,
        Format::BluRay,
        Format::Dvd,
        Format::LaserDisc,
        Format::Vhs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::UltraHd4k => "4K UHD",
            Format::BluRay3d => "3D Blu-ray",
            Format::BluRay => "Blu-ray",
            Format::Dvd => "DVD",
            Format::LaserDisc => "LaserDisc",
            Format::Vhs => "VHS",
        }
    }

    /// Sorted, de-duplicated copy of `formats`.
    pub fn normalized_set<I: IntoIterator<Item = Format>>(formats: I) -> Vec<Format> {
        let mut set: Vec<Format> = formats.into_iter().collect();
        set.sort();
        set.dedup();
        set
    }
}

// Format sets are ordered by label, the same order the labels sort in as text.
impl Ord for Format {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for Format {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormat(pub String);

impl fmt::Display for UnknownFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid format: {}", self.0)
    }
}

impl std::error::Error for UnknownFormat {}

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::ALL
            .iter()
            .find(|f| f.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreLink {
    pub label: String,
    pub url: String,
}

/// A list-valued field that is expected to be a JSON array but is kept
/// verbatim when the source text is not one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LooseList<T> {
    Items(Vec<T>),
    Raw(String),
}

impl<T> LooseList<T> {
    pub fn items(&self) -> &[T] {
        match self {
            LooseList::Items(items) => items,
            LooseList::Raw(_) => &[],
        }
    }

    pub fn raw(&self) -> Option<&str> {
        match self {
            LooseList::Items(_) => None,
            LooseList::Raw(raw) => Some(raw),
        }
    }
}

impl<T: Serialize> LooseList<T> {
    /// Text form as it appears in a CSV cell.
    pub fn to_cell(&self) -> String {
        match self {
            LooseList::Items(items) => serde_json::to_string(items).unwrap_or_default(),
            LooseList::Raw(raw) => raw.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PhysicalItem {
    pub id: i64,
    pub name: String,
    pub format_set: Vec<Format>,
    pub edition_notes: Option<String>,
    pub purchase_date: Option<String>,
    pub store_links: Option<LooseList<StoreLink>>,
    pub custom_image_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Media {
    pub id: i64,
    pub title: String,
    pub external_id: Option<i64>,
    pub synopsis: Option<String>,
    pub cover_art_url: Option<String>,
    pub release_date: Option<String>,
    pub director: Option<String>,
    pub cast: Option<LooseList<String>>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Link {
    pub id: i64,
    pub physical_item_id: i64,
    pub media_id: i64,
    pub disc_number: i64,
    pub formats: Vec<Format>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewPhysicalItem {
    pub name: String,
    pub edition_notes: Option<String>,
    pub purchase_date: Option<String>,
    pub store_links: Option<LooseList<StoreLink>>,
    pub custom_image_url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewMedia {
    pub title: String,
    pub external_id: Option<i64>,
    pub synopsis: Option<String>,
    pub cover_art_url: Option<String>,
    pub release_date: Option<String>,
    pub director: Option<String>,
    pub cast: Option<LooseList<String>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewLink {
    pub physical_item_id: i64,
    pub media_id: i64,
    pub disc_number: i64,
    pub formats: Vec<Format>,
}

/// One (PhysicalItem, Media) link with both ends resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportRow {
    pub physical_item: PhysicalItem,
    pub media: Media,
    pub disc_number: i64,
    pub formats: Vec<Format>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CollectionCounts {
    pub physical_items: usize,
    pub media: usize,
    pub links: usize,
}
