//! SQLite-backed collection store.

use super::models::*;
use super::schema::COLLECTION_VERSIONED_SCHEMAS;
use super::trait_def::{CollectionStore, CollectionWriter, StoreError};
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

const PHYSICAL_ITEM_COLUMNS: &str =
    "id, name, edition_notes, purchase_date, custom_image_url, store_links_raw, created_at, updated_at";

const MEDIA_COLUMNS: &str =
    "id, title, external_id, synopsis, cover_art_url, release_date, director, cast_raw, created_at, updated_at";

/// Raw-column marker for a list that was given as an empty JSON array, so it
/// reads back as present but empty rather than absent.
const EMPTY_LIST_MARKER: &str = "[]";

#[derive(Clone)]
pub struct SqliteCollectionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCollectionStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open collection database at {:?}", path))?;
        Self::from_connection(conn)
    }

    /// Store backed by a private in-memory database.
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Raw SQL against the underlying connection, for installing test fixtures
    /// such as failing triggers.
    #[cfg(test)]
    pub(crate) fn execute_batch_for_test(&self, sql: &str) -> Result<()> {
        self.lock().execute_batch(sql)?;
        Ok(())
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        let table_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )?;

        let latest = COLLECTION_VERSIONED_SCHEMAS
            .last()
            .context("No collection schema defined")?;

        if table_count == 0 {
            info!("Creating collection db schema at version {}", latest.version);
            latest.create(&conn)?;
        } else {
            let raw_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
            let db_version = raw_version - BASE_DB_VERSION as i64;
            let schema = COLLECTION_VERSIONED_SCHEMAS
                .iter()
                .find(|s| s.version as i64 == db_version)
                .with_context(|| format!("Unknown collection database version {}", db_version))?;
            schema.validate(&conn).with_context(|| {
                format!("Collection schema validation failed for version {}", db_version)
            })?;
            Self::migrate_if_needed(&mut conn, schema.version)?;
        }

        let counts = read_counts(&conn)?;
        info!(
            "Opened collection: {} physical items, {} media, {} links",
            counts.physical_items, counts.media, counts.links
        );

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn migrate_if_needed(conn: &mut Connection, from_version: usize) -> Result<()> {
        let pending: Vec<_> = COLLECTION_VERSIONED_SCHEMAS
            .iter()
            .filter(|s| s.version > from_version)
            .collect();
        if pending.is_empty() {
            return Ok(());
        }

        let tx = conn.transaction()?;
        let mut current = from_version;
        for schema in pending {
            if let Some(migration) = schema.migration {
                info!(
                    "Migrating collection db from version {} to {}",
                    current, schema.version
                );
                migration(&tx)?;
            }
            current = schema.version;
        }
        tx.pragma_update(None, "user_version", BASE_DB_VERSION + current)?;
        tx.commit()?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// =============================================================================
// Row helpers shared by reads and the transactional writer
// =============================================================================

fn parse_formats(values: Vec<String>) -> Result<Vec<Format>> {
    values
        .iter()
        .map(|v| v.parse::<Format>().map_err(anyhow::Error::from))
        .collect()
}

fn read_format_set(conn: &Connection, physical_item_id: i64) -> Result<Vec<Format>> {
    let mut stmt = conn.prepare_cached(
        "SELECT format FROM physical_item_formats WHERE physical_item_id = ?1",
    )?;
    let values = stmt
        .query_map(params![physical_item_id], |r| r.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(Format::normalized_set(parse_formats(values)?))
}

fn read_link_formats(conn: &Connection, link_id: i64) -> Result<Vec<Format>> {
    let mut stmt = conn
        .prepare_cached("SELECT format FROM link_formats WHERE link_id = ?1 ORDER BY position")?;
    let values = stmt
        .query_map(params![link_id], |r| r.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    parse_formats(values)
}

/// Text for the `*_raw` column of a loose list. Parsed members live in the
/// child table instead.
fn raw_list_column<T>(list: Option<&LooseList<T>>) -> Option<&str> {
    match list? {
        LooseList::Raw(raw) => Some(raw.as_str()),
        LooseList::Items(items) if items.is_empty() => Some(EMPTY_LIST_MARKER),
        LooseList::Items(_) => None,
    }
}

fn stored_raw_list<T>(raw: String) -> LooseList<T> {
    if raw == EMPTY_LIST_MARKER {
        LooseList::Items(Vec::new())
    } else {
        LooseList::Raw(raw)
    }
}

fn read_store_links(
    conn: &Connection,
    physical_item_id: i64,
    raw: Option<String>,
) -> Result<Option<LooseList<StoreLink>>> {
    if let Some(raw) = raw {
        return Ok(Some(stored_raw_list(raw)));
    }
    let mut stmt = conn.prepare_cached(
        "SELECT label, url FROM physical_item_store_links WHERE physical_item_id = ?1 ORDER BY position",
    )?;
    let links = stmt
        .query_map(params![physical_item_id], |r| {
            Ok(StoreLink {
                label: r.get(0)?,
                url: r.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(if links.is_empty() {
        None
    } else {
        Some(LooseList::Items(links))
    })
}

fn read_cast(conn: &Connection, media_id: i64, raw: Option<String>) -> Result<Option<LooseList<String>>> {
    if let Some(raw) = raw {
        return Ok(Some(stored_raw_list(raw)));
    }
    let mut stmt =
        conn.prepare_cached("SELECT name FROM media_cast WHERE media_id = ?1 ORDER BY position")?;
    let names = stmt
        .query_map(params![media_id], |r| r.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(if names.is_empty() {
        None
    } else {
        Some(LooseList::Items(names))
    })
}

/// Base physical item columns plus the raw store links text, before the child
/// tables are read.
fn parse_physical_item_row(row: &rusqlite::Row) -> rusqlite::Result<(PhysicalItem, Option<String>)> {
    Ok((
        PhysicalItem {
            id: row.get(0)?,
            name: row.get(1)?,
            format_set: Vec::new(),
            edition_notes: row.get(2)?,
            purchase_date: row.get(3)?,
            store_links: None,
            custom_image_url: row.get(4)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        },
        row.get(5)?,
    ))
}

fn hydrate_physical_item(
    conn: &Connection,
    (mut item, store_links_raw): (PhysicalItem, Option<String>),
) -> Result<PhysicalItem> {
    item.format_set = read_format_set(conn, item.id)?;
    item.store_links = read_store_links(conn, item.id, store_links_raw)?;
    Ok(item)
}

fn query_physical_items(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<PhysicalItem>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, parse_physical_item_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter()
        .map(|row| hydrate_physical_item(conn, row))
        .collect()
}

fn parse_media_row(row: &rusqlite::Row) -> rusqlite::Result<(Media, Option<String>)> {
    Ok((
        Media {
            id: row.get(0)?,
            title: row.get(1)?,
            external_id: row.get(2)?,
            synopsis: row.get(3)?,
            cover_art_url: row.get(4)?,
            release_date: row.get(5)?,
            director: row.get(6)?,
            cast: None,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        },
        row.get(7)?,
    ))
}

fn query_media(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Media>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, parse_media_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter()
        .map(|(mut media, cast_raw)| {
            media.cast = read_cast(conn, media.id, cast_raw)?;
            Ok(media)
        })
        .collect()
}

fn read_counts(conn: &Connection) -> Result<CollectionCounts> {
    let count = |table: &str| -> Result<usize> {
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
        Ok(n as usize)
    };
    Ok(CollectionCounts {
        physical_items: count("physical_items")?,
        media: count("media")?,
        links: count("links")?,
    })
}

// =============================================================================
// Transactional writer
// =============================================================================

struct SqliteCollectionWriter<'a> {
    conn: &'a Connection,
}

impl CollectionWriter for SqliteCollectionWriter<'_> {
    fn find_physical_item_id_by_name(&self, name: &str) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM physical_items WHERE name = ?1 ORDER BY id LIMIT 1",
                params![name],
                |r| r.get(0),
            )
            .optional()?)
    }

    fn create_physical_item(&self, item: &NewPhysicalItem) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO physical_items (name, edition_notes, purchase_date, custom_image_url, store_links_raw)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &item.name,
                &item.edition_notes,
                &item.purchase_date,
                &item.custom_image_url,
                raw_list_column(item.store_links.as_ref()),
            ],
        )?;
        let id = self.conn.last_insert_rowid();

        if let Some(LooseList::Items(links)) = &item.store_links {
            for (position, link) in links.iter().enumerate() {
                self.conn.execute(
                    "INSERT INTO physical_item_store_links (physical_item_id, position, label, url)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![id, position as i64, &link.label, &link.url],
                )?;
            }
        }
        Ok(id)
    }

    fn format_set(&self, physical_item_id: i64) -> Result<Vec<Format>> {
        read_format_set(self.conn, physical_item_id)
    }

    fn set_format_set(&self, physical_item_id: i64, formats: &[Format]) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE physical_items SET updated_at = cast(strftime('%s','now') as int) WHERE id = ?1",
            params![physical_item_id],
        )?;
        if updated == 0 {
            bail!("Physical item {} not found", physical_item_id);
        }
        self.conn.execute(
            "DELETE FROM physical_item_formats WHERE physical_item_id = ?1",
            params![physical_item_id],
        )?;
        for format in formats {
            self.conn.execute(
                "INSERT INTO physical_item_formats (physical_item_id, format) VALUES (?1, ?2)",
                params![physical_item_id, format.as_str()],
            )?;
        }
        Ok(())
    }

    fn recompute_format_set(&self, physical_item_id: i64) -> Result<Vec<Format>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT DISTINCT lf.format FROM link_formats lf
             JOIN links l ON l.id = lf.link_id
             WHERE l.physical_item_id = ?1",
        )?;
        let values = stmt
            .query_map(params![physical_item_id], |r| r.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        let format_set = Format::normalized_set(parse_formats(values)?);
        self.set_format_set(physical_item_id, &format_set)?;
        Ok(format_set)
    }

    fn find_media_id_by_external_id(&self, external_id: i64) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM media WHERE external_id = ?1 ORDER BY id LIMIT 1",
                params![external_id],
                |r| r.get(0),
            )
            .optional()?)
    }

    fn create_media(&self, media: &NewMedia) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO media (title, external_id, synopsis, cover_art_url, release_date, director, cast_raw)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &media.title,
                media.external_id,
                &media.synopsis,
                &media.cover_art_url,
                &media.release_date,
                &media.director,
                raw_list_column(media.cast.as_ref()),
            ],
        )?;
        let id = self.conn.last_insert_rowid();

        if let Some(LooseList::Items(names)) = &media.cast {
            for (position, name) in names.iter().enumerate() {
                self.conn.execute(
                    "INSERT INTO media_cast (media_id, position, name) VALUES (?1, ?2, ?3)",
                    params![id, position as i64, name],
                )?;
            }
        }
        Ok(id)
    }

    fn create_link(&self, link: &NewLink) -> Result<i64> {
        if link.formats.is_empty() {
            bail!(
                "Link between physical item {} and media {} has no formats",
                link.physical_item_id,
                link.media_id
            );
        }
        self.conn.execute(
            "INSERT INTO links (physical_item_id, media_id, disc_number) VALUES (?1, ?2, ?3)",
            params![link.physical_item_id, link.media_id, link.disc_number],
        )?;
        let id = self.conn.last_insert_rowid();
        for (position, format) in link.formats.iter().enumerate() {
            self.conn.execute(
                "INSERT INTO link_formats (link_id, position, format) VALUES (?1, ?2, ?3)",
                params![id, position as i64, format.as_str()],
            )?;
        }
        Ok(id)
    }

    fn delete_link(&self, link_id: i64) -> Result<Option<i64>> {
        let physical_item_id: Option<i64> = self
            .conn
            .query_row(
                "SELECT physical_item_id FROM links WHERE id = ?1",
                params![link_id],
                |r| r.get(0),
            )
            .optional()?;
        if physical_item_id.is_some() {
            self.conn
                .execute("DELETE FROM links WHERE id = ?1", params![link_id])?;
        }
        Ok(physical_item_id)
    }

    fn delete_all_physical_items(&self) -> Result<usize> {
        self.conn.execute("DELETE FROM links", [])?;
        Ok(self.conn.execute("DELETE FROM physical_items", [])?)
    }
}

// =============================================================================
// CollectionStore
// =============================================================================

impl CollectionStore for SqliteCollectionStore {
    fn write_transaction(
        &self,
        work: &mut dyn FnMut(&dyn CollectionWriter) -> Result<()>,
    ) -> std::result::Result<(), StoreError> {
        let conn = self.lock();
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(StoreError::Unavailable)?;

        let writer = SqliteCollectionWriter { conn: &conn };
        match work(&writer) {
            Ok(()) => match conn.execute_batch("COMMIT") {
                Ok(()) => Ok(()),
                Err(e) => {
                    let _ = conn.execute_batch("ROLLBACK");
                    Err(StoreError::Write(e.into()))
                }
            },
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK");
                Err(StoreError::Write(e))
            }
        }
    }

    fn get_physical_item(&self, id: i64) -> Result<Option<PhysicalItem>> {
        let conn = self.lock();
        let sql = format!("SELECT {} FROM physical_items WHERE id = ?1", PHYSICAL_ITEM_COLUMNS);
        Ok(query_physical_items(&conn, &sql, params![id])?.into_iter().next())
    }

    fn find_physical_item_by_name(&self, name: &str) -> Result<Option<PhysicalItem>> {
        let conn = self.lock();
        let sql = format!(
            "SELECT {} FROM physical_items WHERE name = ?1 ORDER BY id LIMIT 1",
            PHYSICAL_ITEM_COLUMNS
        );
        Ok(query_physical_items(&conn, &sql, params![name])?.into_iter().next())
    }

    fn list_physical_items(&self) -> Result<Vec<PhysicalItem>> {
        let conn = self.lock();
        let sql = format!(
            "SELECT {} FROM physical_items ORDER BY created_at DESC, id DESC",
            PHYSICAL_ITEM_COLUMNS
        );
        query_physical_items(&conn, &sql, [])
    }

    fn physical_items_with_format(&self, format: Format) -> Result<Vec<PhysicalItem>> {
        let conn = self.lock();
        let sql = format!(
            "SELECT {} FROM physical_items WHERE id IN
               (SELECT physical_item_id FROM physical_item_formats WHERE format = ?1)
             ORDER BY created_at DESC, id DESC",
            PHYSICAL_ITEM_COLUMNS
        );
        query_physical_items(&conn, &sql, params![format.as_str()])
    }

    fn get_media(&self, id: i64) -> Result<Option<Media>> {
        let conn = self.lock();
        let sql = format!("SELECT {} FROM media WHERE id = ?1", MEDIA_COLUMNS);
        Ok(query_media(&conn, &sql, params![id])?.into_iter().next())
    }

    fn find_media_by_external_id(&self, external_id: i64) -> Result<Vec<Media>> {
        let conn = self.lock();
        let sql = format!(
            "SELECT {} FROM media WHERE external_id = ?1 ORDER BY id",
            MEDIA_COLUMNS
        );
        query_media(&conn, &sql, params![external_id])
    }

    fn links_for_physical_item(&self, physical_item_id: i64) -> Result<Vec<Link>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, physical_item_id, media_id, disc_number FROM links
             WHERE physical_item_id = ?1 ORDER BY disc_number, id",
        )?;
        let links = stmt
            .query_map(params![physical_item_id], |r| {
                Ok(Link {
                    id: r.get(0)?,
                    physical_item_id: r.get(1)?,
                    media_id: r.get(2)?,
                    disc_number: r.get(3)?,
                    formats: Vec::new(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        links
            .into_iter()
            .map(|mut link| {
                link.formats = read_link_formats(&conn, link.id)?;
                Ok(link)
            })
            .collect()
    }

    fn counts(&self) -> Result<CollectionCounts> {
        read_counts(&self.lock())
    }

    fn export_rows(&self) -> Result<Vec<ExportRow>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT l.id, l.physical_item_id, l.media_id, l.disc_number
             FROM links l
             JOIN physical_items p ON p.id = l.physical_item_id
             JOIN media m ON m.id = l.media_id
             ORDER BY p.created_at DESC, p.id DESC, l.disc_number ASC, l.id ASC",
        )?;
        let link_rows = stmt
            .query_map([], |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, i64>(2)?,
                    r.get::<_, i64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let item_sql = format!("SELECT {} FROM physical_items WHERE id = ?1", PHYSICAL_ITEM_COLUMNS);
        let media_sql = format!("SELECT {} FROM media WHERE id = ?1", MEDIA_COLUMNS);
        let mut items: HashMap<i64, PhysicalItem> = HashMap::new();
        let mut media: HashMap<i64, Media> = HashMap::new();

        let mut rows = Vec::with_capacity(link_rows.len());
        for (link_id, physical_item_id, media_id, disc_number) in link_rows {
            if !items.contains_key(&physical_item_id) {
                let item = query_physical_items(&conn, &item_sql, params![physical_item_id])?
                    .into_iter()
                    .next()
                    .with_context(|| format!("Physical item {} vanished", physical_item_id))?;
                items.insert(physical_item_id, item);
            }
            if !media.contains_key(&media_id) {
                let m = query_media(&conn, &media_sql, params![media_id])?
                    .into_iter()
                    .next()
                    .with_context(|| format!("Media {} vanished", media_id))?;
                media.insert(media_id, m);
            }
            rows.push(ExportRow {
                physical_item: items[&physical_item_id].clone(),
                media: media[&media_id].clone(),
                disc_number,
                formats: read_link_formats(&conn, link_id)?,
            });
        }
        Ok(rows)
    }

    fn add_link(&self, link: &NewLink) -> Result<i64> {
        let mut link_id = 0;
        self.write_transaction(&mut |writer: &dyn CollectionWriter| {
            link_id = writer.create_link(link)?;
            writer.recompute_format_set(link.physical_item_id)?;
            Ok(())
        })?;
        Ok(link_id)
    }

    fn remove_link(&self, link_id: i64) -> Result<bool> {
        let mut removed = false;
        self.write_transaction(&mut |writer: &dyn CollectionWriter| {
            if let Some(physical_item_id) = writer.delete_link(link_id)? {
                writer.recompute_format_set(physical_item_id)?;
                removed = true;
            }
            Ok(())
        })?;
        Ok(removed)
    }

    fn delete_physical_item(&self, id: i64) -> Result<bool> {
        // Links and format rows go with it through ON DELETE CASCADE.
        let deleted = self
            .lock()
            .execute("DELETE FROM physical_items WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}
