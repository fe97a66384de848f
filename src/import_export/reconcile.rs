//! Turns validated rows into physical items, media and links.
//!
//! Rows are grouped by `physical_item_name` and every group is written in its
//! own transaction, so a group lands completely or not at all. Groups run in
//! the order their name first appears in the input.

use super::models::NumberedRow;
use crate::collection_store::{CollectionStore, CollectionWriter, Format, NewLink, StoreError};
use anyhow::{Context, Result};
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq)]
pub struct ImportGroup {
    pub physical_item_name: String,
    pub rows: Vec<NumberedRow>,
}

impl ImportGroup {
    pub fn row_numbers(&self) -> Vec<usize> {
        self.rows.iter().map(|r| r.number).collect()
    }
}

/// Partitions rows by physical item name, keeping first-seen order of names
/// and input order of rows within a group.
pub fn group_rows(rows: Vec<NumberedRow>) -> Vec<ImportGroup> {
    let mut groups: Vec<ImportGroup> = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();

    for numbered in rows {
        let name = numbered.row.physical_item_name.clone();
        match index_by_name.get(&name) {
            Some(&index) => groups[index].rows.push(numbered),
            None => {
                index_by_name.insert(name.clone(), groups.len());
                groups.push(ImportGroup {
                    physical_item_name: name,
                    rows: vec![numbered],
                });
            }
        }
    }

    groups
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroupSummary {
    pub physical_item_id: i64,
    pub reused_physical_item: bool,
    pub media_created: usize,
    pub media_reused: usize,
    pub links_created: usize,
    pub format_set: Vec<Format>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GroupOutcome {
    Committed(GroupSummary),
    RolledBack { reason: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroupReport {
    pub physical_item_name: String,
    pub rows: Vec<usize>,
    pub outcome: GroupOutcome,
}

impl GroupReport {
    pub fn is_committed(&self) -> bool {
        matches!(self.outcome, GroupOutcome::Committed(_))
    }
}

/// The datastore went away between groups.
#[derive(Debug)]
pub struct ReconcileAbort {
    pub reports: Vec<GroupReport>,
    pub source: StoreError,
}

impl ReconcileAbort {
    pub fn committed_groups(&self) -> usize {
        self.reports.iter().filter(|r| r.is_committed()).count()
    }
}

/// Writes one group through `writer`. Any error leaves the transaction to be
/// rolled back by the caller.
pub fn reconcile_group(
    writer: &dyn CollectionWriter,
    group: &ImportGroup,
) -> Result<GroupSummary> {
    let first = group
        .rows
        .first()
        .context("Cannot reconcile an empty group")?;

    let mut summary = GroupSummary::default();
    let mut running_formats: Vec<Format> = Vec::new();

    match writer.find_physical_item_id_by_name(&group.physical_item_name)? {
        Some(id) => {
            summary.physical_item_id = id;
            summary.reused_physical_item = true;
            running_formats.extend(writer.format_set(id)?);
        }
        None => {
            summary.physical_item_id =
                writer.create_physical_item(&first.row.new_physical_item())?;
        }
    }

    for numbered in &group.rows {
        let row = &numbered.row;

        let existing_media = match row.external_id {
            Some(external_id) => writer.find_media_id_by_external_id(external_id)?,
            None => None,
        };
        let media_id = match existing_media {
            Some(id) => {
                summary.media_reused += 1;
                id
            }
            None => {
                summary.media_created += 1;
                writer
                    .create_media(&row.new_media())
                    .with_context(|| format!("Row {}: failed to create media", numbered.number))?
            }
        };

        writer
            .create_link(&NewLink {
                physical_item_id: summary.physical_item_id,
                media_id,
                disc_number: row.disc_number(),
                formats: row.formats.clone(),
            })
            .with_context(|| format!("Row {}: failed to link '{}'", numbered.number, row.title))?;
        summary.links_created += 1;
        running_formats.extend(row.formats.iter().copied());
    }

    summary.format_set = Format::normalized_set(running_formats);
    writer.set_format_set(summary.physical_item_id, &summary.format_set)?;

    Ok(summary)
}

/// Runs every group in its own transaction. A failed group is reported and
/// the next one is attempted; a datastore that cannot start a transaction
/// stops the run.
pub fn reconcile_groups(
    store: &dyn CollectionStore,
    groups: &[ImportGroup],
) -> std::result::Result<Vec<GroupReport>, ReconcileAbort> {
    let mut reports = Vec::with_capacity(groups.len());

    for group in groups {
        let mut summary = None;
        let result = store.write_transaction(&mut |writer: &dyn CollectionWriter| {
            summary = Some(reconcile_group(writer, group)?);
            Ok(())
        });

        let outcome = match (result, summary) {
            (Ok(()), Some(summary)) => {
                debug!(
                    "Committed group '{}': {} links, {} new media",
                    group.physical_item_name, summary.links_created, summary.media_created
                );
                GroupOutcome::Committed(summary)
            }
            (Ok(()), None) => GroupOutcome::RolledBack {
                reason: "Group produced no result".to_string(),
            },
            (Err(StoreError::Write(err)), _) => {
                warn!(
                    "Rolled back group '{}': {:#}",
                    group.physical_item_name, err
                );
                GroupOutcome::RolledBack {
                    reason: format!("{:#}", err),
                }
            }
            (Err(source @ StoreError::Unavailable(_)), _) => {
                return Err(ReconcileAbort { reports, source });
            }
        };

        reports.push(GroupReport {
            physical_item_name: group.physical_item_name.clone(),
            rows: group.row_numbers(),
            outcome,
        });
    }

    Ok(reports)
}
