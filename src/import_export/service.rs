//! Validate, import and export entry points over a `CollectionStore`.

use super::csv_codec::CsvDocument;
use super::error::{CsvParseError, ImportError};
use super::export::rows_to_csv;
use super::models::*;
use super::reconcile::{group_rows, reconcile_groups, GroupOutcome, GroupReport};
use super::validation::{validate_dry_run, validate_strict, RowWarning};
use crate::collection_store::{CollectionStore, CollectionWriter, StoreError};
use crate::server::metrics;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

#[derive(Clone)]
pub struct ImportExportService {
    store: Arc<dyn CollectionStore>,
}

impl ImportExportService {
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn CollectionStore> {
        &self.store
    }

    /// Dry run over the whole document. Nothing is written.
    pub fn validate(&self, csv_data: &str) -> Result<ValidationResult, CsvParseError> {
        let document = CsvDocument::parse(csv_data)?;
        let mut result = ValidationResult {
            total_rows: document.rows.len(),
            ..Default::default()
        };

        // (physical_item_name, external_id) -> first row carrying it
        let mut seen_links: HashMap<(String, i64), usize> = HashMap::new();

        for raw in &document.rows {
            let (errors, mut warnings) = validate_dry_run(raw);

            if let (Some(name), Some(external_id)) = (
                raw.get("physical_item_name"),
                raw.get("external_id").and_then(|v| v.trim().parse::<i64>().ok()),
            ) {
                match seen_links.get(&(name.to_string(), external_id)) {
                    Some(&first_row) => warnings.push(RowWarning::DuplicateLink {
                        physical_item_name: name.to_string(),
                        external_id,
                        first_row,
                    }),
                    None => {
                        seen_links.insert((name.to_string(), external_id), raw.number);
                    }
                }
            }

            result.errors.extend(errors.into_iter().map(|e| RowErrorEntry {
                row: raw.number,
                error: e.to_string(),
            }));
            result
                .warnings
                .extend(warnings.into_iter().map(|w| RowWarningEntry {
                    row: raw.number,
                    warning: w.to_string(),
                }));
        }

        result.valid = result.errors.is_empty();
        debug!(
            "Validated {} rows: {} errors, {} warnings",
            result.total_rows,
            result.errors.len(),
            result.warnings.len()
        );
        Ok(result)
    }

    /// Parses, validates and writes `csv_data`. Each physical item group is
    /// atomic; the result reports per-group and per-row failures.
    pub fn import(&self, csv_data: &str, mode: ImportMode) -> Result<ImportResult, ImportError> {
        let started = Instant::now();
        let document = CsvDocument::parse(csv_data)?;

        let mut result = ImportResult {
            total: document.rows.len(),
            ..Default::default()
        };

        let mut valid_rows = Vec::with_capacity(document.rows.len());
        for raw in &document.rows {
            match validate_strict(raw) {
                Ok(row) => valid_rows.push(NumberedRow {
                    number: raw.number,
                    row,
                }),
                Err(e) => {
                    debug!("Rejected row {}: {}", raw.number, e);
                    result.failed += 1;
                    result.errors.push(ImportErrorEntry {
                        row: Some(raw.number),
                        group: None,
                        error: e.to_string(),
                        data: raw.to_json(),
                    });
                }
            }
        }
        let rejected_rows = result.failed;

        if mode == ImportMode::Replace {
            self.wipe_collection()?;
        }

        let groups = group_rows(valid_rows);
        let reports = match reconcile_groups(self.store.as_ref(), &groups) {
            Ok(reports) => reports,
            Err(abort) => {
                let committed_groups = abort.committed_groups();
                error!(
                    "Import aborted after {} committed groups: {}",
                    committed_groups, abort.source
                );
                metrics::record_db_connection_error();
                return Err(ImportError::Fatal {
                    committed_groups,
                    source: abort.source,
                });
            }
        };

        for report in reports {
            tally_group(&mut result, report);
        }

        let committed = result.successful;
        let rolled_back = result.failed - rejected_rows;
        metrics::record_import(
            &mode.to_string(),
            result.total,
            rejected_rows,
            committed,
            rolled_back,
            started.elapsed(),
        );
        info!(
            "Import ({}) of {} rows: {} groups committed, {} groups rolled back, {} rows rejected in {:?}",
            mode,
            result.total,
            committed,
            rolled_back,
            rejected_rows,
            started.elapsed()
        );
        self.refresh_collection_metrics();

        Ok(result)
    }

    /// Full collection as CSV.
    pub fn export(&self) -> Result<String> {
        let rows = self.store.export_rows()?;
        let csv = rows_to_csv(&rows)?;
        metrics::record_export(rows.len());
        info!("Exported {} rows", rows.len());
        Ok(csv)
    }

    fn wipe_collection(&self) -> Result<(), ImportError> {
        let mut deleted = 0;
        self.store
            .write_transaction(&mut |writer: &dyn CollectionWriter| {
                deleted = writer.delete_all_physical_items()?;
                Ok(())
            })
            .map_err(|source| {
                error!("Failed to clear the collection for replace import: {}", source);
                if matches!(source, StoreError::Unavailable(_)) {
                    metrics::record_db_connection_error();
                }
                ImportError::Fatal {
                    committed_groups: 0,
                    source,
                }
            })?;
        info!("Replace import cleared {} physical items", deleted);
        Ok(())
    }

    fn refresh_collection_metrics(&self) {
        if let Ok(counts) = self.store.counts() {
            metrics::set_collection_counts(counts.physical_items, counts.media, counts.links);
        }
    }
}

fn tally_group(result: &mut ImportResult, report: GroupReport) {
    match report.outcome {
        GroupOutcome::Committed(_) => result.successful += 1,
        GroupOutcome::RolledBack { reason } => {
            result.failed += 1;
            result.errors.push(ImportErrorEntry {
                row: None,
                group: Some(report.physical_item_name),
                error: reason,
                data: serde_json::json!({ "rows": report.rows }),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection_store::*;
    use crate::import_export::csv_codec::CsvDocument;
    use std::collections::BTreeSet;

    const BTTF: &str = "title,physical_item_name,formats,external_id,disc_number\n\
\"Back to the Future\",\"BTTF Trilogy\",\"[\"\"Blu-ray\"\"]\",105,1\n\
\"Back to the Future Part II\",\"BTTF Trilogy\",\"[\"\"Blu-ray\"\"]\",165,2\n";

    fn in_memory_service() -> (ImportExportService, Arc<SqliteCollectionStore>) {
        let store = Arc::new(SqliteCollectionStore::in_memory().unwrap());
        (ImportExportService::new(store.clone()), store)
    }

    #[test]
    fn bttf_scenario() {
        let (service, store) = in_memory_service();

        let result = service.import(BTTF, ImportMode::Add).unwrap();

        assert_eq!(result.total, 2);
        assert_eq!(result.successful, 1);
        assert_eq!(result.failed, 0);
        assert!(result.errors.is_empty());

        let items = store.list_physical_items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "BTTF Trilogy");
        assert_eq!(items[0].format_set, vec![Format::BluRay]);

        assert_eq!(store.find_media_by_external_id(105).unwrap().len(), 1);
        assert_eq!(store.find_media_by_external_id(165).unwrap().len(), 1);

        let discs: Vec<i64> = store
            .links_for_physical_item(items[0].id)
            .unwrap()
            .iter()
            .map(|l| l.disc_number)
            .collect();
        assert_eq!(discs, vec![1, 2]);
    }

    #[test]
    fn reimport_in_add_mode_never_duplicates_media() {
        let (service, store) = in_memory_service();
        let csv = "title,physical_item_name,formats,external_id\n\
The Matrix,Matrix Box,\"[\"\"DVD\"\"]\",603\n";

        service.import(csv, ImportMode::Add).unwrap();
        service.import(csv, ImportMode::Add).unwrap();

        assert_eq!(store.find_media_by_external_id(603).unwrap().len(), 1);
        let items = store.list_physical_items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(store.links_for_physical_item(items[0].id).unwrap().len(), 2);

        let other = "title,physical_item_name,formats,external_id\n\
The Matrix,Matrix 4K,\"[\"\"4K UHD\"\"]\",603\n";
        service.import(other, ImportMode::Add).unwrap();
        assert_eq!(store.find_media_by_external_id(603).unwrap().len(), 1);
        assert_eq!(store.counts().unwrap().physical_items, 2);
    }

    #[test]
    fn reused_media_keeps_stored_fields() {
        let (service, store) = in_memory_service();
        service
            .import(
                "title,physical_item_name,formats,external_id,director\n\
Alien,Box A,\"[\"\"DVD\"\"]\",348,Ridley Scott\n",
                ImportMode::Add,
            )
            .unwrap();
        service
            .import(
                "title,physical_item_name,formats,external_id,director\n\
Alien (renamed),Box B,\"[\"\"DVD\"\"]\",348,Somebody Else\n",
                ImportMode::Add,
            )
            .unwrap();

        let media = store.find_media_by_external_id(348).unwrap();
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].title, "Alien");
        assert_eq!(media[0].director.as_deref(), Some("Ridley Scott"));
    }

    #[test]
    fn format_set_is_union_of_link_formats() {
        let (service, store) = in_memory_service();
        let csv = "title,physical_item_name,formats\n\
A,Box,\"[\"\"VHS\"\",\"\"DVD\"\"]\"\n\
B,Box,\"[\"\"4K UHD\"\",\"\"DVD\"\"]\"\n";
        service.import(csv, ImportMode::Add).unwrap();

        for item in store.list_physical_items().unwrap() {
            let union: BTreeSet<Format> = store
                .links_for_physical_item(item.id)
                .unwrap()
                .into_iter()
                .flat_map(|l| l.formats)
                .collect();
            assert_eq!(item.format_set, union.into_iter().collect::<Vec<_>>());
        }
        let item = store.find_physical_item_by_name("Box").unwrap().unwrap();
        assert_eq!(
            item.format_set,
            vec![Format::UltraHd4k, Format::Dvd, Format::Vhs]
        );
    }

    #[test]
    fn group_failing_at_write_time_leaves_no_trace() {
        let (service, store) = in_memory_service();
        store
            .execute_batch_for_test(
                "CREATE TRIGGER reject_vhs BEFORE INSERT ON link_formats
                 WHEN NEW.format = 'VHS'
                 BEGIN SELECT RAISE(ABORT, 'VHS rejected by storage'); END;",
            )
            .unwrap();

        let csv = "title,physical_item_name,formats\n\
One,Doomed Box,\"[\"\"DVD\"\"]\"\n\
Two,Doomed Box,\"[\"\"VHS\"\"]\"\n\
Three,Doomed Box,\"[\"\"DVD\"\"]\"\n\
Four,Fine Box,\"[\"\"DVD\"\"]\"\n";
        let result = service.import(csv, ImportMode::Add).unwrap();

        assert_eq!(result.total, 4);
        assert_eq!(result.successful, 1);
        assert_eq!(result.failed, 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].group.as_deref(), Some("Doomed Box"));
        assert_eq!(result.errors[0].row, None);
        assert_eq!(result.errors[0].data["rows"], serde_json::json!([1, 2, 3]));

        assert!(store.find_physical_item_by_name("Doomed Box").unwrap().is_none());
        assert!(store.find_physical_item_by_name("Fine Box").unwrap().is_some());
        let counts = store.counts().unwrap();
        assert_eq!(counts.links, 1);
        assert_eq!(counts.media, 1);
    }

    #[test]
    fn invalid_rows_are_excluded_and_reported() {
        let (service, store) = in_memory_service();
        let csv = "title,physical_item_name,formats\n\
,Box,\"[\"\"DVD\"\"]\"\n\
Good,Box,\"[\"\"DVD\"\"]\"\n\
Bad,Box,\"[\"\"Betamax\"\"]\"\n";
        let result = service.import(csv, ImportMode::Add).unwrap();

        assert_eq!(result.total, 3);
        assert_eq!(result.successful, 1);
        assert_eq!(result.failed, 2);
        let rows: Vec<Option<usize>> = result.errors.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![Some(1), Some(3)]);
        assert_eq!(result.errors[1].error, "Invalid format: Betamax");
        assert_eq!(result.errors[1].data["title"], "Bad");
        assert_eq!(store.counts().unwrap().links, 1);
    }

    #[test]
    fn parse_error_rejects_before_any_write() {
        let (service, store) = in_memory_service();
        service.import(BTTF, ImportMode::Add).unwrap();

        let err = service
            .import("title,formats\nA,\"[\"\"DVD\"\"]\"\n", ImportMode::Replace)
            .unwrap_err();
        assert!(matches!(
            err,
            ImportError::Parse(CsvParseError::MissingColumns(_))
        ));
        assert_eq!(store.counts().unwrap().physical_items, 1);
    }

    #[test]
    fn replace_mode_wipes_items_and_links_but_keeps_media() {
        let (service, store) = in_memory_service();
        service.import(BTTF, ImportMode::Add).unwrap();

        let csv = "title,physical_item_name,formats,external_id\n\
Alien,Alien Box,\"[\"\"DVD\"\"]\",348\n";
        let result = service.import(csv, ImportMode::Replace).unwrap();
        assert_eq!(result.successful, 1);

        let items = store.list_physical_items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Alien Box");
        assert_eq!(store.counts().unwrap().links, 1);
        // Media from the first import survive the wipe.
        assert_eq!(store.counts().unwrap().media, 3);
        assert_eq!(store.find_media_by_external_id(105).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_link_rows_are_allowed_and_flagged_by_validate() {
        let (service, store) = in_memory_service();
        let csv = "title,physical_item_name,formats,external_id\n\
Alien,Box,\"[\"\"DVD\"\"]\",348\n\
Alien,Box,\"[\"\"DVD\"\"]\",348\n";

        let validation = service.validate(csv).unwrap();
        assert!(validation.valid);
        assert_eq!(validation.warnings.len(), 1);
        assert_eq!(validation.warnings[0].row, 2);

        let result = service.import(csv, ImportMode::Add).unwrap();
        assert_eq!(result.failed, 0);
        let item = store.find_physical_item_by_name("Box").unwrap().unwrap();
        assert_eq!(store.links_for_physical_item(item.id).unwrap().len(), 2);
        assert_eq!(store.counts().unwrap().media, 1);
    }

    #[test]
    fn validate_reports_everything_and_writes_nothing() {
        let (service, store) = in_memory_service();
        let csv = "title,physical_item_name,formats,release_date,cast\n\
Alien,Box,\"[\"\"DVD\"\",\"\"Betamax\"\"]\",1979,not json\n\
,,[],,\n\
Fine,Box,\"[\"\"DVD\"\"]\",1979-05-25,\"[\"\"Sigourney Weaver\"\"]\"\n";

        let result = service.validate(csv).unwrap();

        assert!(!result.valid);
        assert_eq!(result.total_rows, 3);
        let error_rows: Vec<usize> = result.errors.iter().map(|e| e.row).collect();
        assert_eq!(error_rows, vec![1, 2, 2, 2]);
        let warning_rows: Vec<usize> = result.warnings.iter().map(|w| w.row).collect();
        assert_eq!(warning_rows, vec![1, 1]);
        assert_eq!(store.counts().unwrap(), CollectionCounts::default());
    }

    #[test]
    fn valid_document_imports_without_failures() {
        let (service, _store) = in_memory_service();
        let csv = "title,physical_item_name,formats,external_id,disc_number,purchase_date,store_links\n\
A,Box 1,\"[\"\"DVD\"\"]\",nope,zero,someday,\"{}\"\n\
B,Box 2,\"[\"\"LaserDisc\"\"]\",,,,\n";

        let validation = service.validate(csv).unwrap();
        assert!(validation.valid);
        assert!(validation.errors.is_empty());

        let result = service.import(csv, ImportMode::Add).unwrap();
        assert_eq!(result.failed, 0);
        assert_eq!(result.successful, 2);
    }

    #[test]
    fn export_round_trips_imported_rows() {
        let (service, _store) = in_memory_service();
        let csv = "title,physical_item_name,formats,external_id,synopsis,cover_art_url,release_date,director,cast,disc_number,edition_notes,purchase_date,store_links,custom_image_url\n\
\"Back to the Future\",\"BTTF Trilogy\",\"[\"\"Blu-ray\"\",\"\"DVD\"\"]\",105,\"Marty, Doc, and a \"\"DeLorean\"\"\",https://img/1.jpg,1985-07-03,Robert Zemeckis,\"[\"\"Michael J. Fox\"\",\"\"Christopher Lloyd\"\"]\",1,\"Steelbook\nLimited\",2021-12-24,\"[{\"\"label\"\":\"\"Shop\"\",\"\"url\"\":\"\"https://shop\"\"}]\",https://img/custom.jpg\n\
\"Back to the Future Part II\",\"BTTF Trilogy\",\"[\"\"Blu-ray\"\"]\",165,,,,,,2,\"Steelbook\nLimited\",2021-12-24,\"[{\"\"label\"\":\"\"Shop\"\",\"\"url\"\":\"\"https://shop\"\"}]\",https://img/custom.jpg\n\
Home Movie,Shoebox,\"[\"\"VHS\"\"]\",,,,,,not a list,1,,,,\n";

        service.import(csv, ImportMode::Add).unwrap();
        let exported = service.export().unwrap();

        let compared = [
            "title",
            "physical_item_name",
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
        ];
        let project = |text: &str| -> BTreeSet<Vec<String>> {
            CsvDocument::parse(text)
                .unwrap()
                .rows
                .iter()
                .map(|row| {
                    compared
                        .iter()
                        .map(|c| row.get(c).unwrap_or_default().to_string())
                        .collect()
                })
                .collect()
        };

        assert_eq!(project(&exported), project(csv));

        // and the export is itself importable
        let (second, second_store) = in_memory_service();
        let result = second.import(&exported, ImportMode::Add).unwrap();
        assert_eq!(result.failed, 0);
        assert_eq!(second_store.counts().unwrap().links, 3);
    }

    #[test]
    fn export_keeps_cell_text_and_empty_lists_exactly() {
        let (service, store) = in_memory_service();
        let csv = "title,physical_item_name,formats,cast,store_links\n\
\"  Padded  \",Box,\"[\"\"DVD\"\"]\",[],[]\n";

        let report = service.validate(csv).unwrap();
        assert!(report.valid);
        assert!(report.warnings.is_empty());
        service.import(csv, ImportMode::Add).unwrap();

        let items = store.list_physical_items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].store_links, Some(LooseList::Items(vec![])));

        let exported = service.export().unwrap();
        let doc = CsvDocument::parse(&exported).unwrap();
        let row = &doc.rows[0];
        assert_eq!(row.get("title"), Some("  Padded  "));
        assert_eq!(row.get("physical_item_name"), Some("Box"));
        assert_eq!(row.get("cast"), Some("[]"));
        assert_eq!(row.get("store_links"), Some("[]"));
    }

    #[test]
    fn names_differing_only_in_whitespace_are_separate_items() {
        let (service, store) = in_memory_service();
        let csv = "title,physical_item_name,formats\n\
Alien,Box,\"[\"\"DVD\"\"]\"\n\
Aliens,\"Box \",\"[\"\"VHS\"\"]\"\n";

        let result = service.import(csv, ImportMode::Add).unwrap();
        assert_eq!(result.successful, 2);

        let mut names: Vec<String> = store
            .list_physical_items()
            .unwrap()
            .into_iter()
            .map(|item| item.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["Box".to_string(), "Box ".to_string()]);
    }

    #[test]
    fn export_orders_newest_item_first_then_disc() {
        let (service, _store) = in_memory_service();
        service
            .import(
                "title,physical_item_name,formats,disc_number\n\
Old,First Box,\"[\"\"DVD\"\"]\",1\n",
                ImportMode::Add,
            )
            .unwrap();
        service
            .import(
                "title,physical_item_name,formats,disc_number\n\
Two,Second Box,\"[\"\"DVD\"\"]\",2\n\
One,Second Box,\"[\"\"DVD\"\"]\",1\n",
                ImportMode::Add,
            )
            .unwrap();

        let exported = service.export().unwrap();
        let titles: Vec<String> = CsvDocument::parse(&exported)
            .unwrap()
            .rows
            .iter()
            .map(|r| r.get("title").unwrap_or_default().to_string())
            .collect();
        assert_eq!(titles, vec!["One", "Two", "Old"]);
    }

    /// Delegates to SQLite but refuses to start transactions once `budget`
    /// of them have been handed out.
    struct FlakyStore {
        inner: SqliteCollectionStore,
        budget: std::sync::atomic::AtomicUsize,
    }

    impl CollectionStore for FlakyStore {
        fn write_transaction(
            &self,
            work: &mut dyn FnMut(&dyn CollectionWriter) -> anyhow::Result<()>,
        ) -> std::result::Result<(), StoreError> {
            use std::sync::atomic::Ordering;
            let left = self.budget.load(Ordering::SeqCst);
            if left == 0 {
                return Err(StoreError::Unavailable(
                    rusqlite::Error::QueryReturnedNoRows,
                ));
            }
            self.budget.store(left - 1, Ordering::SeqCst);
            self.inner.write_transaction(work)
        }
        fn get_physical_item(&self, id: i64) -> anyhow::Result<Option<PhysicalItem>> {
            self.inner.get_physical_item(id)
        }
        fn find_physical_item_by_name(&self, name: &str) -> anyhow::Result<Option<PhysicalItem>> {
            self.inner.find_physical_item_by_name(name)
        }
        fn list_physical_items(&self) -> anyhow::Result<Vec<PhysicalItem>> {
            self.inner.list_physical_items()
        }
        fn physical_items_with_format(&self, format: Format) -> anyhow::Result<Vec<PhysicalItem>> {
            self.inner.physical_items_with_format(format)
        }
        fn get_media(&self, id: i64) -> anyhow::Result<Option<Media>> {
            self.inner.get_media(id)
        }
        fn find_media_by_external_id(&self, external_id: i64) -> anyhow::Result<Vec<Media>> {
            self.inner.find_media_by_external_id(external_id)
        }
        fn links_for_physical_item(&self, physical_item_id: i64) -> anyhow::Result<Vec<Link>> {
            self.inner.links_for_physical_item(physical_item_id)
        }
        fn counts(&self) -> anyhow::Result<CollectionCounts> {
            self.inner.counts()
        }
        fn export_rows(&self) -> anyhow::Result<Vec<ExportRow>> {
            self.inner.export_rows()
        }
        fn add_link(&self, link: &NewLink) -> anyhow::Result<i64> {
            self.inner.add_link(link)
        }
        fn remove_link(&self, link_id: i64) -> anyhow::Result<bool> {
            self.inner.remove_link(link_id)
        }
        fn delete_physical_item(&self, id: i64) -> anyhow::Result<bool> {
            self.inner.delete_physical_item(id)
        }
    }

    #[test]
    fn datastore_outage_aborts_but_keeps_committed_groups() {
        let store = Arc::new(FlakyStore {
            inner: SqliteCollectionStore::in_memory().unwrap(),
            budget: std::sync::atomic::AtomicUsize::new(1),
        });
        let service = ImportExportService::new(store.clone());
        let csv = "title,physical_item_name,formats\n\
A,First,\"[\"\"DVD\"\"]\"\n\
B,Second,\"[\"\"DVD\"\"]\"\n";

        let err = service.import(csv, ImportMode::Add).unwrap_err();

        match err {
            ImportError::Fatal {
                committed_groups,
                source: StoreError::Unavailable(_),
            } => assert_eq!(committed_groups, 1),
            other => panic!("unexpected error {:?}", other),
        }
        let names: Vec<String> = store
            .list_physical_items()
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["First"]);
    }

    #[test]
    fn replace_is_fatal_when_the_wipe_cannot_start() {
        let store = Arc::new(FlakyStore {
            inner: SqliteCollectionStore::in_memory().unwrap(),
            budget: std::sync::atomic::AtomicUsize::new(0),
        });
        let service = ImportExportService::new(store);

        let err = service.import(BTTF, ImportMode::Replace).unwrap_err();
        assert!(matches!(
            err,
            ImportError::Fatal {
                committed_groups: 0,
                ..
            }
        ));
    }
}
