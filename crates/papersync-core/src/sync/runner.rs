use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::RecordId;
use crate::reconcile::{FieldReconciler, ReconcileOutcome};
use crate::sync::{MetadataLookup, RecordPager, RecordSink, RecordSource};

/// An update decided for one record but not written (dry-run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedUpdate {
    pub record_id: RecordId,
    pub title: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub dry_run: bool,
    pub pages_scanned: usize,
    pub records_seen: usize,
    pub untitled: usize,
    pub complete: usize,
    pub not_found: usize,
    pub nothing_usable: usize,
    pub updated: usize,
    /// Filled only in dry-run.
    pub planned: Vec<PlannedUpdate>,
}

impl SyncReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
            pages_scanned: 0,
            records_seen: 0,
            untitled: 0,
            complete: 0,
            not_found: 0,
            nothing_usable: 0,
            updated: 0,
            planned: Vec::new(),
        }
    }

    /// Records that were (or in dry-run would have been) written.
    pub fn changed(&self) -> usize {
        if self.dry_run {
            self.planned.len()
        } else {
            self.updated
        }
    }
}

/// Runs reconciliation over every record of a source, one record at a time.
pub struct SyncRunner<'a> {
    reconciler: FieldReconciler,
    source: &'a dyn RecordSource,
    sink: &'a dyn RecordSink,
    lookup: &'a dyn MetadataLookup,
    dry_run: bool,
}

impl<'a> SyncRunner<'a> {
    pub fn new(
        reconciler: FieldReconciler,
        source: &'a dyn RecordSource,
        sink: &'a dyn RecordSink,
        lookup: &'a dyn MetadataLookup,
    ) -> Self {
        Self {
            reconciler,
            source,
            sink,
            lookup,
            dry_run: false,
        }
    }

    /// Decide every update but skip the writes.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Page-fetch and write failures abort the run; lookup misses do not.
    pub async fn run(&self) -> Result<SyncReport> {
        let mut report = SyncReport::new(self.dry_run);
        let mut pager = RecordPager::new(self.source);

        while let Some(record) = pager.next_record().await? {
            report.records_seen += 1;
            report.pages_scanned = pager.pages_fetched();

            match self.reconciler.reconcile(&record, self.lookup).await {
                ReconcileOutcome::Untitled => {
                    debug!(record = %record.id, "skipping record without title");
                    report.untitled += 1;
                }
                ReconcileOutcome::Complete { title } => {
                    debug!("Skipping '{title}' (already filled)");
                    report.complete += 1;
                }
                ReconcileOutcome::NotFound { title } => {
                    warn!("Could not find metadata for '{title}'");
                    report.not_found += 1;
                }
                ReconcileOutcome::NothingUsable { title } => {
                    debug!("No usable metadata for '{title}'");
                    report.nothing_usable += 1;
                }
                ReconcileOutcome::Update { title, payload } => {
                    let fields = payload.field_names();
                    info!("Updating '{title}' with {fields:?} fields");

                    if self.dry_run {
                        info!(record = %record.id, "dry run, not writing");
                        report.planned.push(PlannedUpdate {
                            record_id: record.id.clone(),
                            title,
                            fields,
                        });
                    } else {
                        self.sink.update_record(&record.id, &payload).await?;
                        report.updated += 1;
                    }
                }
            }
        }

        report.pages_scanned = pager.pages_fetched();
        report.finished_at = Some(Utc::now());
        info!(
            pages = report.pages_scanned,
            records = report.records_seen,
            "Updated {} pages",
            report.updated
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::SyncError;
    use crate::models::{FieldSchema, PaperMetadata, PropertyValue, Record, UpdatePayload};
    use crate::sync::RecordPage;

    struct MemorySource {
        pages: Vec<RecordPage>,
        calls: AtomicUsize,
        fail_on_page: Option<usize>,
    }

    impl MemorySource {
        fn new(pages: Vec<RecordPage>) -> Self {
            Self {
                pages,
                calls: AtomicUsize::new(0),
                fail_on_page: None,
            }
        }
    }

    #[async_trait]
    impl RecordSource for MemorySource {
        async fn query_page(&self, _cursor: Option<&str>) -> Result<RecordPage> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on_page == Some(index) {
                return Err(SyncError::Http {
                    service: "notion".to_string(),
                    status: 502,
                    body: "bad gateway".to_string(),
                });
            }
            Ok(self.pages[index].clone())
        }
    }

    #[derive(Default)]
    struct MemorySink {
        writes: Mutex<Vec<(RecordId, UpdatePayload)>>,
        fail: bool,
    }

    #[async_trait]
    impl RecordSink for MemorySink {
        async fn update_record(&self, id: &RecordId, payload: &UpdatePayload) -> Result<()> {
            if self.fail {
                return Err(SyncError::Http {
                    service: "notion".to_string(),
                    status: 400,
                    body: "validation_error".to_string(),
                });
            }
            self.writes.lock().unwrap().push((id.clone(), payload.clone()));
            Ok(())
        }
    }

    struct TitleLookup(HashMap<String, PaperMetadata>);

    #[async_trait]
    impl MetadataLookup for TitleLookup {
        async fn lookup(&self, title: &str) -> Option<PaperMetadata> {
            self.0.get(title).cloned()
        }
    }

    fn paper(title: &str) -> Record {
        Record::new(format!("id-{title}"))
            .with_property("Name", PropertyValue::Title(vec![title.to_string()]))
            .with_property("Author", PropertyValue::MultiSelect(vec![]))
            .with_property("Abstract", PropertyValue::RichText(vec![]))
    }

    fn fixture() -> (MemorySource, TitleLookup) {
        let source = MemorySource::new(vec![
            RecordPage {
                records: vec![paper("Known"), Record::new("untitled")],
                next_cursor: Some("next".to_string()),
            },
            RecordPage {
                records: vec![paper("Unknown")],
                next_cursor: None,
            },
        ]);
        let lookup = TitleLookup(HashMap::from([(
            "Known".to_string(),
            PaperMetadata {
                authors: vec!["J. Doe".to_string()],
                abstract_text: Some("Lorem ipsum".to_string()),
                ..PaperMetadata::new("Known")
            },
        )]));
        (source, lookup)
    }

    #[tokio::test]
    async fn writes_updates_and_counts_outcomes() {
        let (source, lookup) = fixture();
        let sink = MemorySink::default();

        let report = SyncRunner::new(FieldReconciler::new(FieldSchema::default()), &source, &sink, &lookup)
            .run()
            .await
            .unwrap();

        assert_eq!(report.pages_scanned, 2);
        assert_eq!(report.records_seen, 3);
        assert_eq!(report.untitled, 1);
        assert_eq!(report.not_found, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(report.changed(), 1);
        assert!(report.planned.is_empty());
        assert!(report.finished_at.is_some());

        let writes = sink.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0.as_str(), "id-Known");
        assert_eq!(writes[0].1.field_names(), vec!["Abstract", "Author"]);
    }

    #[tokio::test]
    async fn dry_run_plans_without_writing() {
        let (source, lookup) = fixture();
        let sink = MemorySink::default();

        let report = SyncRunner::new(FieldReconciler::new(FieldSchema::default()), &source, &sink, &lookup)
            .dry_run(true)
            .run()
            .await
            .unwrap();

        assert!(sink.writes.lock().unwrap().is_empty());
        assert_eq!(report.updated, 0);
        assert_eq!(report.changed(), 1);
        assert_eq!(
            report.planned,
            vec![PlannedUpdate {
                record_id: RecordId::new("id-Known"),
                title: "Known".to_string(),
                fields: vec!["Abstract".to_string(), "Author".to_string()],
            }]
        );
    }

    #[tokio::test]
    async fn write_failure_aborts_the_run() {
        let (source, lookup) = fixture();
        let sink = MemorySink {
            fail: true,
            ..Default::default()
        };

        let err = SyncRunner::new(FieldReconciler::new(FieldSchema::default()), &source, &sink, &lookup)
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Http { status: 400, .. }));
        // The second page is never requested.
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn page_fetch_failure_aborts_the_run() {
        let (mut source, lookup) = fixture();
        source.fail_on_page = Some(1);
        let sink = MemorySink::default();

        let err = SyncRunner::new(FieldReconciler::new(FieldSchema::default()), &source, &sink, &lookup)
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Http { status: 502, .. }));
        assert_eq!(sink.writes.lock().unwrap().len(), 1);
    }
}
