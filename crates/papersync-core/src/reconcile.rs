//! Deciding which fields of a record are missing and building the fill-in
//! update. Fields that already hold a value are never overwritten.

use crate::models::{FieldRole, FieldSchema, PaperMetadata, Record, UpdatePayload};
use crate::sync::MetadataLookup;
use crate::values::build_property_value;

/// What reconciling one record came to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The title field is absent, not a title, or blank.
    Untitled,
    /// Every tracked field on the record already has a value; no lookup made.
    Complete { title: String },
    /// The lookup returned nothing.
    NotFound { title: String },
    /// The lookup succeeded but none of its values fit an empty field.
    NothingUsable { title: String },
    Update { title: String, payload: UpdatePayload },
}

impl ReconcileOutcome {
    /// The update to apply; empty for every outcome but `Update`.
    pub fn into_payload(self) -> UpdatePayload {
        match self {
            Self::Update { payload, .. } => payload,
            _ => UpdatePayload::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldReconciler {
    schema: FieldSchema,
}

impl FieldReconciler {
    pub fn new(schema: FieldSchema) -> Self {
        Self { schema }
    }

    /// Trimmed title text, or `None` if the record has no usable title.
    pub fn extract_title(&self, record: &Record) -> Option<String> {
        let text = record.property(&self.schema.title)?.plain_text()?;
        let title = text.trim();
        (!title.is_empty()).then(|| title.to_string())
    }

    /// Tracked roles whose field exists on the record and holds no value.
    ///
    /// A tracked field the record does not have is not missing: the tool fills
    /// declared fields, it does not create them.
    pub fn missing_roles(&self, record: &Record) -> Vec<FieldRole> {
        self.schema
            .tracked()
            .filter(|(_, name)| record.property(name).is_some_and(|value| !value.has_value()))
            .map(|(role, _)| role)
            .collect()
    }

    /// Typed writes for the missing roles that `metadata` can fill.
    pub fn build_update(&self, record: &Record, metadata: &PaperMetadata) -> UpdatePayload {
        let mut payload = UpdatePayload::new();
        for (role, name) in self.schema.tracked() {
            let Some(current) = record.property(name) else { continue };
            if current.has_value() {
                continue;
            }
            let Some(input) = metadata.field_input(role) else { continue };
            if let Some(update) = build_property_value(&current.kind(), input) {
                payload.insert(name, update);
            }
        }
        payload
    }

    /// Reconciles one record, calling `lookup` at most once and only when a
    /// tracked field is missing.
    pub async fn reconcile<L>(&self, record: &Record, lookup: &L) -> ReconcileOutcome
    where
        L: MetadataLookup + ?Sized,
    {
        let Some(title) = self.extract_title(record) else {
            return ReconcileOutcome::Untitled;
        };

        if self.missing_roles(record).is_empty() {
            return ReconcileOutcome::Complete { title };
        }

        let Some(metadata) = lookup.lookup(&title).await else {
            return ReconcileOutcome::NotFound { title };
        };

        let payload = self.build_update(record, &metadata);
        if payload.is_empty() {
            ReconcileOutcome::NothingUsable { title }
        } else {
            ReconcileOutcome::Update { title, payload }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::models::{
        DateStart, DateValue, PropertyUpdate, PropertyValue, SelectOption, TextSegment,
    };

    struct FixedLookup {
        result: Option<PaperMetadata>,
        calls: AtomicUsize,
        titles: Mutex<Vec<String>>,
    }

    impl FixedLookup {
        fn new(result: Option<PaperMetadata>) -> Self {
            Self {
                result,
                calls: AtomicUsize::new(0),
                titles: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MetadataLookup for FixedLookup {
        async fn lookup(&self, title: &str) -> Option<PaperMetadata> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.titles.lock().unwrap().push(title.to_string());
            self.result.clone()
        }
    }

    fn title(text: &str) -> PropertyValue {
        PropertyValue::Title(vec![text.to_string()])
    }

    fn empty_date() -> PropertyValue {
        PropertyValue::Date(None)
    }

    fn filled_date(start: &str) -> PropertyValue {
        PropertyValue::Date(Some(DateValue {
            start: Some(start.to_string()),
            end: None,
        }))
    }

    /// "Foo Bar" with authors, published, venue and abstract tracked and empty;
    /// citation is untracked.
    fn foo_bar_setup() -> (FieldReconciler, Record) {
        let mut schema = FieldSchema::default();
        schema.untrack(FieldRole::Citation);

        let record = Record::new("page-1")
            .with_property("Name", title("Foo Bar"))
            .with_property("Author", PropertyValue::MultiSelect(vec![]))
            .with_property("Year", empty_date())
            .with_property("Venue", PropertyValue::RichText(vec![]))
            .with_property("Abstract", PropertyValue::RichText(vec![]));

        (FieldReconciler::new(schema), record)
    }

    fn foo_bar_metadata() -> PaperMetadata {
        PaperMetadata {
            authors: vec!["J. Doe".to_string()],
            year: Some(2021),
            publication_date: Some("2021-01-01".to_string()),
            venue: Some("ICML".to_string()),
            abstract_text: Some("Lorem ipsum".to_string()),
            citation: Some("J. Doe (2021). Foo Bar. ICML.".to_string()),
            ..PaperMetadata::new("Foo Bar")
        }
    }

    /// Applies a payload the way the destination would store it.
    fn apply(record: &Record, payload: &UpdatePayload) -> Record {
        let mut updated = record.clone();
        for (name, update) in payload.iter() {
            let value = match update {
                PropertyUpdate::Title(segments) => {
                    PropertyValue::Title(segments.iter().map(|s| s.content().to_string()).collect())
                }
                PropertyUpdate::RichText(segments) => {
                    PropertyValue::RichText(segments.iter().map(|s| s.content().to_string()).collect())
                }
                PropertyUpdate::MultiSelect(options) => {
                    PropertyValue::MultiSelect(options.iter().map(|o| o.name.clone()).collect())
                }
                PropertyUpdate::Date(date) => filled_date(&date.start),
            };
            updated.properties.insert(name.clone(), value);
        }
        updated
    }

    #[tokio::test]
    async fn fills_empty_fields_then_becomes_a_no_op() {
        let (reconciler, record) = foo_bar_setup();
        let lookup = FixedLookup::new(Some(foo_bar_metadata()));

        let payload = reconciler.reconcile(&record, &lookup).await.into_payload();

        assert_eq!(payload.field_names(), vec!["Abstract", "Author", "Venue", "Year"]);
        assert_eq!(
            payload.get("Author"),
            Some(&PropertyUpdate::MultiSelect(vec![SelectOption {
                name: "J. Doe".to_string()
            }]))
        );
        assert_eq!(
            payload.get("Year"),
            Some(&PropertyUpdate::Date(DateStart {
                start: "2021-01-01".to_string()
            }))
        );
        assert_eq!(
            payload.get("Venue"),
            Some(&PropertyUpdate::RichText(vec![TextSegment::text("ICML")]))
        );
        assert_eq!(
            payload.get("Abstract"),
            Some(&PropertyUpdate::RichText(vec![TextSegment::text("Lorem ipsum")]))
        );
        assert_eq!(lookup.titles.lock().unwrap().as_slice(), ["Foo Bar"]);

        let filled = apply(&record, &payload);
        let second = reconciler.reconcile(&filled, &lookup).await;

        assert_eq!(second, ReconcileOutcome::Complete { title: "Foo Bar".to_string() });
        assert!(second.into_payload().is_empty());
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn fully_populated_record_skips_lookup() {
        let reconciler = FieldReconciler::new(FieldSchema::default());
        let record = Record::new("page-2")
            .with_property("Name", title("Attention Is All You Need"))
            .with_property("Author", PropertyValue::MultiSelect(vec!["Vaswani".to_string()]))
            .with_property("Year", filled_date("2017-06-12"))
            .with_property("Venue", PropertyValue::RichText(vec!["NeurIPS".to_string()]))
            .with_property("Citation", PropertyValue::RichText(vec!["Vaswani et al.".to_string()]))
            .with_property("Abstract", PropertyValue::RichText(vec!["...".to_string()]));
        let lookup = FixedLookup::new(Some(foo_bar_metadata()));

        let outcome = reconciler.reconcile(&record, &lookup).await;

        assert!(matches!(outcome, ReconcileOutcome::Complete { .. }));
        assert_eq!(lookup.calls(), 0);
    }

    #[test]
    fn reports_only_the_empty_multi_select() {
        let reconciler = FieldReconciler::new(FieldSchema::default());
        let record = Record::new("page-3")
            .with_property("Name", title("Foo"))
            .with_property("Author", PropertyValue::MultiSelect(vec![]))
            .with_property("Year", filled_date("2020-01-01"));

        assert_eq!(reconciler.missing_roles(&record), vec![FieldRole::Authors]);
    }

    #[test]
    fn untracked_and_absent_fields_are_not_missing() {
        let mut schema = FieldSchema::default();
        schema.untrack(FieldRole::Abstract);
        let reconciler = FieldReconciler::new(schema);
        let record = Record::new("page-4")
            .with_property("Name", title("Foo"))
            .with_property("Abstract", PropertyValue::RichText(vec![]));

        assert!(reconciler.missing_roles(&record).is_empty());
    }

    #[tokio::test]
    async fn blank_or_wrongly_typed_title_skips_record() {
        let reconciler = FieldReconciler::new(FieldSchema::default());
        let lookup = FixedLookup::new(Some(foo_bar_metadata()));

        let blank = Record::new("a")
            .with_property("Name", PropertyValue::Title(vec!["  ".to_string(), "\n".to_string()]))
            .with_property("Author", PropertyValue::MultiSelect(vec![]));
        let wrong_kind = Record::new("b")
            .with_property("Name", PropertyValue::MultiSelect(vec!["Foo".to_string()]))
            .with_property("Author", PropertyValue::MultiSelect(vec![]));
        let no_title = Record::new("c").with_property("Author", PropertyValue::MultiSelect(vec![]));

        for record in [blank, wrong_kind, no_title] {
            assert_eq!(reconciler.reconcile(&record, &lookup).await, ReconcileOutcome::Untitled);
        }
        assert_eq!(lookup.calls(), 0);
    }

    #[test]
    fn title_segments_are_concatenated_and_trimmed() {
        let reconciler = FieldReconciler::new(FieldSchema::default());
        let record = Record::new("d").with_property(
            "Name",
            PropertyValue::Title(vec![" Deep ".to_string(), "Learning ".to_string()]),
        );

        assert_eq!(reconciler.extract_title(&record).as_deref(), Some("Deep Learning"));
    }

    #[tokio::test]
    async fn lookup_miss_is_not_found() {
        let (reconciler, record) = foo_bar_setup();
        let lookup = FixedLookup::new(None);

        let outcome = reconciler.reconcile(&record, &lookup).await;

        assert_eq!(outcome, ReconcileOutcome::NotFound { title: "Foo Bar".to_string() });
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn metadata_without_matching_values_is_nothing_usable() {
        let reconciler = FieldReconciler::new(FieldSchema::default());
        let record = Record::new("e")
            .with_property("Name", title("Foo"))
            .with_property("Venue", PropertyValue::RichText(vec![]))
            .with_property("Year", PropertyValue::Unsupported("number".to_string()));
        let lookup = FixedLookup::new(Some(PaperMetadata {
            year: Some(2020),
            publication_date: Some("2020-01-01".to_string()),
            ..PaperMetadata::new("Foo")
        }));

        let outcome = reconciler.reconcile(&record, &lookup).await;

        assert_eq!(outcome, ReconcileOutcome::NothingUsable { title: "Foo".to_string() });
    }

    #[test]
    fn existing_values_are_never_overwritten() {
        let reconciler = FieldReconciler::new(FieldSchema::default());
        let record = Record::new("f")
            .with_property("Name", title("Foo Bar"))
            .with_property("Author", PropertyValue::MultiSelect(vec!["Someone Else".to_string()]))
            .with_property("Venue", PropertyValue::RichText(vec![]));

        let payload = reconciler.build_update(&record, &foo_bar_metadata());

        assert_eq!(payload.field_names(), vec!["Venue"]);
    }
}
