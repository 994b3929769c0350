//! papersync core: record model, field reconciliation, sync loop, config.

pub mod citation;
pub mod config;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod sync;
pub mod values;

pub use citation::format_citation;
pub use config::{AppConfig, NotionConfig, NotionCredentials, SemanticScholarConfig};
pub use error::{ExitCode, Result, SyncError};
pub use models::*;
pub use reconcile::{FieldReconciler, ReconcileOutcome};
pub use sync::{
    MetadataLookup, PlannedUpdate, RecordPage, RecordPager, RecordSink, RecordSource, SyncReport,
    SyncRunner,
};
pub use values::{FieldInput, build_property_value};
