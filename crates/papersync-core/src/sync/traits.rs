use async_trait::async_trait;

use crate::error::Result;
use crate::models::{PaperMetadata, Record, RecordId, UpdatePayload};

/// One page of records from a paginated query.
#[derive(Debug, Clone, Default)]
pub struct RecordPage {
    pub records: Vec<Record>,
    /// Cursor for the following page; `None` on the last page.
    pub next_cursor: Option<String>,
}

/// Enumerates the records of the target collection, one page at a time.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn query_page(&self, cursor: Option<&str>) -> Result<RecordPage>;
}

/// Persists field updates for a record.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn update_record(&self, id: &RecordId, payload: &UpdatePayload) -> Result<()>;
}

/// Looks up paper metadata by title.
///
/// Implementations report transport failures themselves and return `None`;
/// a failed lookup never aborts a run.
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    async fn lookup(&self, title: &str) -> Option<PaperMetadata>;
}
