use std::collections::VecDeque;

use tracing::info;

use crate::error::Result;
use crate::models::Record;
use crate::sync::RecordSource;

/// Walks every record of a [`RecordSource`], following cursors.
///
/// The next page is requested only once the current one has been drained.
pub struct RecordPager<'a, S: RecordSource + ?Sized> {
    source: &'a S,
    buffered: VecDeque<Record>,
    cursor: Option<String>,
    exhausted: bool,
    pages_fetched: usize,
}

impl<'a, S: RecordSource + ?Sized> RecordPager<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            buffered: VecDeque::new(),
            cursor: None,
            exhausted: false,
            pages_fetched: 0,
        }
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// The next record, or `None` once the last page is drained.
    pub async fn next_record(&mut self) -> Result<Option<Record>> {
        loop {
            if let Some(record) = self.buffered.pop_front() {
                return Ok(Some(record));
            }
            if self.exhausted {
                return Ok(None);
            }

            let page = self.source.query_page(self.cursor.as_deref()).await?;
            self.pages_fetched += 1;
            info!(
                page = self.pages_fetched,
                records = page.records.len(),
                has_more = page.next_cursor.is_some(),
                "fetched record page"
            );

            self.buffered.extend(page.records);
            match page.next_cursor {
                Some(cursor) => self.cursor = Some(cursor),
                None => self.exhausted = true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::sync::RecordPage;

    struct PagedSource {
        pages: Vec<RecordPage>,
        cursors_seen: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl RecordSource for PagedSource {
        async fn query_page(&self, cursor: Option<&str>) -> Result<RecordPage> {
            let mut seen = self.cursors_seen.lock().unwrap();
            seen.push(cursor.map(ToOwned::to_owned));
            Ok(self.pages[seen.len() - 1].clone())
        }
    }

    #[tokio::test]
    async fn follows_cursors_across_pages_including_empty_ones() {
        let source = PagedSource {
            pages: vec![
                RecordPage {
                    records: vec![Record::new("a"), Record::new("b")],
                    next_cursor: Some("c1".to_string()),
                },
                RecordPage {
                    records: vec![],
                    next_cursor: Some("c2".to_string()),
                },
                RecordPage {
                    records: vec![Record::new("c")],
                    next_cursor: None,
                },
            ],
            cursors_seen: Mutex::new(Vec::new()),
        };

        let mut pager = RecordPager::new(&source);
        let mut ids = Vec::new();
        while let Some(record) = pager.next_record().await.unwrap() {
            ids.push(record.id.to_string());
        }

        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(pager.pages_fetched(), 3);
        assert_eq!(
            *source.cursors_seen.lock().unwrap(),
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
        assert!(pager.next_record().await.unwrap().is_none());
        assert_eq!(pager.pages_fetched(), 3);
    }
}
