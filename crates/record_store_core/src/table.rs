use async_trait::async_trait;

use crate::contract::{Record, RecordKey};
use crate::error::StoreError;

/// Opaque scan cursor handed back by a table service. Only the service that
/// produced it knows what it holds; callers pass it to the next page request.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuationToken(Record);

impl ContinuationToken {
    pub fn new(position: Record) -> Self {
        Self(position)
    }

    pub fn into_inner(self) -> Record {
        self.0
    }

    pub fn position(&self) -> &Record {
        &self.0
    }
}

/// One bounded page of a full-table scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPage {
    pub items: Vec<Record>,
    pub continuation: Option<ContinuationToken>,
}

/// Remote partitioned-table boundary: point read, full-replace write and
/// paginated scan. Every call is a single round trip with no retry.
#[async_trait]
pub trait TableService: Send + Sync {
    async fn get_item(&self, table: &str, key: &RecordKey) -> Result<Option<Record>, StoreError>;

    async fn put_item(&self, table: &str, item: Record) -> Result<(), StoreError>;

    async fn scan_page(
        &self,
        table: &str,
        start: Option<ContinuationToken>,
    ) -> Result<ScanPage, StoreError>;
}
