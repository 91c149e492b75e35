use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::contract::{Record, RecordKey};
use crate::error::{StoreError, StoreOperation};
use crate::table::{ContinuationToken, ScanPage, TableService};

pub const DEFAULT_PAGE_SIZE: usize = 100;

type TableKey = (String, String);

/// Process-local table that pages its scans the way the remote service does:
/// each page holds at most `page_size` items and carries the last returned key
/// as its continuation token while more items remain.
///
/// Table names are namespaces; writes to one table are invisible to another.
#[derive(Debug)]
pub struct InMemoryTable {
    tables: RwLock<BTreeMap<String, BTreeMap<TableKey, Record>>>,
    page_size: usize,
    scan_calls: AtomicUsize,
}

impl Default for InMemoryTable {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl InMemoryTable {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            tables: RwLock::new(BTreeMap::new()),
            page_size: page_size.max(1),
            scan_calls: AtomicUsize::new(0),
        }
    }

    /// Number of scan pages served so far, across all tables.
    pub fn scan_calls(&self) -> usize {
        self.scan_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self, table: &str) -> Result<usize, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| poisoned(StoreOperation::Scan))?;
        Ok(tables.get(table).map(BTreeMap::len).unwrap_or(0))
    }

    pub fn is_empty(&self, table: &str) -> Result<bool, StoreError> {
        Ok(self.len(table)? == 0)
    }
}

fn poisoned(operation: StoreOperation) -> StoreError {
    StoreError::backend(operation, "in-memory table lock poisoned")
}

#[async_trait]
impl TableService for InMemoryTable {
    async fn get_item(&self, table: &str, key: &RecordKey) -> Result<Option<Record>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| poisoned(StoreOperation::GetItem))?;
        let lookup = (key.pk().to_string(), key.sk().to_string());
        Ok(tables.get(table).and_then(|rows| rows.get(&lookup)).cloned())
    }

    async fn put_item(&self, table: &str, item: Record) -> Result<(), StoreError> {
        let key = RecordKey::from_record(&item).ok_or_else(|| {
            StoreError::backend(
                StoreOperation::PutItem,
                "item is missing string key attributes pk and sk",
            )
        })?;

        let mut tables = self
            .tables
            .write()
            .map_err(|_| poisoned(StoreOperation::PutItem))?;
        tables
            .entry(table.to_string())
            .or_default()
            .insert((key.pk().to_string(), key.sk().to_string()), item);
        Ok(())
    }

    async fn scan_page(
        &self,
        table: &str,
        start: Option<ContinuationToken>,
    ) -> Result<ScanPage, StoreError> {
        self.scan_calls.fetch_add(1, Ordering::SeqCst);

        let after = match start {
            Some(token) => {
                let key = RecordKey::from_record(token.position()).ok_or_else(|| {
                    StoreError::backend(StoreOperation::Scan, "continuation token is not a table key")
                })?;
                Some((key.pk().to_string(), key.sk().to_string()))
            }
            None => None,
        };

        let tables = self
            .tables
            .read()
            .map_err(|_| poisoned(StoreOperation::Scan))?;
        let Some(rows) = tables.get(table) else {
            return Ok(ScanPage::default());
        };

        let mut remaining = rows
            .iter()
            .filter(|(key, _)| after.as_ref().map(|start| *key > start).unwrap_or(true));

        let items: Vec<Record> = remaining
            .by_ref()
            .take(self.page_size)
            .map(|(_, item)| item.clone())
            .collect();
        let has_more = remaining.next().is_some();

        let continuation = if has_more {
            items
                .last()
                .and_then(RecordKey::from_record)
                .map(|key| ContinuationToken::new(key.to_record()))
        } else {
            None
        };

        Ok(ScanPage {
            items,
            continuation,
        })
    }
}
