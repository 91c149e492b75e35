use std::sync::Arc;

use crate::contract::{inject_key, Envelope, Record, RecordKey};
use crate::error::StoreError;
use crate::table::{ContinuationToken, TableService};

/// Data-access client over one table. Holds the remote handle and the table
/// name; carries no mutable state, so one instance can serve concurrent
/// requests behind an `Arc`.
#[derive(Clone)]
pub struct RecordStoreClient {
    table_name: String,
    service: Arc<dyn TableService>,
}

impl std::fmt::Debug for RecordStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStoreClient")
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl RecordStoreClient {
    pub fn new(table_name: impl Into<String>, service: Arc<dyn TableService>) -> Self {
        Self {
            table_name: table_name.into(),
            service,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Point read keyed by `(pk=id, sk=id)`. Valid only when an item came back.
    pub async fn fetch_one(&self, id: &str) -> Result<Envelope<Record>, StoreError> {
        let key = RecordKey::for_id(id);
        let item = self.service.get_item(&self.table_name, &key).await?;
        let found = item.is_some();

        tracing::debug!(
            component = "record_store_client",
            event = "fetch_one",
            table = %self.table_name,
            id,
            found
        );

        Ok(Envelope::new(found, item))
    }

    /// Unconditional full-replace upsert. `pk` and `sk` are forced to `id`
    /// before the write, overriding anything the caller supplied.
    pub async fn put_one(&self, id: &str, payload: Record) -> Result<Envelope<Record>, StoreError> {
        let item = inject_key(payload, id);
        self.service
            .put_item(&self.table_name, item.clone())
            .await?;

        tracing::debug!(
            component = "record_store_client",
            event = "put_one",
            table = %self.table_name,
            id,
            fields = item.len()
        );

        let valid = !item.is_empty();
        Ok(Envelope::new(valid, Some(item)))
    }

    /// Sweeps the whole table page by page. Each page is requested only after
    /// the previous page's continuation token is known; the sweep ends on the
    /// first page without one.
    pub async fn scan_all(&self) -> Result<Envelope<Vec<Record>>, StoreError> {
        let mut records: Vec<Record> = Vec::new();
        let mut continuation: Option<ContinuationToken> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .service
                .scan_page(&self.table_name, continuation.take())
                .await?;
            pages += 1;
            records.extend(page.items);

            match page.continuation {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        tracing::debug!(
            component = "record_store_client",
            event = "scan_all",
            table = %self.table_name,
            pages,
            items = records.len()
        );

        Ok(Envelope::valid(records))
    }
}
