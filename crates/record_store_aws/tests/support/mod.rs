#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use record_store_core::error::StoreOperation;
use record_store_core::{ContinuationToken, Record, RecordKey, ScanPage, StoreError, TableService};
use serde_json::Value;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

pub const FAILURE_MESSAGE: &str = "connection refused by table service";

pub fn record(value: Value) -> Record {
    value
        .as_object()
        .cloned()
        .expect("test record must be an object")
}

/// Table whose every call fails, counting how often it was reached.
#[derive(Default)]
pub struct FailingTable {
    calls: AtomicUsize,
}

impl FailingTable {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail(&self, operation: StoreOperation) -> StoreError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        StoreError::backend(operation, FAILURE_MESSAGE)
    }
}

pub fn failure_text(operation: StoreOperation) -> String {
    StoreError::backend(operation, FAILURE_MESSAGE).to_string()
}

#[async_trait]
impl TableService for FailingTable {
    async fn get_item(&self, _table: &str, _key: &RecordKey) -> Result<Option<Record>, StoreError> {
        Err(self.fail(StoreOperation::GetItem))
    }

    async fn put_item(&self, _table: &str, _item: Record) -> Result<(), StoreError> {
        Err(self.fail(StoreOperation::PutItem))
    }

    async fn scan_page(
        &self,
        _table: &str,
        _start: Option<ContinuationToken>,
    ) -> Result<ScanPage, StoreError> {
        Err(self.fail(StoreOperation::Scan))
    }
}

/// Collects JSON log lines emitted while its guard is the thread's default
/// subscriber. Works with `#[tokio::test]`'s current-thread runtime.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CapturedLogs {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .expect("poisoned mutex")
            .extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl CapturedLogs {
    pub fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(self.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines(&self) -> Vec<Value> {
        let buffer = self.buffer.lock().expect("poisoned mutex");
        String::from_utf8_lossy(&buffer)
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).expect("log line should be JSON"))
            .collect()
    }

    pub fn events(&self, event: &str) -> Vec<Value> {
        self.lines()
            .into_iter()
            .filter(|line| line["fields"]["event"] == event)
            .collect()
    }

    pub fn error_count(&self) -> usize {
        self.lines()
            .iter()
            .filter(|line| line["level"] == "ERROR")
            .count()
    }
}
