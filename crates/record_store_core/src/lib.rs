//! Shared record store domain primitives.
//!
//! This crate owns the record model, the `{valid, data}` envelope contract and
//! the data-access client that turns a paged wide-column table into a uniform
//! record API. It intentionally excludes AWS SDK, HTTP and Lambda runtime
//! concerns; those live in `record_store_aws`.

pub mod client;
pub mod contract;
pub mod error;
pub mod memory;
pub mod settings;
pub mod table;

pub use client::RecordStoreClient;
pub use contract::{Envelope, Record, RecordKey};
pub use error::{ConfigError, StoreError, ValidationError};
pub use table::{ContinuationToken, ScanPage, TableService};
