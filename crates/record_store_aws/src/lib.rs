//! AWS-oriented adapters and front ends for the record store.
//!
//! This crate owns runtime integration details: the DynamoDB table adapter,
//! the persistent HTTP front end and the single-shot Lambda front end. Both
//! front ends drive the same `record_store_core::RecordStoreClient`.

pub mod adapters;
pub mod handlers;
pub mod logging;
