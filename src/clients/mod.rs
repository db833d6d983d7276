use anyhow::{Error, Result};
use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::{
    error::DeliveryError,
    models::{invoice::InvoiceCandidate, query::InvoiceQuery, reminder::ReminderMessage},
};

pub mod database;
pub mod mail;
pub mod redis;
pub mod template;

pub type CandidateStream = BoxStream<'static, Result<InvoiceCandidate, Error>>;

/// Bulk enumeration of query results. Implementations stream rather than page
/// so that no per-call result limit applies.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn enumerate(&self, query: &InvoiceQuery) -> Result<CandidateStream, Error>;
}

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, message: &ReminderMessage) -> Result<(), DeliveryError>;
}

/// Persisted "already notified" markers keyed by invoice and threshold.
#[async_trait]
pub trait NotificationLedger: Send + Sync {
    async fn already_notified(&self, invoice_id: i64, days_past_due: u32) -> Result<bool, Error>;

    async fn mark_notified(&self, invoice_id: i64, days_past_due: u32) -> Result<(), Error>;
}
