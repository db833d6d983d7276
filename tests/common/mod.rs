#![allow(dead_code)]

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    io,
    sync::{Arc, Mutex},
};

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use dunning_service::{
    clients::{CandidateStream, Messenger, NotificationLedger, RecordStore},
    config::Config,
    error::DeliveryError,
    models::{
        invoice::{InvoiceCandidate, TransactionRecord},
        query::{InvoiceQuery, OPEN_INVOICE_STATUS},
        reminder::ReminderMessage,
    },
};
use futures_util::{StreamExt, stream};
use serde_json::Value;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn today() -> NaiveDate {
    date("2026-10-18")
}

pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut vars: BTreeMap<String, String> = [
        ("DUNNING_DAYS_PAST_DUE", "30"),
        ("DUNNING_AUTHOR_ID", "7"),
        ("DUNNING_REPLY_TO", "ar@taco.example"),
        ("DUNNING_CC_LIST", "collections@taco.example"),
        ("DUNNING_DATABASE_URL", "postgres://localhost/erp"),
        ("DUNNING_MAIL_GATEWAY_URL", "http://localhost:9"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }

    Config::from_vars(vars).unwrap()
}

/// An open mainline invoice of subsidiary 37, due `days_overdue` days before [`today`].
pub fn open_invoice(id: i64, customer: i64, doc: &str, days_overdue: i64) -> TransactionRecord {
    TransactionRecord {
        id,
        entity_id: customer,
        tran_id: doc.to_string(),
        tran_date: today() - chrono::Duration::days(days_overdue + 30),
        due_date: today() - chrono::Duration::days(days_overdue),
        subsidiary_id: 37,
        mainline: true,
        status: OPEN_INVOICE_STATUS.to_string(),
        entity_email: None,
    }
}

/// Evaluates queries in memory; `broken` rows surface as read errors.
#[derive(Default)]
pub struct MemoryRecordStore {
    pub records: Vec<TransactionRecord>,
    pub broken: usize,
    pub queries: Mutex<Vec<InvoiceQuery>>,
}

impl MemoryRecordStore {
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn enumerate(&self, query: &InvoiceQuery) -> Result<CandidateStream, Error> {
        self.queries.lock().unwrap().push(query.clone());

        let mut rows: Vec<Result<InvoiceCandidate, Error>> = query
            .apply(&self.records)
            .into_iter()
            .map(|record| Ok(InvoiceCandidate::from(record)))
            .collect();
        for _ in 0..self.broken {
            rows.push(Err(anyhow!("column \"tran_id\" is null")));
        }

        Ok(stream::iter(rows).boxed())
    }
}

pub struct FailingRecordStore;

#[async_trait]
impl RecordStore for FailingRecordStore {
    async fn enumerate(&self, _query: &InvoiceQuery) -> Result<CandidateStream, Error> {
        Err(anyhow!("relation \"transactions\" does not exist"))
    }
}

#[derive(Debug, Clone)]
pub enum Failure {
    Platform(&'static str, &'static str),
    Unexpected(&'static str),
}

#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<ReminderMessage>>,
    pub failures: HashMap<i64, Failure>,
}

impl RecordingMessenger {
    pub fn failing(invoice_id: i64, failure: Failure) -> Self {
        Self {
            failures: HashMap::from([(invoice_id, failure)]),
            ..Default::default()
        }
    }

    pub fn messages(&self) -> Vec<ReminderMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, message: &ReminderMessage) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(message.clone());

        match self.failures.get(&message.related_records.transaction_id) {
            None => Ok(()),
            Some(Failure::Platform(code, details)) => Err(DeliveryError::platform(*code, *details)),
            Some(Failure::Unexpected(msg)) => Err(DeliveryError::Unexpected(msg.to_string())),
        }
    }
}

#[derive(Default)]
pub struct MemoryLedger {
    pub marked: Mutex<HashSet<(i64, u32)>>,
}

#[async_trait]
impl NotificationLedger for MemoryLedger {
    async fn already_notified(&self, invoice_id: i64, days_past_due: u32) -> Result<bool, Error> {
        Ok(self.marked.lock().unwrap().contains(&(invoice_id, days_past_due)))
    }

    async fn mark_notified(&self, invoice_id: i64, days_past_due: u32) -> Result<(), Error> {
        self.marked.lock().unwrap().insert((invoice_id, days_past_due));
        Ok(())
    }
}

/// Collects JSON log lines emitted on the current thread while installed.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

pub struct CaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

impl LogCapture {
    pub fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(self.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn events(&self) -> Vec<Value> {
        let buffer = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buffer)
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    /// Field maps of every event whose message equals `message`.
    pub fn with_message(&self, message: &str) -> Vec<Value> {
        self.events()
            .into_iter()
            .filter(|event| event["fields"]["message"] == message)
            .map(|event| event["fields"].clone())
            .collect()
    }
}
