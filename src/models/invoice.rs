use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A row in the record store, as the query filters see it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: i64,
    pub entity_id: i64,
    pub tran_id: String,
    pub tran_date: NaiveDate,
    pub due_date: NaiveDate,
    pub subsidiary_id: i64,
    pub mainline: bool,
    pub status: String,

    #[serde(default)]
    pub entity_email: Option<String>,
}

/// An open invoice selected for a reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceCandidate {
    pub invoice_id: i64,
    pub customer_id: i64,
    pub document_number: String,
    pub transaction_date: NaiveDate,
    pub due_date: NaiveDate,

    #[serde(default)]
    pub customer_email: Option<String>,
}

impl From<&TransactionRecord> for InvoiceCandidate {
    fn from(record: &TransactionRecord) -> Self {
        Self {
            invoice_id: record.id,
            customer_id: record.entity_id,
            document_number: record.tran_id.clone(),
            transaction_date: record.tran_date,
            due_date: record.due_date,
            customer_email: record.entity_email.clone(),
        }
    }
}

/// What the dispatcher needs to know about one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderTarget {
    pub invoice_id: i64,
    pub customer_id: i64,
    pub document_number: String,
    pub customer_email: Option<String>,
}
