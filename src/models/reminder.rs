use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedRecords {
    pub entity_id: i64,
    pub transaction_id: i64,
}

/// One outbound reminder. Recipients are customer ids; the mail gateway
/// resolves them to the customer's registered address at send time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderMessage {
    pub author: i64,
    pub recipients: Vec<i64>,
    pub reply_to: String,
    pub cc: Vec<String>,
    pub subject: String,
    pub body: String,
    pub related_records: RelatedRecords,
}
