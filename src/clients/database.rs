use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use tokio_postgres::{Client, NoTls, Row, types::ToSql};
use tracing::{debug, error, info};

use crate::{
    clients::{CandidateStream, RecordStore},
    models::{
        invoice::InvoiceCandidate,
        query::{InvoiceQuery, SqlParam},
    },
};

pub struct DatabaseClient {
    client: Client,
}

impl DatabaseClient {
    pub async fn connect(database_url: &str) -> Result<Self, Error> {
        info!("Connecting to PostgreSQL database");

        let (client, connection) = tokio_postgres::connect(database_url, NoTls)
            .await
            .map_err(|e| anyhow!("Failed to connect to database: {}", e))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "PostgreSQL connection closed with error");
            }
        });

        info!("PostgreSQL connection established");

        Ok(Self { client })
    }

    pub async fn health_check(&self) -> Result<(), Error> {
        self.client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| anyhow!("Database health check failed: {}", e))?;

        Ok(())
    }
}

fn bind(param: &SqlParam) -> &dyn ToSql {
    match param {
        SqlParam::BigInt(v) => v,
        SqlParam::Bool(v) => v,
        SqlParam::Date(v) => v,
        SqlParam::BigIntList(v) => v,
        SqlParam::TextList(v) => v,
    }
}

fn candidate_from_row(row: &Row) -> Result<InvoiceCandidate, Error> {
    Ok(InvoiceCandidate {
        invoice_id: row.try_get("id")?,
        customer_id: row.try_get("entity_id")?,
        document_number: row.try_get("tran_id")?,
        transaction_date: row.try_get("tran_date")?,
        due_date: row.try_get("due_date")?,
        customer_email: row.try_get("entity_email")?,
    })
}

#[async_trait]
impl RecordStore for DatabaseClient {
    async fn enumerate(&self, query: &InvoiceQuery) -> Result<CandidateStream, Error> {
        let (sql, params) = query.to_sql();

        debug!(sql = %sql, param_count = params.len(), "Executing invoice query");

        let rows = self
            .client
            .query_raw(sql.as_str(), params.iter().map(bind))
            .await
            .map_err(|e| anyhow!("Invoice query failed: {}", e))?;

        let candidates = rows
            .map_err(|e| anyhow!("Failed to read invoice row: {}", e))
            .and_then(|row| async move { candidate_from_row(&row) });

        Ok(candidates.boxed())
    }
}
