use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use tracing::info;

use crate::{clients::NotificationLedger, config::Config};

pub struct RedisClient {
    connection: MultiplexedConnection,
    notified_ttl_seconds: u64,
}

impl RedisClient {
    pub async fn connect(config: &Config) -> Result<Self, Error> {
        let redis_url = config
            .redis_url
            .as_deref()
            .ok_or_else(|| anyhow!("DUNNING_REDIS_URL is not set"))?;

        info!("Connecting to Redis");

        let client =
            Client::open(redis_url).map_err(|_| anyhow!("Failed to create redis client"))?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|_| anyhow!("Failed to connect to redis client"))?;

        info!("Redis connection established");

        Ok(Self {
            connection,
            notified_ttl_seconds: config.notified_ttl_seconds,
        })
    }

    pub fn marker_key(invoice_id: i64, days_past_due: u32) -> String {
        format!("dunning:notified:{}:{}", invoice_id, days_past_due)
    }
}

#[async_trait]
impl NotificationLedger for RedisClient {
    async fn already_notified(&self, invoice_id: i64, days_past_due: u32) -> Result<bool, Error> {
        let mut conn = self.connection.clone();

        let exists: bool = conn
            .exists(Self::marker_key(invoice_id, days_past_due))
            .await
            .map_err(|e| anyhow!("Failed to read notified marker: {}", e))?;

        Ok(exists)
    }

    async fn mark_notified(&self, invoice_id: i64, days_past_due: u32) -> Result<(), Error> {
        let mut conn = self.connection.clone();

        conn.set_ex::<_, _, ()>(
            Self::marker_key(invoice_id, days_past_due),
            chrono::Utc::now().to_rfc3339(),
            self.notified_ttl_seconds,
        )
        .await
        .map_err(|e| anyhow!("Failed to write notified marker: {}", e))?;

        Ok(())
    }
}
