mod common;

use anyhow::Result;
use common::test_config;
use dunning_service::{
    clients::{NotificationLedger, redis::RedisClient},
    config::Config,
};
use redis::AsyncCommands;

fn redis_config() -> Config {
    let url = std::env::var("DUNNING_REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".into());
    test_config(&[
        ("DUNNING_SUPPRESS_DUPLICATES", "true"),
        ("DUNNING_REDIS_URL", url.as_str()),
    ])
}

async fn cleanup_marker(config: &Config, invoice_id: i64, days_past_due: u32) -> Result<()> {
    let client = redis::Client::open(config.redis_url.as_deref().unwrap_or_default())?;
    let mut conn = client.get_multiplexed_async_connection().await?;
    conn.del::<_, ()>(RedisClient::marker_key(invoice_id, days_past_due))
        .await?;
    Ok(())
}

/// Test: Markers are set per invoice and threshold
#[tokio::test]
#[ignore = "requires a running Redis"]
async fn test_marker_round_trip() -> Result<()> {
    let config = redis_config();
    let ledger = RedisClient::connect(&config).await?;
    let invoice_id = i64::from(uuid::Uuid::new_v4().as_fields().0);

    assert!(!ledger.already_notified(invoice_id, 30).await?);

    ledger.mark_notified(invoice_id, 30).await?;

    assert!(ledger.already_notified(invoice_id, 30).await?);
    assert!(!ledger.already_notified(invoice_id, 45).await?);

    cleanup_marker(&config, invoice_id, 30).await?;
    assert!(!ledger.already_notified(invoice_id, 30).await?);

    Ok(())
}
