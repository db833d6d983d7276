use anyhow::{Error, Result};
use dunning_service::{
    clients::{database::DatabaseClient, mail::MailGatewayClient, redis::RedisClient},
    config::Config,
    job::DunningJob,
    reminder::ReminderContent,
    telemetry::init_tracing,
};
use tracing::{Instrument, info_span};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::load()?;
    init_tracing(&config);

    let span = info_span!(
        "dunning_run",
        run_id = %Uuid::new_v4(),
        days_past_due = config.days_past_due
    );

    async {
        let database_client = DatabaseClient::connect(&config.database_url).await?;
        database_client.health_check().await?;

        let mail_client = MailGatewayClient::new(&config)?;
        let content = ReminderContent::from_config(&config).await?;

        let redis_client = if config.suppress_duplicates {
            Some(RedisClient::connect(&config).await?)
        } else {
            None
        };

        let mut job = DunningJob::new(&config, &database_client, &mail_client, &content);
        if let Some(ledger) = &redis_client {
            job = job.with_ledger(ledger);
        }

        job.run(config.as_of_date()).await?;

        Ok::<_, Error>(())
    }
    .instrument(span)
    .await
}
