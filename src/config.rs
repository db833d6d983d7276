use anyhow::{Error, Result, anyhow};
use chrono::{Local, NaiveDate};
use dotenvy::dotenv;
use serde::Deserialize;

const ENV_PREFIX: &str = "DUNNING_";

fn default_company_name() -> String {
    "Taco, Inc.".to_string()
}

fn default_subsidiary_id() -> i64 {
    37
}

fn default_worker_concurrency() -> usize {
    4
}

fn default_http_timeout_seconds() -> u64 {
    10
}

fn default_notified_ttl_seconds() -> u64 {
    90 * 24 * 60 * 60
}

/// `name` or `schema.name`, each part an unquoted SQL identifier.
fn is_relation_name(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();

    parts.len() <= 2
        && parts.iter().all(|part| {
            part.chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    pub days_past_due: u32,
    pub author_id: i64,
    pub reply_to: String,
    #[serde(default)]
    pub cc_list: Option<String>,

    #[serde(default = "default_company_name")]
    pub company_name: String,
    #[serde(default = "default_subsidiary_id")]
    pub subsidiary_id: i64,
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    /// Database view that selects the invoices instead of the built-in criteria.
    #[serde(default)]
    pub saved_view: Option<String>,

    pub database_url: String,

    pub mail_gateway_url: String,
    #[serde(default)]
    pub mail_gateway_token: Option<String>,
    #[serde(default = "default_http_timeout_seconds")]
    pub http_timeout_seconds: u64,

    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub template_service_url: Option<String>,

    #[serde(default)]
    pub suppress_duplicates: bool,
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_notified_ttl_seconds")]
    pub notified_ttl_seconds: u64,

    #[serde(default = "default_worker_concurrency")]
    pub worker_concurrency: usize,

    #[serde(default)]
    pub log_json: bool,
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        dotenv().ok();

        let config = envy::prefixed(ENV_PREFIX)
            .from_env::<Self>()
            .map_err(|e| anyhow!("Invalid or missing environmental variable: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::prefixed(ENV_PREFIX)
            .from_iter::<_, Self>(vars)
            .map_err(|e| anyhow!("Invalid or missing environmental variable: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.worker_concurrency == 0 {
            return Err(anyhow!("DUNNING_WORKER_CONCURRENCY must be at least 1"));
        }

        if self.http_timeout_seconds == 0 {
            return Err(anyhow!("DUNNING_HTTP_TIMEOUT_SECONDS must be at least 1"));
        }

        if let Some(view) = &self.saved_view {
            if !is_relation_name(view) {
                return Err(anyhow!(
                    "DUNNING_SAVED_VIEW must be a plain or schema-qualified view name, got {:?}",
                    view
                ));
            }
        }

        if self.template_id.is_some() && self.template_service_url.is_none() {
            return Err(anyhow!(
                "DUNNING_TEMPLATE_SERVICE_URL is required when DUNNING_TEMPLATE_ID is set"
            ));
        }

        if self.suppress_duplicates && self.redis_url.is_none() {
            return Err(anyhow!(
                "DUNNING_REDIS_URL is required when DUNNING_SUPPRESS_DUPLICATES is enabled"
            ));
        }

        Ok(())
    }

    /// The date days past due are counted from.
    pub fn as_of_date(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Local::now().date_naive())
    }

    /// CC addresses configured for every reminder; empty when none is set.
    pub fn cc_addresses(&self) -> Vec<String> {
        self.cc_list
            .iter()
            .flat_map(|list| list.split(','))
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
            .map(str::to_string)
            .collect()
    }
}
