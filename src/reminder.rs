use std::collections::HashMap;

use anyhow::{Error, Result};
use tracing::info;

use crate::{
    clients::template::{TemplateServiceClient, render_template},
    config::Config,
    models::{
        invoice::ReminderTarget,
        reminder::{RelatedRecords, ReminderMessage},
        template::{Template, TemplateContent},
    },
};

/// Where a reminder's subject and body come from.
#[derive(Debug, Clone)]
pub enum ReminderContent {
    Builtin,
    Template(Template),
}

impl ReminderContent {
    /// Fetches the configured template once per run, or falls back to the built-in text.
    pub async fn from_config(config: &Config) -> Result<Self, Error> {
        let (Some(template_id), Some(service_url)) =
            (&config.template_id, &config.template_service_url)
        else {
            return Ok(ReminderContent::Builtin);
        };

        let client = TemplateServiceClient::new(service_url, config.http_timeout_seconds)?;
        let template = client.fetch_template(template_id).await?;

        info!(template_id = %template.id, template_name = %template.name, "Using email template");

        Ok(ReminderContent::Template(template))
    }

    pub fn render(&self, target: &ReminderTarget, config: &Config) -> Result<TemplateContent, Error> {
        match self {
            ReminderContent::Builtin => Ok(TemplateContent {
                subject: format!("{} Invoice Due Reminder", config.company_name),
                body: format!(
                    "<html><p>This is a reminder that invoice #{} is {} days past due.</p>\
                     <p>Accounts Receivable<br />{}</p></html>",
                    target.document_number, config.days_past_due, config.company_name
                ),
            }),
            ReminderContent::Template(template) => {
                let variables = HashMap::from([
                    ("document_number".to_string(), target.document_number.clone()),
                    ("days_past_due".to_string(), config.days_past_due.to_string()),
                    ("company_name".to_string(), config.company_name.clone()),
                    ("invoice_id".to_string(), target.invoice_id.to_string()),
                    ("customer_id".to_string(), target.customer_id.to_string()),
                ]);
                render_template(template, &variables)
            }
        }
    }
}

/// Configured CC addresses minus the customer's own address and repeats.
pub fn cc_addresses(target: &ReminderTarget, config: &Config) -> Vec<String> {
    let mut cc: Vec<String> = Vec::new();

    for address in config.cc_addresses() {
        let is_customer = target
            .customer_email
            .as_deref()
            .is_some_and(|email| email.trim().eq_ignore_ascii_case(&address));
        let is_repeat = cc.iter().any(|c| c.eq_ignore_ascii_case(&address));

        if !is_customer && !is_repeat {
            cc.push(address);
        }
    }

    cc
}

pub fn build_message(
    target: &ReminderTarget,
    config: &Config,
    content: &ReminderContent,
) -> Result<ReminderMessage, Error> {
    let rendered = content.render(target, config)?;

    Ok(ReminderMessage {
        author: config.author_id,
        recipients: vec![target.customer_id],
        reply_to: config.reply_to.clone(),
        cc: cc_addresses(target, config),
        subject: rendered.subject,
        body: rendered.body,
        related_records: RelatedRecords {
            entity_id: target.customer_id,
            transaction_id: target.invoice_id,
        },
    })
}
