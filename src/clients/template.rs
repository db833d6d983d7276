use std::{collections::HashMap, time::Duration};

use anyhow::{Error, Result, anyhow};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::models::template::{Template, TemplateContent};

pub struct TemplateServiceClient {
    http_client: Client,
    base_url: String,
}

impl TemplateServiceClient {
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self, Error> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|_| anyhow!("Failed to create HTTP client"))?;

        info!(base_url = %base_url, "Template service client initialized");

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn fetch_template(&self, template_id: &str) -> Result<Template, Error> {
        let url = format!("{}/api/v1/templates/{}", self.base_url, template_id);

        debug!(template_id, "Fetching template from service");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Template service request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Template service returned status {}", status));
        }

        response
            .json::<Template>()
            .await
            .map_err(|e| anyhow!("Failed to parse template JSON: {}", e))
    }
}

/// Fills `{{name}}` placeholders in the template's subject and body.
pub fn render_template(
    template: &Template,
    variables: &HashMap<String, String>,
) -> Result<TemplateContent, Error> {
    debug!(
        template_id = %template.id,
        variable_count = variables.len(),
        "Rendering template"
    );

    let subject = replace_variables(&template.subject, variables)?;
    let body = replace_variables(&template.body_html, variables)?;

    Ok(TemplateContent { subject, body })
}

/// Single left-to-right pass; substituted values are never rescanned.
fn replace_variables(template: &str, variables: &HashMap<String, String>) -> Result<String, Error> {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let Some(len) = rest[open + 2..].find("}}") else {
            break;
        };

        let name = &rest[open + 2..open + 2 + len];
        let Some(value) = variables.get(name.trim()) else {
            let missing_var = &rest[open..open + len + 4];

            warn!(
                missing_variable = %missing_var,
                "Template contains unreplaced variable"
            );

            return Err(anyhow!("Missing variable in template: {}", missing_var));
        };

        result.push_str(&rest[..open]);
        result.push_str(value);
        rest = &rest[open + len + 4..];
    }

    result.push_str(rest);
    Ok(result)
}
