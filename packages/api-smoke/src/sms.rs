//! Bulk registration of SMS message templates with the provider.

use std::env;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::SmokeError;

/// Provider endpoint and credentials, from `SMS_API_URL`, `SMS_API_TOKEN`, `SMS_SENDER`.
#[derive(Clone)]
pub struct SmsGatewayConfig {
    /// Template endpoint each template is POSTed to.
    pub api_url: String,
    pub token: String,
    pub sender: Option<String>,
}

impl std::fmt::Debug for SmsGatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsGatewayConfig")
            .field("api_url", &self.api_url)
            .field("token", &"***")
            .field("sender", &self.sender)
            .finish()
    }
}

impl SmsGatewayConfig {
    pub fn from_env() -> Result<Self, SmokeError> {
        Ok(Self {
            api_url: must_var("SMS_API_URL")?,
            token: must_var("SMS_API_TOKEN")?,
            sender: env::var("SMS_SENDER").ok().filter(|s| !s.is_empty()),
        })
    }
}

fn must_var(name: &str) -> Result<String, SmokeError> {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            SmokeError::config(format!("Required environment variable '{name}' is not set"))
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsTemplate {
    pub name: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
struct TemplatePayload<'a> {
    name: &'a str,
    body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sender: Option<&'a str>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TemplateSummary {
    pub accepted: Vec<String>,
    /// `(template name, reason)`
    pub rejected: Vec<(String, String)>,
}

impl TemplateSummary {
    pub fn all_accepted(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// POST every template; a rejected or failed template is recorded and the
/// loop moves on.
pub async fn submit_sms_templates(
    config: &SmsGatewayConfig,
    templates: &[SmsTemplate],
) -> Result<TemplateSummary, SmokeError> {
    let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
    let mut summary = TemplateSummary::default();

    for template in templates {
        let payload = TemplatePayload {
            name: &template.name,
            body: &template.body,
            sender: config.sender.as_deref(),
        };
        let result = http
            .post(&config.api_url)
            .bearer_auth(&config.token)
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                info!(sms_template = "accepted", name = %template.name);
                summary.accepted.push(template.name.clone());
            }
            Ok(response) => {
                let status = response.status();
                let detail = response.text().await.unwrap_or_default();
                warn!(sms_template = "rejected", name = %template.name, status = status.as_u16());
                summary
                    .rejected
                    .push((template.name.clone(), format!("{status}: {detail}")));
            }
            Err(e) => {
                warn!(sms_template = "failed", name = %template.name, error = %e);
                summary.rejected.push((template.name.clone(), e.to_string()));
            }
        }
    }

    Ok(summary)
}
