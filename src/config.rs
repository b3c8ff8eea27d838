use serde::Deserialize;
use std::time::Duration;

use crate::pipeline::PipelineOptions;
use crate::timeout::DOWNSTREAM_TIMEOUT;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub email_api_url: String,
    pub email_api_key: String,
    pub email_from: String,
    pub email_to: String,
    pub crm_base_url: String,
    pub crm_token: String,
    pub downstream_timeout_ms: u64,
    pub send_confirmation_email: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup (environment, test maps).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> anyhow::Result<String> {
            let value = lookup(key)
                .ok_or_else(|| anyhow::anyhow!("{} environment variable required", key))?;
            if value.trim().is_empty() {
                anyhow::bail!("{} cannot be empty", key);
            }
            Ok(value.trim().to_string())
        };
        let required_url = |key: &str| -> anyhow::Result<String> {
            let value = required(key)?;
            let parsed = url::Url::parse(&value)
                .map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", key, e))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                anyhow::bail!("{} must start with http:// or https://", key);
            }
            Ok(value)
        };

        let config = Self {
            port: lookup("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            email_api_url: required_url("EMAIL_API_URL")?,
            email_api_key: required("EMAIL_API_KEY")?,
            email_from: required("EMAIL_FROM")?,
            email_to: required("EMAIL_TO")?,
            crm_base_url: required_url("CRM_BASE_URL")?,
            crm_token: required("CRM_TOKEN")?,
            downstream_timeout_ms: match lookup("DOWNSTREAM_TIMEOUT_MS") {
                Some(ms) => ms.trim().parse().map_err(|_| {
                    anyhow::anyhow!("DOWNSTREAM_TIMEOUT_MS must be a number of milliseconds")
                })?,
                None => DOWNSTREAM_TIMEOUT.as_millis() as u64,
            },
            send_confirmation_email: match lookup("SEND_CONFIRMATION_EMAIL") {
                Some(flag) => parse_flag(&flag).ok_or_else(|| {
                    anyhow::anyhow!("SEND_CONFIRMATION_EMAIL must be true or false")
                })?,
                None => true,
            },
        };

        if config.downstream_timeout_ms == 0 {
            anyhow::bail!("DOWNSTREAM_TIMEOUT_MS must be greater than zero");
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Email API URL: {}", config.email_api_url);
        tracing::debug!("CRM Base URL: {}", config.crm_base_url);
        tracing::debug!("Downstream timeout: {}ms", config.downstream_timeout_ms);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            downstream_timeout: Duration::from_millis(self.downstream_timeout_ms),
            send_confirmation: self.send_confirmation_email,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
