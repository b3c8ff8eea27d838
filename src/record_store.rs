use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::errors::{AppError, ServiceError};
use crate::models::LeadType;

/// Lead record written to the CRM. Optional fields are omitted when empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LeadRecord {
    pub reference_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    pub marketing_consent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// A record the CRM accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRecord {
    pub id: String,
}

/// Persistent store for leads.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create_record(
        &self,
        lead_type: LeadType,
        record: &LeadRecord,
    ) -> Result<CreatedRecord, ServiceError>;
}

/// CRM client speaking JSON:API (`POST {base_url}/leads`).
#[derive(Clone)]
pub struct CrmClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl CrmClient {
    /// Creates a new `CrmClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the CRM API.
    /// * `token` - The API token for authentication.
    pub fn new(base_url: String, token: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create CRM client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }
}

/// Pull the record id out of the CRM response.
///
/// Accepts `data.id`, `id` or `record_id`, as string or number.
pub fn extract_record_id(response: &Value) -> Option<String> {
    let candidates = [
        response.get("data").and_then(|d| d.get("id")),
        response.get("id"),
        response.get("record_id"),
    ];

    candidates.into_iter().flatten().find_map(|id| match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Top-level keys of a CRM body, or its JSON kind. Values can echo submitter data.
fn response_shape(response: &Value) -> Vec<String> {
    match response {
        Value::Object(map) => map.keys().cloned().collect(),
        Value::Array(_) => vec!["<array>".to_string()],
        Value::String(_) => vec!["<string>".to_string()],
        Value::Number(_) => vec!["<number>".to_string()],
        Value::Bool(_) => vec!["<bool>".to_string()],
        Value::Null => vec!["<null>".to_string()],
    }
}

#[async_trait]
impl RecordStore for CrmClient {
    async fn create_record(
        &self,
        lead_type: LeadType,
        record: &LeadRecord,
    ) -> Result<CreatedRecord, ServiceError> {
        let url = format!("{}/leads", self.base_url);
        tracing::info!(
            "Creating {} record in CRM: {}",
            lead_type,
            record.reference_id
        );

        let mut attributes = serde_json::to_value(record).map_err(|e| {
            ServiceError::Other(format!("Failed to serialize lead record: {}", e))
        })?;
        attributes["lead_type"] = json!(lead_type.as_str());
        attributes["source"] = json!("website");

        // JSON:API envelope
        let body = json!({
            "data": {
                "type": "lead",
                "attributes": attributes
            }
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ServiceError::Http {
                status: status.as_u16(),
                message: format!("CRM record creation failed: {}", error_text),
            });
        }

        let response_data: Value = response.json().await.map_err(|e| {
            ServiceError::InvalidResponse(format!("Failed to parse CRM response: {}", e))
        })?;

        let id = extract_record_id(&response_data).ok_or_else(|| {
            tracing::warn!(
                "Unexpected CRM response format, top-level keys: {:?}",
                response_shape(&response_data)
            );
            ServiceError::InvalidResponse("CRM response missing 'id' field".to_string())
        })?;

        tracing::info!("✓ CRM record created: {}", id);
        Ok(CreatedRecord { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = CrmClient::new("https://crm.example.com".to_string(), "token".to_string());
        assert!(client.is_ok());
    }

    #[test]
    fn test_extract_record_id_locations() {
        assert_eq!(
            extract_record_id(&json!({"data": {"id": "rec1"}})),
            Some("rec1".to_string())
        );
        assert_eq!(extract_record_id(&json!({"id": 42})), Some("42".to_string()));
        assert_eq!(
            extract_record_id(&json!({"record_id": "rec9"})),
            Some("rec9".to_string())
        );
        assert_eq!(extract_record_id(&json!({"data": {"id": ""}})), None);
        assert_eq!(extract_record_id(&json!({"ok": true})), None);
    }

    #[test]
    fn test_record_omits_empty_optionals() {
        let record = LeadRecord {
            reference_id: "NEW-1-2".into(),
            email: "a@b.com".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["email"], "a@b.com");
        assert!(json.get("first_name").is_none());
        assert_eq!(json["marketing_consent"], false);
        assert!(json.get("submitted_at").is_none());
    }

    #[test]
    fn test_response_shape_hides_values() {
        let shape = response_shape(&json!({"email": "john@example.com", "ok": true}));
        assert_eq!(shape, vec!["email".to_string(), "ok".to_string()]);
        assert!(!shape.iter().any(|k| k.contains("john")));
        assert_eq!(response_shape(&json!([1, 2])), vec!["<array>".to_string()]);
    }
}
