use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::time::Duration;

use crate::errors::{AppError, ServiceError};
use crate::models::ContactSubject;

/// Sales-inbox notification for a contact form submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactNotification {
    pub reference_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: Option<String>,
    pub subject: ContactSubject,
    pub message: String,
    pub marketing_consent: bool,
    pub submitted_at: DateTime<Utc>,
}

/// Sales-inbox notification for a product inquiry.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInquiryNotification {
    pub reference_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: Option<String>,
    pub product_slug: String,
    pub product_name: String,
    pub quantity: String,
    pub requirements: Option<String>,
    pub marketing_consent: bool,
}

/// Acknowledgement sent back to the person who submitted the contact form.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationNotification {
    pub reference_id: String,
    pub first_name: String,
    pub email: String,
    pub subject: ContactSubject,
}

/// Structured message handed to the notification channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Contact(ContactNotification),
    ProductInquiry(ProductInquiryNotification),
    Confirmation(ConfirmationNotification),
}

impl Notification {
    pub fn reference_id(&self) -> &str {
        match self {
            Notification::Contact(n) => &n.reference_id,
            Notification::ProductInquiry(n) => &n.reference_id,
            Notification::Confirmation(n) => &n.reference_id,
        }
    }

    pub fn subject_line(&self) -> String {
        match self {
            Notification::Contact(n) => format!(
                "[{}] {} from {} {}",
                n.reference_id,
                n.subject.label(),
                n.first_name,
                n.last_name
            )
            .trim_end()
            .to_string(),
            Notification::ProductInquiry(n) => format!(
                "[{}] Product inquiry: {} ({})",
                n.reference_id, n.product_name, n.quantity
            ),
            Notification::Confirmation(n) => {
                format!("We received your message ({})", n.reference_id)
            }
        }
    }

    /// Plain-text body.
    pub fn body(&self) -> String {
        match self {
            Notification::Contact(n) => {
                let mut body = String::new();
                body.push_str(&format!("Name: {} {}\n", n.first_name, n.last_name));
                body.push_str(&format!("Email: {}\n", n.email));
                if let Some(company) = &n.company {
                    body.push_str(&format!("Company: {}\n", company));
                }
                body.push_str(&format!("Subject: {}\n", n.subject.label()));
                body.push_str(&format!(
                    "Marketing consent: {}\n",
                    if n.marketing_consent { "yes" } else { "no" }
                ));
                body.push_str(&format!("Submitted at: {}\n", n.submitted_at.to_rfc3339()));
                body.push_str(&format!("Reference: {}\n\n", n.reference_id));
                body.push_str(&n.message);
                body
            }
            Notification::ProductInquiry(n) => {
                let mut body = String::new();
                body.push_str(&format!("Name: {} {}\n", n.first_name, n.last_name));
                body.push_str(&format!("Email: {}\n", n.email));
                if let Some(company) = &n.company {
                    body.push_str(&format!("Company: {}\n", company));
                }
                body.push_str(&format!("Product: {} ({})\n", n.product_name, n.product_slug));
                body.push_str(&format!("Quantity: {}\n", n.quantity));
                if let Some(requirements) = &n.requirements {
                    body.push_str(&format!("Requirements: {}\n", requirements));
                }
                body.push_str(&format!(
                    "Marketing consent: {}\n",
                    if n.marketing_consent { "yes" } else { "no" }
                ));
                body.push_str(&format!("Reference: {}\n", n.reference_id));
                body
            }
            Notification::Confirmation(n) => format!(
                "Hi {},\n\nThanks for reaching out about \"{}\". Our team will get back to you shortly.\n\nYour reference number is {}.\n",
                if n.first_name.is_empty() { "there" } else { n.first_name.as_str() },
                n.subject.label(),
                n.reference_id
            ),
        }
    }

    /// Address replies should go to, if any.
    fn reply_to(&self) -> Option<&str> {
        match self {
            Notification::Contact(n) => Some(&n.email),
            Notification::ProductInquiry(n) => Some(&n.email),
            Notification::Confirmation(_) => None,
        }
    }
}

/// Outbound channel for human-facing messages. Returns the provider's message id.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<String, ServiceError>;
}

/// Email provider client (`POST {base_url}/emails`, bearer auth).
#[derive(Clone)]
pub struct EmailClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    from: String,
    sales_inbox: String,
}

impl EmailClient {
    /// Creates a new `EmailClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the email provider API.
    /// * `api_key` - Bearer token.
    /// * `from` - Sender address.
    /// * `sales_inbox` - Recipient for contact and product inquiry notifications.
    pub fn new(
        base_url: String,
        api_key: String,
        from: String,
        sales_inbox: String,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create email client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            from,
            sales_inbox,
        })
    }

    fn recipient<'a>(&'a self, notification: &'a Notification) -> &'a str {
        match notification {
            Notification::Confirmation(n) => &n.email,
            Notification::Contact(_) | Notification::ProductInquiry(_) => &self.sales_inbox,
        }
    }
}

#[async_trait]
impl NotificationChannel for EmailClient {
    async fn send(&self, notification: &Notification) -> Result<String, ServiceError> {
        let url = format!("{}/emails", self.base_url);
        tracing::debug!("Sending email for {}", notification.reference_id());

        let mut body = json!({
            "from": self.from,
            "to": [self.recipient(notification)],
            "subject": notification.subject_line(),
            "text": notification.body(),
            "headers": { "X-Reference-Id": notification.reference_id() },
        });
        if let Some(reply_to) = notification.reply_to() {
            body["reply_to"] = json!(reply_to);
        }

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
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
                message: error_text,
            });
        }

        let data: Value = response.json().await.map_err(|e| {
            ServiceError::InvalidResponse(format!("Failed to parse email response: {}", e))
        })?;

        let message_id = data
            .get("id")
            .and_then(|id| id.as_str())
            .ok_or_else(|| {
                ServiceError::InvalidResponse("Email response missing 'id' field".to_string())
            })?
            .to_string();

        tracing::info!(
            "✓ Email sent for {}: {}",
            notification.reference_id(),
            message_id
        );
        Ok(message_id)
    }
}
