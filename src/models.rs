use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ServiceError;
use crate::metrics::ErrorCategory;

/// Error code returned when the submission does not match any lead schema.
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";

/// Error code returned when no downstream collaborator accepted the lead.
pub const PROCESSING_FAILED: &str = "PROCESSING_FAILED";

/// Discriminant of the lead union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadType {
    Contact,
    Product,
    Newsletter,
}

impl LeadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadType::Contact => "contact",
            LeadType::Product => "product",
            LeadType::Newsletter => "newsletter",
        }
    }

    /// Whether this lead type ever calls the notification channel.
    pub fn sends_notification(&self) -> bool {
        match self {
            LeadType::Contact | LeadType::Product => true,
            LeadType::Newsletter => false,
        }
    }
}

impl fmt::Display for LeadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of contact form subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactSubject {
    ProductInquiry,
    Distributor,
    Ecommerce,
    Partnership,
    Other,
}

impl ContactSubject {
    pub const ALL: [ContactSubject; 5] = [
        ContactSubject::ProductInquiry,
        ContactSubject::Distributor,
        ContactSubject::Ecommerce,
        ContactSubject::Partnership,
        ContactSubject::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactSubject::ProductInquiry => "product_inquiry",
            ContactSubject::Distributor => "distributor",
            ContactSubject::Ecommerce => "ecommerce",
            ContactSubject::Partnership => "partnership",
            ContactSubject::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    /// Human-readable label used in email subjects and CRM notes.
    pub fn label(&self) -> &'static str {
        match self {
            ContactSubject::ProductInquiry => "Product Inquiry",
            ContactSubject::Distributor => "Distributor Application",
            ContactSubject::Ecommerce => "E-commerce Partnership",
            ContactSubject::Partnership => "Business Partnership",
            ContactSubject::Other => "General Inquiry",
        }
    }
}

/// Requested quantity on a product inquiry: either a number or free text ("500-1000 units").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Count(f64),
    Text(String),
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // f64 Display prints whole numbers without a fraction or exponent
            Quantity::Count(n) => write!(f, "{}", n),
            Quantity::Text(text) => f.write_str(text),
        }
    }
}

/// Contact form submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactLead {
    pub full_name: String,
    pub email: String,
    pub subject: ContactSubject,
    pub message: String,
    pub company: Option<String>,
    pub marketing_consent: bool,
    pub turnstile_token: String,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Product inquiry submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductLead {
    pub full_name: String,
    pub email: String,
    pub product_slug: String,
    pub product_name: String,
    pub quantity: Quantity,
    pub company: Option<String>,
    pub requirements: Option<String>,
    pub marketing_consent: bool,
}

/// Newsletter signup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsletterLead {
    pub email: String,
}

/// A validated lead. Exactly one variant per submission; `type` is the discriminant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LeadInput {
    Contact(ContactLead),
    Product(ProductLead),
    Newsletter(NewsletterLead),
}

impl LeadInput {
    pub fn lead_type(&self) -> LeadType {
        match self {
            LeadInput::Contact(_) => LeadType::Contact,
            LeadInput::Product(_) => LeadType::Product,
            LeadInput::Newsletter(_) => LeadType::Newsletter,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            LeadInput::Contact(lead) => &lead.email,
            LeadInput::Product(lead) => &lead.email,
            LeadInput::Newsletter(lead) => &lead.email,
        }
    }

    pub fn is_contact(&self) -> bool {
        matches!(self, LeadInput::Contact(_))
    }

    pub fn is_product(&self) -> bool {
        matches!(self, LeadInput::Product(_))
    }

    pub fn is_newsletter(&self) -> bool {
        matches!(self, LeadInput::Newsletter(_))
    }
}

/// Settled outcome of one downstream call.
#[derive(Debug, Clone)]
pub struct ServiceResult {
    pub success: bool,
    pub id: Option<String>,
    pub error: Option<ServiceError>,
    pub latency_ms: u64,
}

impl ServiceResult {
    pub fn succeeded(id: String, latency_ms: u64) -> Self {
        Self {
            success: true,
            id: Some(id),
            error: None,
            latency_ms,
        }
    }

    pub fn failed(error: ServiceError, latency_ms: u64) -> Self {
        Self {
            success: false,
            id: None,
            error: Some(error),
            latency_ms,
        }
    }

    /// Placeholder for a call that is never made (newsletter notifications).
    pub fn not_attempted() -> Self {
        Self {
            success: false,
            id: None,
            error: None,
            latency_ms: 0,
        }
    }
}

/// Response returned to whoever submitted the lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadResult {
    pub success: bool,
    pub email_sent: bool,
    pub record_created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LeadResult {
    pub fn accepted(email_sent: bool, record_created: bool, reference_id: String) -> Self {
        Self {
            success: true,
            email_sent,
            record_created,
            reference_id: Some(reference_id),
            error: None,
        }
    }

    pub fn validation_failed() -> Self {
        Self::rejected(VALIDATION_ERROR)
    }

    pub fn processing_failed() -> Self {
        Self::rejected(PROCESSING_FAILED)
    }

    fn rejected(code: &str) -> Self {
        Self {
            success: false,
            email_sent: false,
            record_created: false,
            reference_id: None,
            error: Some(code.to_string()),
        }
    }
}

/// Per-collaborator slice of a pipeline summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    pub attempted: bool,
    pub success: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_category: Option<ErrorCategory>,
}

/// One record per pipeline run, emitted after reconciliation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSummary {
    pub reference_id: String,
    pub lead_type: LeadType,
    pub total_latency_ms: u64,
    pub notification: ServiceSummary,
    pub record_store: ServiceSummary,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}
