//! Schema validation for untrusted lead submissions.
//!
//! The `type` field is read first; the field set for exactly that variant is
//! then checked. Every problem is collected so the caller can log the full
//! list of field issues in one line.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::LazyLock;

use crate::models::{ContactLead, ContactSubject, LeadInput, NewsletterLead, ProductLead, Quantity};

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 100;
pub const EMAIL_MAX: usize = 254;
pub const MESSAGE_MIN: usize = 10;
pub const MESSAGE_MAX: usize = 5000;
pub const COMPANY_MAX: usize = 200;
pub const PRODUCT_FIELD_MAX: usize = 200;
pub const QUANTITY_TEXT_MAX: usize = 100;
pub const REQUIREMENTS_MAX: usize = 2000;
pub const TOKEN_MAX: usize = 2048;

// RFC 5322 simplified: local@domain.tld, at least one dot in the domain
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .unwrap_or_else(|e| panic!("email regex is invalid: {}", e))
});

/// A single field-level problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

/// Validation failure with every field issue found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    fn single(field: &str, message: impl Into<String>) -> Self {
        Self {
            issues: vec![FieldIssue {
                field: field.to_string(),
                message: message.into(),
            }],
        }
    }

    pub fn has_issue_for(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| issue.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .issues
            .iter()
            .map(|issue| format!("{}: {}", issue.field, issue.message))
            .collect();
        write!(f, "validation failed ({})", parts.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// Email grammar check (trimmed input expected).
pub fn is_valid_email(email: &str) -> bool {
    email.len() <= EMAIL_MAX && EMAIL_REGEX.is_match(email)
}

/// Validate an untrusted submission against the lead union.
pub fn validate(raw: &Value) -> Result<LeadInput, ValidationError> {
    let Some(object) = raw.as_object() else {
        return Err(ValidationError::single("", "expected a JSON object"));
    };

    let lead_type = match object.get("type") {
        Some(Value::String(s)) => s.trim(),
        Some(_) => return Err(ValidationError::single("type", "must be a string")),
        None => return Err(ValidationError::single("type", "is required")),
    };

    let mut fields = FieldReader::new(object);
    let lead = match lead_type {
        "contact" => validate_contact(&mut fields),
        "product" => validate_product(&mut fields),
        "newsletter" => validate_newsletter(&mut fields),
        other => {
            return Err(ValidationError::single(
                "type",
                format!("unknown lead type '{}'", other),
            ))
        }
    };

    match lead {
        Some(lead) if fields.issues.is_empty() => Ok(lead),
        _ => Err(ValidationError {
            issues: fields.issues,
        }),
    }
}

fn validate_contact(fields: &mut FieldReader<'_>) -> Option<LeadInput> {
    let full_name = fields.required_string("fullName", NAME_MIN, NAME_MAX);
    let email = fields.email("email");
    let subject = fields.subject("subject");
    let message = fields.required_string("message", MESSAGE_MIN, MESSAGE_MAX);
    let company = fields.optional_string("company", COMPANY_MAX);
    let marketing_consent = fields.flag("marketingConsent");
    let turnstile_token = fields.required_string("turnstileToken", 1, TOKEN_MAX);
    let submitted_at = fields.timestamp("submittedAt");

    Some(LeadInput::Contact(ContactLead {
        full_name: full_name?,
        email: email?,
        subject: subject?,
        message: message?,
        company,
        marketing_consent,
        turnstile_token: turnstile_token?,
        submitted_at,
    }))
}

fn validate_product(fields: &mut FieldReader<'_>) -> Option<LeadInput> {
    let full_name = fields.required_string("fullName", NAME_MIN, NAME_MAX);
    let email = fields.email("email");
    let product_slug = fields.required_string("productSlug", 1, PRODUCT_FIELD_MAX);
    let product_name = fields.required_string("productName", 1, PRODUCT_FIELD_MAX);
    let quantity = fields.quantity("quantity");
    let company = fields.optional_string("company", COMPANY_MAX);
    let requirements = fields.optional_string("requirements", REQUIREMENTS_MAX);
    let marketing_consent = fields.flag("marketingConsent");

    Some(LeadInput::Product(ProductLead {
        full_name: full_name?,
        email: email?,
        product_slug: product_slug?,
        product_name: product_name?,
        quantity: quantity?,
        company,
        requirements,
        marketing_consent,
    }))
}

fn validate_newsletter(fields: &mut FieldReader<'_>) -> Option<LeadInput> {
    let email = fields.email("email");
    Some(LeadInput::Newsletter(NewsletterLead { email: email? }))
}

/// Reads fields off a JSON object, recording an issue for each bad one.
struct FieldReader<'a> {
    object: &'a Map<String, Value>,
    issues: Vec<FieldIssue>,
}

impl<'a> FieldReader<'a> {
    fn new(object: &'a Map<String, Value>) -> Self {
        Self {
            object,
            issues: Vec::new(),
        }
    }

    fn issue(&mut self, field: &str, message: impl Into<String>) {
        self.issues.push(FieldIssue {
            field: field.to_string(),
            message: message.into(),
        });
    }

    /// Present and non-null value, or `None`.
    fn value(&self, field: &str) -> Option<&'a Value> {
        self.object.get(field).filter(|v| !v.is_null())
    }

    fn trimmed_string(&mut self, field: &str) -> Option<Option<String>> {
        match self.value(field) {
            None => Some(None),
            Some(Value::String(s)) => Some(Some(s.trim().to_string())),
            Some(_) => {
                self.issue(field, "must be a string");
                None
            }
        }
    }

    fn required_string(&mut self, field: &str, min: usize, max: usize) -> Option<String> {
        let value = match self.trimmed_string(field)? {
            Some(v) if !v.is_empty() => v,
            _ => {
                self.issue(field, "is required");
                return None;
            }
        };
        self.check_length(field, value, min, max)
    }

    fn optional_string(&mut self, field: &str, max: usize) -> Option<String> {
        match self.trimmed_string(field)? {
            Some(v) if !v.is_empty() => self.check_length(field, v, 0, max),
            _ => None,
        }
    }

    fn check_length(&mut self, field: &str, value: String, min: usize, max: usize) -> Option<String> {
        let len = value.chars().count();
        if len < min {
            self.issue(field, format!("must be at least {} characters", min));
            None
        } else if len > max {
            self.issue(field, format!("must be at most {} characters", max));
            None
        } else {
            Some(value)
        }
    }

    fn email(&mut self, field: &str) -> Option<String> {
        let email = self.required_string(field, 3, EMAIL_MAX)?.to_lowercase();
        if is_valid_email(&email) {
            Some(email)
        } else {
            self.issue(field, "must be a valid email address");
            None
        }
    }

    fn subject(&mut self, field: &str) -> Option<ContactSubject> {
        let raw = self.required_string(field, 1, 64)?;
        match ContactSubject::parse(&raw) {
            Some(subject) => Some(subject),
            None => {
                let allowed: Vec<&str> = ContactSubject::ALL.iter().map(|s| s.as_str()).collect();
                self.issue(field, format!("must be one of: {}", allowed.join(", ")));
                None
            }
        }
    }

    fn flag(&mut self, field: &str) -> bool {
        match self.value(field) {
            None => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                self.issue(field, "must be a boolean");
                false
            }
        }
    }

    fn quantity(&mut self, field: &str) -> Option<Quantity> {
        match self.value(field) {
            Some(Value::Number(n)) => match n.as_f64() {
                Some(q) if q.is_finite() && q > 0.0 => Some(Quantity::Count(q)),
                _ => {
                    self.issue(field, "must be a positive number");
                    None
                }
            },
            Some(Value::String(_)) => self
                .required_string(field, 1, QUANTITY_TEXT_MAX)
                .map(Quantity::Text),
            Some(_) => {
                self.issue(field, "must be a number or text");
                None
            }
            None => {
                self.issue(field, "is required");
                None
            }
        }
    }

    /// Optional client timestamp: RFC 3339 string or epoch milliseconds.
    fn timestamp(&mut self, field: &str) -> Option<DateTime<Utc>> {
        match self.value(field)? {
            Value::String(s) => match DateTime::parse_from_rfc3339(s.trim()) {
                Ok(dt) => Some(dt.with_timezone(&Utc)),
                Err(_) => {
                    self.issue(field, "must be an RFC 3339 timestamp");
                    None
                }
            },
            Value::Number(n) => match n.as_i64().and_then(DateTime::from_timestamp_millis) {
                Some(dt) => Some(dt),
                None => {
                    self.issue(field, "must be epoch milliseconds");
                    None
                }
            },
            _ => {
                self.issue(field, "must be a timestamp");
                None
            }
        }
    }
}
