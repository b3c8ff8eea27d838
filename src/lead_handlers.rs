//! Per-type handlers: turn a validated lead into the email and CRM payloads
//! and issue both calls concurrently, each under the downstream deadline.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use crate::models::{ContactLead, LeadInput, LeadType, NewsletterLead, ProductLead, ServiceResult};
use crate::notifier::{
    ConfirmationNotification, ContactNotification, Notification, NotificationChannel,
    ProductInquiryNotification,
};
use crate::pipeline::reconcile;
use crate::record_store::{LeadRecord, RecordStore};
use crate::timeout::with_timeout;
use crate::utils::split_name;

/// Settled outcomes of the two tracked calls.
#[derive(Debug, Clone)]
pub struct HandlerOutcome {
    pub notify: ServiceResult,
    pub store: ServiceResult,
}

/// Collaborators and settings shared by the three handlers.
#[derive(Clone)]
pub struct LeadHandlers {
    notifier: Arc<dyn NotificationChannel>,
    store: Arc<dyn RecordStore>,
    timeout: Duration,
    send_confirmation: bool,
}

impl LeadHandlers {
    pub fn new(
        notifier: Arc<dyn NotificationChannel>,
        store: Arc<dyn RecordStore>,
        timeout: Duration,
        send_confirmation: bool,
    ) -> Self {
        Self {
            notifier,
            store,
            timeout,
            send_confirmation,
        }
    }

    /// Route a lead to the handler for its variant.
    pub async fn handle(&self, lead: &LeadInput, reference_id: &str) -> HandlerOutcome {
        match lead {
            LeadInput::Contact(contact) => self.handle_contact(contact, reference_id).await,
            LeadInput::Product(product) => self.handle_product(product, reference_id).await,
            LeadInput::Newsletter(newsletter) => {
                self.handle_newsletter(newsletter, reference_id).await
            }
        }
    }

    pub async fn handle_contact(&self, lead: &ContactLead, reference_id: &str) -> HandlerOutcome {
        let (first_name, last_name) = split_name(&lead.full_name);
        let submitted_at = lead.submitted_at.unwrap_or_else(Utc::now);

        let notification = Notification::Contact(ContactNotification {
            reference_id: reference_id.to_string(),
            first_name: first_name.clone(),
            last_name: last_name.clone(),
            email: lead.email.clone(),
            company: lead.company.clone(),
            subject: lead.subject,
            message: lead.message.clone(),
            marketing_consent: lead.marketing_consent,
            submitted_at,
        });

        let record = LeadRecord {
            reference_id: reference_id.to_string(),
            first_name: Some(first_name.clone()).filter(|s| !s.is_empty()),
            last_name: Some(last_name).filter(|s| !s.is_empty()),
            email: lead.email.clone(),
            company: lead.company.clone(),
            subject: Some(lead.subject.as_str().to_string()),
            message: Some(lead.message.clone()),
            marketing_consent: lead.marketing_consent,
            submitted_at: Some(submitted_at),
            ..Default::default()
        };

        let outcome = self
            .dispatch(LeadType::Contact, &notification, &record)
            .await;

        // A failed run hands out no reference id, so the submitter gets none either
        if self.send_confirmation && reconcile(LeadType::Contact, &outcome) {
            self.spawn_confirmation(ConfirmationNotification {
                reference_id: reference_id.to_string(),
                first_name,
                email: lead.email.clone(),
                subject: lead.subject,
            });
        }

        outcome
    }

    pub async fn handle_product(&self, lead: &ProductLead, reference_id: &str) -> HandlerOutcome {
        let (first_name, last_name) = split_name(&lead.full_name);
        let quantity = lead.quantity.to_string();

        let notification = Notification::ProductInquiry(ProductInquiryNotification {
            reference_id: reference_id.to_string(),
            first_name: first_name.clone(),
            last_name: last_name.clone(),
            email: lead.email.clone(),
            company: lead.company.clone(),
            product_slug: lead.product_slug.clone(),
            product_name: lead.product_name.clone(),
            quantity: quantity.clone(),
            requirements: lead.requirements.clone(),
            marketing_consent: lead.marketing_consent,
        });

        let record = LeadRecord {
            reference_id: reference_id.to_string(),
            first_name: Some(first_name).filter(|s| !s.is_empty()),
            last_name: Some(last_name).filter(|s| !s.is_empty()),
            email: lead.email.clone(),
            company: lead.company.clone(),
            message: Some(compose_inquiry_message(lead, &quantity)),
            product_slug: Some(lead.product_slug.clone()),
            product_name: Some(lead.product_name.clone()),
            quantity: Some(quantity),
            marketing_consent: lead.marketing_consent,
            ..Default::default()
        };

        self.dispatch(LeadType::Product, &notification, &record)
            .await
    }

    /// Newsletter signups only touch the record store.
    pub async fn handle_newsletter(
        &self,
        lead: &NewsletterLead,
        reference_id: &str,
    ) -> HandlerOutcome {
        let record = LeadRecord {
            reference_id: reference_id.to_string(),
            email: lead.email.clone(),
            marketing_consent: true,
            ..Default::default()
        };

        let store = self.store_record(LeadType::Newsletter, &record).await;

        HandlerOutcome {
            notify: ServiceResult::not_attempted(),
            store,
        }
    }

    /// Issue the notification and the CRM write together and wait for both to settle.
    async fn dispatch(
        &self,
        lead_type: LeadType,
        notification: &Notification,
        record: &LeadRecord,
    ) -> HandlerOutcome {
        let (notify, store) = tokio::join!(
            self.send_notification(notification),
            self.store_record(lead_type, record),
        );
        HandlerOutcome { notify, store }
    }

    async fn send_notification(&self, notification: &Notification) -> ServiceResult {
        with_timeout(self.notifier.send(notification), self.timeout, "email")
            .await
            .into_service_result()
    }

    async fn store_record(&self, lead_type: LeadType, record: &LeadRecord) -> ServiceResult {
        let timed = with_timeout(
            self.store.create_record(lead_type, record),
            self.timeout,
            "crm",
        )
        .await;
        match timed.outcome {
            Ok(created) => ServiceResult::succeeded(created.id, timed.latency_ms),
            Err(e) => ServiceResult::failed(e, timed.latency_ms),
        }
    }

    /// Detached: the submitter's acknowledgement never affects the result.
    fn spawn_confirmation(&self, confirmation: ConfirmationNotification) {
        let notifier = Arc::clone(&self.notifier);
        let timeout = self.timeout;
        tokio::spawn(async move {
            let notification = Notification::Confirmation(confirmation);
            let timed = with_timeout(notifier.send(&notification), timeout, "confirmation email")
                .await;
            match timed.outcome {
                Ok(id) => tracing::debug!(
                    "Confirmation email sent for {}: {}",
                    notification.reference_id(),
                    id
                ),
                Err(e) => tracing::warn!(
                    "⚠️  Confirmation email failed for {}: {}",
                    notification.reference_id(),
                    e
                ),
            }
        });
    }
}

/// Structured note stored on the CRM record for a product inquiry.
pub fn compose_inquiry_message(lead: &ProductLead, quantity: &str) -> String {
    let mut message = format!(
        "Product Inquiry: {}\nProduct: {}\nQuantity: {}",
        lead.product_name, lead.product_slug, quantity
    );
    if let Some(requirements) = &lead.requirements {
        message.push_str(&format!("\nRequirements: {}", requirements));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Quantity;

    fn product(requirements: Option<&str>) -> ProductLead {
        ProductLead {
            full_name: "Ana Lima".into(),
            email: "ana@example.com".into(),
            product_slug: "steel-drum".into(),
            product_name: "Steel Drum".into(),
            quantity: Quantity::Count(250.0),
            company: None,
            requirements: requirements.map(str::to_string),
            marketing_consent: false,
        }
    }

    #[test]
    fn test_inquiry_message_with_requirements() {
        let lead = product(Some("Food grade lining"));
        let message = compose_inquiry_message(&lead, &lead.quantity.to_string());
        assert_eq!(
            message,
            "Product Inquiry: Steel Drum\nProduct: steel-drum\nQuantity: 250\nRequirements: Food grade lining"
        );
    }

    #[test]
    fn test_inquiry_message_without_requirements() {
        let lead = product(None);
        let message = compose_inquiry_message(&lead, "250");
        assert!(!message.contains("Requirements"));
    }
}
