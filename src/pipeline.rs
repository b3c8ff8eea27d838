//! Lead pipeline orchestrator.
//!
//! `Validated → Dispatching → Reconciled → (Succeeded | Failed)`
//!
//! Both downstream calls are awaited until settled. Overall success is
//! `email OR crm` for contact and product leads; newsletter leads depend on
//! the CRM write alone.

use chrono::Utc;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::errors::ServiceError;
use crate::lead_handlers::{HandlerOutcome, LeadHandlers};
use crate::metrics::{classify_error, ErrorCategory, LeadMetrics, ServiceName};
use crate::models::{LeadResult, LeadType, PipelineSummary, ServiceResult, ServiceSummary};
use crate::notifier::NotificationChannel;
use crate::record_store::RecordStore;
use crate::timeout::DOWNSTREAM_TIMEOUT;
use crate::utils::hash_for_log;
use crate::{reference_id, validation};

/// Tunables for a pipeline instance.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Deadline for each downstream call.
    pub downstream_timeout: Duration,
    /// Send the best-effort confirmation email on contact leads.
    pub send_confirmation: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            downstream_timeout: DOWNSTREAM_TIMEOUT,
            send_confirmation: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    Validated,
    Dispatching,
    Reconciled,
    Succeeded,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Validated => "validated",
            PipelineState::Dispatching => "dispatching",
            PipelineState::Reconciled => "reconciled",
            PipelineState::Succeeded => "succeeded",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Validates a submission, fans it out to email and CRM, and reconciles the outcome.
#[derive(Clone)]
pub struct LeadPipeline {
    handlers: LeadHandlers,
    metrics: Arc<LeadMetrics>,
}

impl LeadPipeline {
    pub fn new(
        notifier: Arc<dyn NotificationChannel>,
        store: Arc<dyn RecordStore>,
        metrics: Arc<LeadMetrics>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            handlers: LeadHandlers::new(
                notifier,
                store,
                options.downstream_timeout,
                options.send_confirmation,
            ),
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<LeadMetrics> {
        &self.metrics
    }

    /// Run one submission through the pipeline. Never panics into the caller.
    pub async fn process_lead(&self, raw: &Value) -> LeadResult {
        let started = Instant::now();

        let lead = match validation::validate(raw) {
            Ok(lead) => lead,
            Err(e) => {
                tracing::warn!("❌ Lead rejected: {}", e);
                return LeadResult::validation_failed();
            }
        };

        let lead_type = lead.lead_type();
        let reference_id = reference_id::generate(lead_type.as_str());
        tracing::info!(
            reference_id = %reference_id,
            lead_type = %lead_type,
            email_hash = %hash_for_log(lead.email()),
            "📨 Lead {}",
            PipelineState::Validated
        );

        tracing::debug!(reference_id = %reference_id, "{}", PipelineState::Dispatching);
        let handlers = self.handlers.clone();
        let task_reference_id = reference_id.clone();
        let dispatched =
            tokio::spawn(async move { handlers.handle(&lead, &task_reference_id).await }).await;

        let outcome = match dispatched {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    reference_id = %reference_id,
                    "💥 Lead dispatch aborted: {}",
                    e
                );
                let aborted = || {
                    ServiceResult::failed(
                        ServiceError::Other(format!("dispatch aborted: {}", e)),
                        0,
                    )
                };
                let summary = build_summary(
                    &reference_id,
                    lead_type,
                    started,
                    &HandlerOutcome {
                        notify: aborted(),
                        store: aborted(),
                    },
                    false,
                    false,
                );
                self.metrics.log_summary(&summary);
                return LeadResult::processing_failed();
            }
        };

        tracing::debug!(reference_id = %reference_id, "{}", PipelineState::Reconciled);
        let success = reconcile(lead_type, &outcome);

        if lead_type.sends_notification() {
            self.metrics.record(ServiceName::Notification, &outcome.notify);
        }
        self.metrics.record(ServiceName::RecordStore, &outcome.store);

        let summary = build_summary(
            &reference_id,
            lead_type,
            started,
            &outcome,
            lead_type.sends_notification(),
            true,
        );
        self.metrics.log_summary(&summary);

        if success {
            tracing::info!(
                reference_id = %reference_id,
                email_sent = outcome.notify.success,
                record_created = outcome.store.success,
                "✅ Lead {}",
                PipelineState::Succeeded
            );
            LeadResult::accepted(outcome.notify.success, outcome.store.success, reference_id)
        } else {
            tracing::error!(
                reference_id = %reference_id,
                lead_type = %lead_type,
                "❌ Lead {}: no downstream accepted it",
                PipelineState::Failed
            );
            LeadResult::processing_failed()
        }
    }
}

/// Partial-failure policy.
pub fn reconcile(lead_type: LeadType, outcome: &HandlerOutcome) -> bool {
    match lead_type {
        LeadType::Contact | LeadType::Product => outcome.notify.success || outcome.store.success,
        LeadType::Newsletter => outcome.store.success,
    }
}

fn service_summary(result: &ServiceResult, attempted: bool) -> ServiceSummary {
    ServiceSummary {
        attempted,
        success: result.success,
        latency_ms: result.latency_ms,
        error_category: if attempted && !result.success {
            Some(
                result
                    .error
                    .as_ref()
                    .map(classify_error)
                    .unwrap_or(ErrorCategory::Unknown),
            )
        } else {
            None
        },
    }
}

fn build_summary(
    reference_id: &str,
    lead_type: LeadType,
    started: Instant,
    outcome: &HandlerOutcome,
    notify_attempted: bool,
    store_attempted: bool,
) -> PipelineSummary {
    PipelineSummary {
        reference_id: reference_id.to_string(),
        lead_type,
        total_latency_ms: started.elapsed().as_millis() as u64,
        notification: service_summary(&outcome.notify, notify_attempted),
        record_store: service_summary(&outcome.store, store_attempted),
        success: reconcile(lead_type, outcome),
        timestamp: Utc::now(),
    }
}
