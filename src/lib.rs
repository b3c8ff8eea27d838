//! Lead Intake API Library
//!
//! Validates website form submissions (contact, product inquiry, newsletter)
//! and delivers each one to an email provider and a CRM concurrently,
//! tolerating the failure of either and recording per-service metrics.
//!
//! # Modules
//!
//! - `api`: HTTP-facing components.
//! - `core`: Lead pipeline and domain logic.
//! - `integrations`: Downstream collaborators (email, CRM).
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `lead_handlers`: Per-lead-type dispatch.
//! - `metrics`: Counters, error classification and run summaries.
//! - `models`: Lead union and result types.
//! - `notifier`: Notification channel (email).
//! - `pipeline`: Orchestrator and partial-failure policy.
//! - `record_store`: Record store (CRM).
//! - `reference_id`: Tracking token generation.
//! - `timeout`: Deadline wrapper for downstream calls.
//! - `utils`: Name splitting and log redaction.
//! - `validation`: Schema validation for untrusted input.

pub mod api;
pub mod core;
pub mod integrations;

pub mod config;
pub mod errors;
pub mod handlers;
pub mod lead_handlers;
pub mod metrics;
pub mod models;
pub mod notifier;
pub mod pipeline;
pub mod record_store;
pub mod reference_id;
pub mod timeout;
pub mod utils;
pub mod validation;
