//! Process-wide lead pipeline metrics and the per-run summary record.
//!
//! `LeadMetrics` is constructed once at startup and shared behind an `Arc`.
//! Counters are atomics; latency samples live in a bounded window behind a
//! mutex that is only held for a push or a copy.

use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::errors::ServiceError;
use crate::models::{PipelineSummary, ServiceResult};

/// Latency samples kept per service.
pub const LATENCY_WINDOW: usize = 1_000;

/// Failure taxonomy for downstream errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Timeout,
    Network,
    Authorization,
    RateLimited,
    Unknown,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 5] = [
        ErrorCategory::Timeout,
        ErrorCategory::Network,
        ErrorCategory::Authorization,
        ErrorCategory::RateLimited,
        ErrorCategory::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Network => "network",
            ErrorCategory::Authorization => "authorization",
            ErrorCategory::RateLimited => "rate_limited",
            ErrorCategory::Unknown => "unknown",
        }
    }

    fn index(&self) -> usize {
        match self {
            ErrorCategory::Timeout => 0,
            ErrorCategory::Network => 1,
            ErrorCategory::Authorization => 2,
            ErrorCategory::RateLimited => 3,
            ErrorCategory::Unknown => 4,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a downstream failure by its shape, then by its message.
pub fn classify_error(error: &ServiceError) -> ErrorCategory {
    match error {
        ServiceError::Timeout { .. } => ErrorCategory::Timeout,
        ServiceError::Network(_) => ErrorCategory::Network,
        ServiceError::Http { status: 401 | 403, .. } => ErrorCategory::Authorization,
        ServiceError::Http { status: 429, .. } => ErrorCategory::RateLimited,
        ServiceError::Http { message, .. }
        | ServiceError::InvalidResponse(message)
        | ServiceError::Other(message) => classify_message(message),
    }
}

fn classify_message(message: &str) -> ErrorCategory {
    let msg = message.to_lowercase();
    let has = |needles: &[&str]| contains_any(&msg, needles);

    if has(&["timeout", "timed out"][..]) {
        ErrorCategory::Timeout
    } else if has(&["network", "fetch", "econn", "connection", "dns"][..]) {
        ErrorCategory::Network
    } else if has(&["401", "403", "unauthorized", "forbidden"][..]) {
        ErrorCategory::Authorization
    } else if has(&["429", "rate limit", "too many requests"][..]) {
        ErrorCategory::RateLimited
    } else {
        ErrorCategory::Unknown
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Downstream collaborators tracked by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceName {
    Notification,
    RecordStore,
}

impl ServiceName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceName::Notification => "email",
            ServiceName::RecordStore => "crm",
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default)]
struct ServiceCounters {
    success: AtomicU64,
    failure: AtomicU64,
    by_category: [AtomicU64; 5],
    latencies: Mutex<VecDeque<u64>>,
}

impl ServiceCounters {
    fn record(&self, result: &ServiceResult) {
        if result.success {
            self.success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failure.fetch_add(1, Ordering::Relaxed);
            let category = result
                .error
                .as_ref()
                .map(classify_error)
                .unwrap_or(ErrorCategory::Unknown);
            self.by_category[category.index()].fetch_add(1, Ordering::Relaxed);
        }

        let mut latencies = self.latencies.lock().unwrap_or_else(|p| p.into_inner());
        if latencies.len() == LATENCY_WINDOW {
            latencies.pop_front();
        }
        latencies.push_back(result.latency_ms);
    }

    fn snapshot(&self) -> ServiceSnapshot {
        let mut samples: Vec<u64> = self
            .latencies
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .copied()
            .collect();
        samples.sort_unstable();

        let avg_latency_ms = if samples.is_empty() {
            0.0
        } else {
            samples.iter().sum::<u64>() as f64 / samples.len() as f64
        };
        let p95_latency_ms = if samples.is_empty() {
            0
        } else {
            let rank = ((samples.len() as f64) * 0.95).ceil() as usize;
            samples[rank.saturating_sub(1).min(samples.len() - 1)]
        };

        let success = self.success.load(Ordering::Relaxed);
        let failure = self.failure.load(Ordering::Relaxed);

        ServiceSnapshot {
            total: success + failure,
            success,
            failure,
            failures_by_category: ErrorCategory::ALL
                .iter()
                .map(|c| (c.as_str(), self.by_category[c.index()].load(Ordering::Relaxed)))
                .filter(|(_, count)| *count > 0)
                .collect(),
            avg_latency_ms,
            p95_latency_ms,
        }
    }
}

/// Point-in-time view of one service's counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSnapshot {
    pub total: u64,
    pub success: u64,
    pub failure: u64,
    pub failures_by_category: std::collections::BTreeMap<&'static str, u64>,
    pub avg_latency_ms: f64,
    pub p95_latency_ms: u64,
}

/// Point-in-time view of the whole aggregator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub pipeline_runs: u64,
    pub pipeline_failures: u64,
    pub email: ServiceSnapshot,
    pub crm: ServiceSnapshot,
}

/// Shared aggregator injected into the pipeline.
#[derive(Debug, Default)]
pub struct LeadMetrics {
    notification: ServiceCounters,
    record_store: ServiceCounters,
    pipeline_runs: AtomicU64,
    pipeline_failures: AtomicU64,
}

impl LeadMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one real attempt against `service`.
    pub fn record(&self, service: ServiceName, result: &ServiceResult) {
        let counters = match service {
            ServiceName::Notification => &self.notification,
            ServiceName::RecordStore => &self.record_store,
        };
        counters.record(result);

        if !result.success {
            let category = result
                .error
                .as_ref()
                .map(classify_error)
                .unwrap_or(ErrorCategory::Unknown);
            tracing::warn!(
                service = service.as_str(),
                category = category.as_str(),
                latency_ms = result.latency_ms,
                "❌ {} call failed: {}",
                service,
                result
                    .error
                    .as_ref()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "no error reported".to_string())
            );
        }
    }

    /// Emit the per-run summary and count the run.
    pub fn log_summary(&self, summary: &PipelineSummary) {
        self.pipeline_runs.fetch_add(1, Ordering::Relaxed);
        if !summary.success {
            self.pipeline_failures.fetch_add(1, Ordering::Relaxed);
        }

        tracing::info!(
            target: "lead_pipeline",
            reference_id = %summary.reference_id,
            lead_type = %summary.lead_type,
            total_latency_ms = summary.total_latency_ms,
            email_attempted = summary.notification.attempted,
            email_success = summary.notification.success,
            email_latency_ms = summary.notification.latency_ms,
            email_error = summary.notification.error_category.map(|c| c.as_str()).unwrap_or("none"),
            crm_attempted = summary.record_store.attempted,
            crm_success = summary.record_store.success,
            crm_latency_ms = summary.record_store.latency_ms,
            crm_error = summary.record_store.error_category.map(|c| c.as_str()).unwrap_or("none"),
            success = summary.success,
            timestamp = %summary.timestamp.to_rfc3339(),
            "lead pipeline summary"
        );
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pipeline_runs: self.pipeline_runs.load(Ordering::Relaxed),
            pipeline_failures: self.pipeline_failures.load(Ordering::Relaxed),
            email: self.notification.snapshot(),
            crm: self.record_store.snapshot(),
        }
    }
}
