use std::fmt;

/// Failure reported by a downstream collaborator (email provider, CRM).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The call did not settle before its deadline.
    Timeout {
        /// Label of the operation that timed out.
        label: String,
        /// Deadline in milliseconds, when known.
        timeout_ms: Option<u64>,
    },
    /// The collaborator answered with a non-success HTTP status.
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },
    /// Connection-level failure (DNS, refused, reset).
    Network(String),
    /// The collaborator answered but the body could not be understood.
    InvalidResponse(String),
    /// Anything else.
    Other(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Timeout {
                label,
                timeout_ms: Some(ms),
            } => write!(f, "{} timed out after {}ms", label, ms),
            ServiceError::Timeout {
                label,
                timeout_ms: None,
            } => write!(f, "{} timed out", label),
            ServiceError::Http { status, message } => write!(f, "HTTP {}: {}", status, message),
            ServiceError::Network(msg) => write!(f, "Network error: {}", msg),
            ServiceError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            ServiceError::Other(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::Timeout {
                label: "http request".to_string(),
                timeout_ms: None,
            }
        } else if let Some(status) = err.status() {
            ServiceError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_connect() || err.is_request() {
            ServiceError::Network(err.to_string())
        } else if err.is_decode() {
            ServiceError::InvalidResponse(err.to_string())
        } else {
            ServiceError::Other(err.to_string())
        }
    }
}

/// Application-level errors raised while wiring the service together.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Error setting up or talking to an external API.
    ExternalApiError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ExternalApiError(msg) => write!(f, "External API error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }
}
