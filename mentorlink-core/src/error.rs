//! Unified error handling system
//!
//! Provides structured error types with context, recovery suggestions, and proper error chaining

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type MentorlinkResult<T> = Result<T, MentorlinkError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: std::collections::HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the Mentorlink client
#[derive(Error, Debug)]
pub enum MentorlinkError {
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    /// The remote service answered with a non-success status
    #[error("Service error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Operation timeout: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl MentorlinkError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            MentorlinkError::Config { context, .. } => Some(context),
            MentorlinkError::Network { context, .. } => Some(context),
            MentorlinkError::Api { context, .. } => Some(context),
            MentorlinkError::Validation { context, .. } => Some(context),
            MentorlinkError::Storage { context, .. } => Some(context),
            MentorlinkError::Timeout { context, .. } => Some(context),
            MentorlinkError::Internal { context, .. } => Some(context),
            MentorlinkError::Io(_) | MentorlinkError::Serialization(_) => None,
        }
    }

    /// HTTP status reported by the remote service, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            MentorlinkError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The stored token was rejected by a dependent request
    pub fn is_authorization_failure(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// Absence of content, which callers render as an empty state
    pub fn is_no_content(&self) -> bool {
        self.status() == Some(404)
    }

    /// Check if error is recoverable by repeating the action
    pub fn is_recoverable(&self) -> bool {
        match self {
            MentorlinkError::Network { .. } => true,
            MentorlinkError::Timeout { .. } => true,
            MentorlinkError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Text suitable for a user-facing notice.
    ///
    /// Service errors surface the server's own message verbatim.
    pub fn user_message(&self) -> String {
        match self {
            MentorlinkError::Api { message, .. } => message.clone(),
            MentorlinkError::Validation { message, .. } => message.clone(),
            MentorlinkError::Network { .. } | MentorlinkError::Timeout { .. } => {
                "Could not reach the server. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            MentorlinkError::Internal { .. } | MentorlinkError::Storage { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Internal error occurred"
                );
            }
            MentorlinkError::Config { .. } | MentorlinkError::Validation { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Configuration or validation error"
                );
            }
            MentorlinkError::Network { .. } | MentorlinkError::Timeout { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Network or timeout error (may be recoverable)"
                );
            }
            _ => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    status = ?self.status(),
                    error = %self,
                    "Request failed"
                );
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::MentorlinkError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'mentorlink config --init' to create default config"),
        }
    };
    ($msg:expr, $component:expr, $suggestion:expr) => {
        $crate::MentorlinkError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component).with_suggestion($suggestion),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::MentorlinkError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}
