//! Unified error handling for azkit core.
//!
//! Wraps domain, application and cloud errors with a category for display and
//! user-actionable suggestions.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::resource::CloudError;

/// Root error type for azkit core operations.
#[derive(Debug, Error, Clone)]
pub enum AzkitError {
    /// Invalid function model, template or descriptor.
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// A build goal could not complete.
    #[error("{0}")]
    Application(#[from] ApplicationError),

    /// A cloud resource operation failed.
    #[error("{0}")]
    Cloud(#[from] CloudError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl AzkitError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Cloud(e) => e.suggestions(),
            Self::Configuration { message } => vec![
                format!("Configuration issue: {message}"),
                "Check your azkit.toml and AZKIT_* environment variables".into(),
            ],
            Self::Internal { .. } => vec![
                "This appears to be a bug in azkit".into(),
                "Please report this issue at: https://github.com/cosecruz/azkit/issues".into(),
            ],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Validation => ErrorCategory::Validation,
                crate::domain::ErrorCategory::NotFound => ErrorCategory::NotFound,
                crate::domain::ErrorCategory::Internal => ErrorCategory::Internal,
            },
            Self::Application(e) => e.category(),
            Self::Cloud(e) => match e {
                CloudError::MissingField(_)
                | CloudError::InvalidArgument(_)
                | CloudError::InvalidResourceId { .. }
                | CloudError::Unsupported(_) => ErrorCategory::Validation,
                e if e.is_not_found() => ErrorCategory::NotFound,
                CloudError::ParentMissing { .. } => ErrorCategory::NotFound,
                _ => ErrorCategory::Internal,
            },
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Configuration,
    Internal,
}

/// Convenient result type alias.
pub type AzkitResult<T> = Result<T, AzkitError>;

/// Extension trait for adding context to errors.
pub trait Context<T> {
    fn context(self, msg: impl Into<String>) -> AzkitResult<T>;
}

impl<T, E> Context<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: impl Into<String>) -> AzkitResult<T> {
        self.map_err(|e| AzkitError::Internal {
            message: format!("{}: {}", msg.into(), e),
        })
    }
}
