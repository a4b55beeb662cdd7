//! Errors raised by the resource lifecycle and vendor ports.

use thiserror::Error;

/// Failure talking to (or about) a remote cloud resource.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CloudError {
    /// The vendor API answered with an error status.
    #[error("{message} (status {status})")]
    Http { status: u16, message: String },

    #[error("{0}")]
    NotFound(String),

    /// A field required before a remote write was never set.
    #[error("{0}")]
    MissingField(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Unsupported(String),

    #[error("Invalid resource id '{id}': {reason}")]
    InvalidResourceId { id: String, reason: String },

    /// Anything else the vendor client reported.
    #[error("{0}")]
    Vendor(String),

    /// The parent of a module does not exist, so nothing can be written under it.
    #[error("Parent of {module} does not exist")]
    ParentMissing { module: String },
}

impl CloudError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Whether the error means "this resource is absent".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Http { status: 404, .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::MissingField(_) => vec!["Set the missing field on the draft before committing".into()],
            Self::InvalidResourceId { .. } => vec![
                "Resource ids look like /subscriptions/<id>/resourceGroups/<group>/providers/<namespace>/<type>/<name>".into(),
            ],
            Self::Http { status: 401 | 403, .. } => vec![
                "Check that your account can access this subscription".into(),
            ],
            Self::ParentMissing { .. } => vec!["Create the parent resource first".into()],
            _ => vec!["Check the error details above".into()],
        }
    }
}

pub type CloudResult<T> = Result<T, CloudError>;
