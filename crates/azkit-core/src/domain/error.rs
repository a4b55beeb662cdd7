// ============================================================================
// domain/error.rs - FUNCTION MODEL ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (the package goal collects them per function)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    #[error("Invalid function name '{name}': {reason}")]
    InvalidFunctionName { name: String, reason: String },

    #[error("Invalid package name '{name}': input should be a valid Java package name")]
    InvalidPackageName { name: String },

    #[error("invalid input: {input}")]
    InvalidInput { input: String },

    #[error("Invalid function configuration for '{function}': {reason}")]
    InvalidConfiguration { function: String, reason: String },

    #[error("Invalid function template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("Invalid extension bundle version range '{0}'")]
    InvalidBundleVersion(String),

    // ========================================================================
    // Not Found Errors
    // ========================================================================
    #[error("Function template not found: {0}")]
    TemplateNotFound(String),

    #[error("Template '{template}' has no '{file}' body")]
    MissingTemplateFile { template: String, file: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFunctionName { .. } => vec![
                "Function name must start with a letter".into(),
                "It can contain letters, digits, '_' and '-'".into(),
                "Examples: HttpExample, queue-worker, Timer_1".into(),
            ],
            Self::InvalidPackageName { .. } => vec![
                "Use dot-separated Java identifiers, e.g. com.example.functions".into(),
                "Java keywords such as 'class' or 'int' are not allowed as segments".into(),
            ],
            Self::InvalidInput { .. } => vec![
                "Batch mode requires every required value up front".into(),
                "Pass the value on the command line or drop --batch to be prompted".into(),
            ],
            Self::TemplateNotFound(name) => vec![
                format!("No template is named '{}'", name),
                "Try: azkit list to see available function templates".into(),
            ],
            Self::InvalidConfiguration { function, .. } => vec![
                format!("Check the annotations on function '{}'", function),
                "Each function needs exactly one trigger and uniquely named bindings".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidFunctionName { .. }
            | Self::InvalidPackageName { .. }
            | Self::InvalidInput { .. }
            | Self::InvalidConfiguration { .. }
            | Self::InvalidBundleVersion(_) => ErrorCategory::Validation,
            Self::TemplateNotFound(_) => ErrorCategory::NotFound,
            Self::InvalidTemplate { .. } | Self::MissingTemplateFile { .. } => {
                ErrorCategory::Internal
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Internal,
}
