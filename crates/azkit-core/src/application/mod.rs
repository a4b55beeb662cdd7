//! Application layer for azkit.
//!
//! This layer contains:
//! - **Services**: the add and package goals
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! business logic itself. All business rules live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

pub use services::{
    AddFunctionRequest, AddFunctionService, AddedFunction, InputMode, PackageOutcome,
    PackageReport, PackageRequest, PackageService,
};

pub use ports::{
    ExtensionInstaller, Filesystem, FunctionScanner, FunctionTemplateStore, MessageLevel,
    Messager, Prompter,
};

pub use error::ApplicationError;
