// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for azkit.
//!
//! Pure logic for Azure Functions projects: the binding model, the
//! `function.json` configuration, scaffold templates and extension bundle
//! handling. All I/O goes through the ports in the application layer.
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: No filesystem, network, or process calls
//! - **Value types**: Everything is Clone + PartialEq

pub mod error;
pub mod function;

mod validation;

pub use error::{DomainError, ErrorCategory};
pub use function::*;
pub use validation::{DomainValidator, FUNCTION_NAME_PATTERN, capitalize};
