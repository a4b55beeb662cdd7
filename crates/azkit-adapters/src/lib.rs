//! Infrastructure adapters for azkit.
//!
//! This crate implements the ports defined in `azkit_core::application::ports`
//! and the vendor ports of `azkit_core::cloud`. It contains all external
//! dependencies and I/O operations.

pub mod cloud;
pub mod filesystem;
pub mod installer;
pub mod interaction;
pub mod scanner;
pub mod template_store;

// Re-export commonly used adapters
pub use cloud::{InMemoryCloud, InMemoryCollection, InMemorySubscription};
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use installer::FuncCoreToolsInstaller;
pub use interaction::{RecordingMessager, ScriptedPrompter};
pub use scanner::JavaSourceScanner;
pub use template_store::BuiltinTemplateStore;
