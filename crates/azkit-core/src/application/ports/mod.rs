//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `azkit-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `Filesystem`: File operations
//!   - `FunctionTemplateStore`: Function template catalogue
//!   - `Prompter` / `Messager`: User interaction
//!   - `FunctionScanner`: Entry point discovery
//!   - `ExtensionInstaller`: Binding extension installation
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use output::{
    AnnotatedFunction, ExtensionInstaller, Filesystem, FunctionScanner, FunctionTemplateStore,
    MessageLevel, Messager, Prompter,
};
