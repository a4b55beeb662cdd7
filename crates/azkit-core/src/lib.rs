//! azkit core - Azure Functions build goals and a typed Azure resource façade.
//!
//! This crate provides the domain and application layers of azkit, laid out
//! as hexagonal (ports and adapters) architecture:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             azkit-cli (CLI)             │
//! │       add / package / list / config     │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │  (AddFunctionService, PackageService)   │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │       Ports (Traits) + cloud façade     │
//! │ (Filesystem, Prompter, *Manager, ...)   │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      azkit-adapters (Infrastructure)    │
//! │ (LocalFilesystem, InMemoryCloud, etc)   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! - [`domain`]: bindings, `function.json`, templates, extension bundles
//! - [`application`]: the add and package goals and their ports
//! - [`resource`]: the generic resource lifecycle (entity, module, draft),
//!   caches, the messager context and the preload registry
//! - [`cloud`]: per-family Azure façades built on [`resource`]
//!
//! ## Usage
//!
//! ```rust,no_run
//! use azkit_core::application::{AddFunctionRequest, AddFunctionService};
//! # fn demo(service: AddFunctionService, request: AddFunctionRequest) {
//! let added = service.add(&request).unwrap();
//! println!("created {}", added.path.display());
//! # }
//! ```

pub mod application;
pub mod cloud;
pub mod domain;
pub mod error;
pub mod resource;

pub mod prelude {
    pub use crate::application::{
        AddFunctionRequest, AddFunctionService, PackageRequest, PackageService,
        ports::{
            ExtensionInstaller, Filesystem, FunctionScanner, FunctionTemplateStore, Messager,
            Prompter,
        },
    };
    pub use crate::cloud::{AzureCloud, CloudConnector};
    pub use crate::domain::{BindingEnum, FunctionConfiguration, FunctionTemplate};
    pub use crate::error::{AzkitError, AzkitResult};
    pub use crate::resource::{
        Account, AzureConfiguration, CloudError, CloudResult, Draft, OperationContext, Resource,
        ResourceModule,
    };
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
