//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to run the two build
//! goals: adding a function class and packaging a project for deployment.

pub mod add_service;
pub mod package_service;
pub mod parameters;

pub use add_service::{AddFunctionRequest, AddFunctionService, AddedFunction};
pub use package_service::{
    DEFAULT_HOST_JSON, DEFAULT_LOCAL_SETTINGS_JSON, PackageOutcome, PackageReport,
    PackageRequest, PackageService, generate_configuration, jar_artifact_id,
};
pub use parameters::{InputMode, ParameterCollector, Rule, TextInput};
