//! Azure Functions project model: bindings, `function.json` configurations,
//! scaffold templates and extension bundle handling.

pub mod binding;
pub mod configuration;
pub mod extension;
pub mod template;

pub use binding::{Binding, BindingEnum, Direction};
pub use configuration::{FunctionConfiguration, LINE_ENDING};
pub use extension::{
    EXTENSION_BUNDLE_ID, EXTENSION_BUNDLE_PREVIEW_ID, ExtensionDecision, ExtensionVersion,
    SkipReason, extension_bundle_id, extension_install_decision,
};
pub use template::{
    BindingConfiguration, BindingTemplate, FunctionSettingTemplate, FunctionTemplate,
    JAVA_FILE_KEY, TemplateMetadata, options_for_prompt, substitute_parameters,
};
