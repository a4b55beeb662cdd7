//! Template catalogue compiled into the binary, with an on-disk override.
//!
//! The catalogue is two JSON documents: `templates.json` (the function
//! templates with their Java bodies) and `bindings.json` (prompt metadata per
//! binding type). [`BuiltinTemplateStore::load`] parses the embedded copies;
//! [`BuiltinTemplateStore::from_dir`] reads the same two files from a
//! directory so a custom catalogue can replace the shipped one.

use std::path::Path;

use azkit_core::{
    application::ports::FunctionTemplateStore,
    domain::{BindingTemplate, DomainError, FunctionTemplate},
    error::AzkitResult,
};
use tracing::{debug, info, instrument};

const TEMPLATES_JSON: &str = include_str!("../../resources/templates.json");
const BINDINGS_JSON: &str = include_str!("../../resources/bindings.json");

/// Parsed template catalogue.
#[derive(Debug, Clone)]
pub struct BuiltinTemplateStore {
    templates: Vec<FunctionTemplate>,
    bindings: Vec<BindingTemplate>,
}

impl BuiltinTemplateStore {
    /// The catalogue shipped with azkit.
    pub fn load() -> AzkitResult<Self> {
        Self::from_json(TEMPLATES_JSON, BINDINGS_JSON)
    }

    /// Read `templates.json` and `bindings.json` from `dir`.
    #[instrument]
    pub fn from_dir(dir: &Path) -> AzkitResult<Self> {
        let read = |file: &str| {
            let path = dir.join(file);
            std::fs::read_to_string(&path).map_err(|e| DomainError::InvalidTemplate {
                template: path.display().to_string(),
                reason: e.to_string(),
            })
        };
        let store = Self::from_json(&read("templates.json")?, &read("bindings.json")?)?;
        info!(dir = %dir.display(), count = store.templates.len(), "Loaded custom templates");
        Ok(store)
    }

    pub fn from_json(templates: &str, bindings: &str) -> AzkitResult<Self> {
        let templates: Vec<FunctionTemplate> =
            serde_json::from_str(templates).map_err(|e| DomainError::InvalidTemplate {
                template: "templates.json".into(),
                reason: e.to_string(),
            })?;
        let bindings: Vec<BindingTemplate> =
            serde_json::from_str(bindings).map_err(|e| DomainError::InvalidTemplate {
                template: "bindings.json".into(),
                reason: e.to_string(),
            })?;

        for template in &templates {
            template.java_body()?;
        }
        debug!(
            templates = templates.len(),
            bindings = bindings.len(),
            "Parsed template catalogue"
        );
        Ok(Self {
            templates,
            bindings,
        })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl FunctionTemplateStore for BuiltinTemplateStore {
    fn list(&self) -> AzkitResult<Vec<FunctionTemplate>> {
        Ok(self.templates.clone())
    }

    fn binding_template(&self, binding_type: &str) -> AzkitResult<Option<BindingTemplate>> {
        Ok(self
            .bindings
            .iter()
            .find(|b| b.binding_type.eq_ignore_ascii_case(binding_type))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azkit_core::domain::ExtensionVersion;

    #[test]
    fn embedded_catalogue_parses() {
        let store = BuiltinTemplateStore::load().unwrap();
        let names: Vec<_> = store
            .list()
            .unwrap()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert!(names.contains(&"HttpTrigger".to_string()));
        assert!(names.contains(&"KafkaTrigger".to_string()));
    }

    #[test]
    fn every_template_prompt_has_binding_metadata() {
        let store = BuiltinTemplateStore::load().unwrap();
        for template in store.list().unwrap() {
            let Some(binding) = &template.binding else {
                continue;
            };
            let settings = store
                .binding_template(&binding.binding_type)
                .unwrap()
                .unwrap_or_else(|| panic!("no bindings entry for {}", binding.binding_type));
            for prompt in &template.metadata.user_prompt {
                assert!(
                    settings.setting(prompt).is_some(),
                    "{} has no setting for {prompt}",
                    template.name()
                );
            }
        }
    }

    #[test]
    fn kafka_is_limited_to_newer_hosts() {
        let store = BuiltinTemplateStore::load().unwrap();
        let kafka = store
            .list()
            .unwrap()
            .into_iter()
            .find(|t| t.name() == "KafkaTrigger")
            .unwrap();
        assert!(kafka.supports(Some(ExtensionVersion::V4)));
        assert!(!kafka.supports(Some(ExtensionVersion::V2)));
    }

    #[test]
    fn template_without_java_body_is_rejected() {
        let templates = r#"[{"metadata":{"name":"Empty"},"files":{}}]"#;
        assert!(BuiltinTemplateStore::from_json(templates, "[]").is_err());
    }

    #[test]
    fn from_dir_reads_both_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("templates.json"),
            r#"[{"metadata":{"name":"Custom"},"files":{"function.java":"class $className$ {}"}}]"#,
        )
        .unwrap();
        std::fs::write(tmp.path().join("bindings.json"), "[]").unwrap();

        let store = BuiltinTemplateStore::from_dir(tmp.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert!(BuiltinTemplateStore::from_dir(&tmp.path().join("missing")).is_err());
    }
}
