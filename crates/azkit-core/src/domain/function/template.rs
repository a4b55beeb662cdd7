//! Function scaffold templates and `$name$` substitution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::extension::ExtensionVersion;
use crate::domain::DomainError;

/// Key of the Java body inside [`FunctionTemplate::files`].
pub const JAVA_FILE_KEY: &str = "function.java";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_function_name: Option<String>,
    #[serde(default)]
    pub category: Vec<String>,
    /// Trigger-specific placeholders to collect, in prompt order.
    #[serde(default)]
    pub user_prompt: Vec<String>,
}

/// The binding a template is built around, e.g. `httpTrigger`/`in`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingConfiguration {
    #[serde(rename = "type")]
    pub binding_type: String,
    pub direction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionTemplate {
    pub metadata: TemplateMetadata,
    pub files: BTreeMap<String, String>,
    #[serde(default)]
    pub binding: Option<BindingConfiguration>,
    /// `None` means the template works with every host version.
    #[serde(default)]
    pub supported_extension_versions: Option<Vec<ExtensionVersion>>,
}

impl FunctionTemplate {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Whether this template can be offered for a project on `version`.
    ///
    /// Unknown on either side keeps the template.
    pub fn supports(&self, version: Option<ExtensionVersion>) -> bool {
        match (version, &self.supported_extension_versions) {
            (Some(v), Some(supported)) => supported.contains(&v),
            _ => true,
        }
    }

    pub fn java_body(&self) -> Result<&str, DomainError> {
        self.files
            .get(JAVA_FILE_KEY)
            .map(String::as_str)
            .ok_or_else(|| DomainError::MissingTemplateFile {
                template: self.metadata.name.clone(),
                file: JAVA_FILE_KEY.into(),
            })
    }
}

/// Prompt metadata for one setting of a binding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSettingTemplate {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default)]
    pub error_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingTemplate {
    #[serde(rename = "type")]
    pub binding_type: String,
    #[serde(default)]
    pub settings: Vec<FunctionSettingTemplate>,
}

impl BindingTemplate {
    pub fn setting(&self, name: &str) -> Option<&FunctionSettingTemplate> {
        self.settings.iter().find(|s| s.name == name)
    }
}

/// Fixed choices for prompts that are answered from a menu.
pub fn options_for_prompt(prompt: &str) -> Option<&'static [&'static str]> {
    let prompt = prompt.trim();
    if prompt.eq_ignore_ascii_case("authlevel") {
        Some(&["ANONYMOUS", "FUNCTION", "ADMIN"])
    } else if prompt.eq_ignore_ascii_case("createLeaseCollectionIfNotExists")
        || prompt.eq_ignore_ascii_case("createLeaseContainerIfNotExists")
    {
        Some(&["true", "false"])
    } else if prompt.eq_ignore_ascii_case("protocol") {
        Some(&["NOTSET", "PLAINTEXT", "SSL", "SASLPLAINTEXT", "SASLSSL"])
    } else if prompt.eq_ignore_ascii_case("authenticationMode") {
        Some(&["NOTSET", "GSSAPI", "PLAIN", "SCRAMSHA256", "SCRAMSHA512"])
    } else {
        None
    }
}

/// Replace every `$key$` in `body` with its value, one key at a time in map order.
///
/// Values are inserted verbatim. A value that itself contains a later
/// `$key$` token will be substituted again; unknown tokens stay as they are.
pub fn substitute_parameters<'a, I>(body: &str, params: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    params
        .into_iter()
        .fold(body.to_string(), |acc, (key, value)| {
            acc.replace(&format!("${key}$"), value)
        })
}
