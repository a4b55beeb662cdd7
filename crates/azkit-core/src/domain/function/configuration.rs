use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::binding::{Binding, BindingEnum};
use crate::domain::DomainError;

/// Line terminator used for every generated descriptor.
pub const LINE_ENDING: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// In-memory form of one `function.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,
    pub bindings: Vec<Binding>,
}

impl FunctionConfiguration {
    pub fn new(entry_point: impl Into<String>) -> Self {
        Self {
            script_file: None,
            entry_point: Some(entry_point.into()),
            bindings: Vec::new(),
        }
    }

    pub fn triggers(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter().filter(|b| b.is_trigger())
    }

    pub fn binding_kinds(&self) -> impl Iterator<Item = BindingEnum> + '_ {
        self.bindings.iter().filter_map(Binding::kind)
    }

    /// Check the configuration generated for `function` before it is written.
    pub fn validate(&self, function: &str) -> Result<(), DomainError> {
        let invalid = |reason: String| DomainError::InvalidConfiguration {
            function: function.to_string(),
            reason,
        };

        if self.entry_point.as_deref().is_none_or(str::is_empty) {
            return Err(invalid("entry point is not specified".into()));
        }

        match self.triggers().count() {
            0 => return Err(invalid("missing required trigger annotation".into())),
            1 => {}
            n => {
                return Err(invalid(format!(
                    "only one trigger is allowed per function, found {n}"
                )));
            }
        }

        let mut seen = HashSet::new();
        for binding in &self.bindings {
            if binding.name.trim().is_empty() {
                return Err(invalid(format!(
                    "binding of type '{}' has an empty name",
                    binding.binding_type
                )));
            }
            if !seen.insert(binding.name.as_str()) {
                return Err(invalid(format!(
                    "binding name '{}' is used more than once",
                    binding.name
                )));
            }
        }

        Ok(())
    }

    /// Pretty JSON with null fields omitted and platform line endings.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string_pretty(self)?;
        Ok(if LINE_ENDING == "\n" {
            json
        } else {
            json.replace('\n', LINE_ENDING)
        })
    }
}
