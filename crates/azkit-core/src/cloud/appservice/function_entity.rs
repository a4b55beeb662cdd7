use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const HTTP_TRIGGER: &str = "httptrigger";

/// One function deployed inside a function app.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEntity {
    pub name: String,
    pub function_app_id: String,
    pub trigger_id: Option<String>,
    pub script_file: Option<String>,
    pub entry_point: Option<String>,
    pub trigger_url: Option<String>,
    #[serde(default)]
    pub bindings: Vec<BindingEntity>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BindingEntity {
    #[serde(rename = "type")]
    pub binding_type: String,
    pub direction: String,
    pub name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl BindingEntity {
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

impl FunctionEntity {
    /// The first inbound binding whose type mentions "trigger".
    pub fn trigger(&self) -> Option<&BindingEntity> {
        self.bindings.iter().find(|b| {
            b.direction.eq_ignore_ascii_case("in")
                && b.binding_type.to_lowercase().contains("trigger")
        })
    }

    pub fn is_http_trigger(&self) -> bool {
        self.trigger()
            .and_then(|t| t.property("type"))
            .is_some_and(|t| t.eq_ignore_ascii_case(HTTP_TRIGGER))
    }
}
