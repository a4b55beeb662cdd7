//! Sites shared by web apps and function apps.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::resource::{
    Buildable, CloudError, CloudResult, Draft, Overlay, Region, ResourceKind, ResourceStatus,
    overrides,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSite {
    pub name: String,
    pub resource_group: String,
    pub region: Region,
    /// Free-form site kind, e.g. `app,linux` or `functionapp`.
    pub kind: String,
    pub app_service_plan_id: Option<String>,
    pub runtime: Option<String>,
    #[serde(default)]
    pub app_settings: BTreeMap<String, String>,
    pub default_host_name: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebSiteConfig {
    pub region: Option<Region>,
    pub app_service_plan_id: Option<String>,
    pub runtime: Option<String>,
    /// Settings to add or overwrite.
    pub app_settings: Option<BTreeMap<String, String>>,
    pub app_settings_to_remove: BTreeSet<String>,
}

impl Overlay<WebSite> for WebSiteConfig {
    fn differs_from(&self, origin: Option<&WebSite>) -> bool {
        let settings_changed = self.app_settings.as_ref().is_some_and(|settings| {
            settings
                .iter()
                .any(|(k, v)| origin.and_then(|o| o.app_settings.get(k)) != Some(v))
        });
        let settings_removed = self
            .app_settings_to_remove
            .iter()
            .any(|k| origin.is_some_and(|o| o.app_settings.contains_key(k)));

        settings_changed
            || settings_removed
            || overrides(&self.region, origin.map(|o| &o.region))
            || overrides(
                &self.app_service_plan_id,
                origin.and_then(|o| o.app_service_plan_id.as_ref()),
            )
            || overrides(&self.runtime, origin.and_then(|o| o.runtime.as_ref()))
    }
}

pub(super) fn build_site(
    name: &str,
    resource_group: &str,
    config: &WebSiteConfig,
    kind: &str,
    type_name: &str,
) -> CloudResult<WebSite> {
    let region = config.region.clone().ok_or_else(|| {
        CloudError::MissingField(format!("'region' is required to create {type_name}."))
    })?;
    let plan = config.app_service_plan_id.clone().ok_or_else(|| {
        CloudError::MissingField(format!("'app service plan' is required to create {type_name}."))
    })?;
    Ok(WebSite {
        name: name.to_string(),
        resource_group: resource_group.to_string(),
        region,
        kind: kind.to_string(),
        app_service_plan_id: Some(plan),
        runtime: config.runtime.clone(),
        app_settings: config.app_settings.clone().unwrap_or_default(),
        default_host_name: None,
        state: None,
    })
}

pub(super) fn update_site(config: &WebSiteConfig, origin: &WebSite) -> WebSite {
    let mut updated = origin.clone();
    if let Some(plan) = &config.app_service_plan_id {
        updated.app_service_plan_id = Some(plan.clone());
    }
    if let Some(runtime) = &config.runtime {
        updated.runtime = Some(runtime.clone());
    }
    if let Some(settings) = &config.app_settings {
        updated
            .app_settings
            .extend(settings.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    for key in &config.app_settings_to_remove {
        updated.app_settings.remove(key);
    }
    updated
}

pub struct WebAppKind;

impl ResourceKind for WebAppKind {
    type Remote = WebSite;
    type Config = WebSiteConfig;

    const FULL_TYPE: &'static str = "Microsoft.Web/sites";
    const TYPE_NAME: &'static str = "Web App";

    fn name_of(remote: &WebSite) -> &str {
        &remote.name
    }

    fn resource_group_of(remote: &WebSite) -> &str {
        &remote.resource_group
    }

    fn status_of(remote: &WebSite) -> ResourceStatus {
        ResourceStatus::from_remote(remote.state.as_deref())
    }
}

impl Buildable for WebAppKind {
    fn build_create(draft: &Draft<Self>) -> CloudResult<WebSite> {
        build_site(draft.name(), draft.resource_group(), draft.config(), "app", Self::TYPE_NAME)
    }

    fn build_update(draft: &Draft<Self>, origin: &WebSite) -> CloudResult<WebSite> {
        Ok(update_site(draft.config(), origin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> WebSite {
        WebSite {
            name: "web".into(),
            resource_group: "rg".into(),
            region: Region::from_name("eastus"),
            kind: "app".into(),
            app_service_plan_id: Some("plan".into()),
            runtime: Some("java|17".into()),
            app_settings: BTreeMap::from([("A".to_string(), "1".to_string())]),
            default_host_name: None,
            state: Some("Running".into()),
        }
    }

    #[test]
    fn setting_changes_are_detected() {
        let same = WebSiteConfig {
            app_settings: Some(BTreeMap::from([("A".to_string(), "1".to_string())])),
            ..Default::default()
        };
        assert!(!same.differs_from(Some(&site())));

        let removed = WebSiteConfig {
            app_settings_to_remove: BTreeSet::from(["A".to_string()]),
            ..Default::default()
        };
        assert!(removed.differs_from(Some(&site())));
        assert!(update_site(&removed, &site()).app_settings.is_empty());
    }

    #[test]
    fn running_sites_are_active() {
        assert_eq!(WebAppKind::status_of(&site()), ResourceStatus::Active);
        let stopped = WebSite {
            state: Some("Stopped".into()),
            ..site()
        };
        assert_eq!(
            WebAppKind::status_of(&stopped),
            ResourceStatus::Custom("Stopped".into())
        );
    }
}
