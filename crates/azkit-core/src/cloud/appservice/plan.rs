use serde::{Deserialize, Serialize};

use crate::resource::{
    Buildable, CloudError, CloudResult, Draft, Overlay, Region, ResourceKind, ResourceStatus,
    overrides,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OperatingSystem {
    #[default]
    Linux,
    Windows,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppServicePlan {
    pub name: String,
    pub resource_group: String,
    pub region: Region,
    pub operating_system: OperatingSystem,
    /// e.g. `B1`, `P1v3`, `Y1` (consumption)
    pub pricing_tier: String,
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppServicePlanConfig {
    pub region: Option<Region>,
    pub operating_system: Option<OperatingSystem>,
    pub pricing_tier: Option<String>,
}

impl Overlay<AppServicePlan> for AppServicePlanConfig {
    fn differs_from(&self, origin: Option<&AppServicePlan>) -> bool {
        overrides(&self.region, origin.map(|o| &o.region))
            || overrides(&self.operating_system, origin.map(|o| &o.operating_system))
            || overrides(&self.pricing_tier, origin.map(|o| &o.pricing_tier))
    }
}

pub struct AppServicePlanKind;

impl ResourceKind for AppServicePlanKind {
    type Remote = AppServicePlan;
    type Config = AppServicePlanConfig;

    const FULL_TYPE: &'static str = "Microsoft.Web/serverfarms";
    const TYPE_NAME: &'static str = "App Service plan";

    fn name_of(remote: &AppServicePlan) -> &str {
        &remote.name
    }

    fn resource_group_of(remote: &AppServicePlan) -> &str {
        &remote.resource_group
    }

    fn status_of(remote: &AppServicePlan) -> ResourceStatus {
        ResourceStatus::from_remote(remote.provisioning_state.as_deref())
    }
}

impl Buildable for AppServicePlanKind {
    fn build_create(draft: &Draft<Self>) -> CloudResult<AppServicePlan> {
        let config = draft.config();
        let region = config.region.clone().ok_or_else(|| {
            CloudError::MissingField("'region' is required to create App Service plan.".into())
        })?;
        let pricing_tier = config.pricing_tier.clone().ok_or_else(|| {
            CloudError::MissingField("'pricing tier' is required to create App Service plan.".into())
        })?;
        Ok(AppServicePlan {
            name: draft.name().to_string(),
            resource_group: draft.resource_group().to_string(),
            region,
            operating_system: config.operating_system.unwrap_or_default(),
            pricing_tier,
            provisioning_state: None,
        })
    }

    fn build_update(draft: &Draft<Self>, origin: &AppServicePlan) -> CloudResult<AppServicePlan> {
        let config = draft.config();
        if overrides(&config.operating_system, Some(&origin.operating_system)) {
            return Err(CloudError::Unsupported(
                "The operating system of an App Service plan cannot be changed.".into(),
            ));
        }
        let mut updated = origin.clone();
        if let Some(tier) = &config.pricing_tier {
            updated.pricing_tier = tier.clone();
        }
        Ok(updated)
    }
}
