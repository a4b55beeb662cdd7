//! Application Insights components (`Microsoft.Insights`).
//!
//! Creating a component may cascade: when asked for a new workspace the
//! client first makes sure the region's default resource group exists, then
//! creates the Log Analytics workspace in it. Any failure along the way aborts
//! the component create.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{
    Connector,
    monitor::{AzureLogAnalyticsWorkspace, LogAnalyticsWorkspaceConfig, LogAnalyticsWorkspaceKind},
    resources::{AzureResources, ResourceGroupKind},
};
use crate::resource::{
    ArmCollection, AzureService, CloudError, CloudResult, Draft, OperationContext, Overlay, Page,
    Region, ResourceClient, ResourceKind, ResourceModule, ResourceStatus, overrides,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationInsight {
    pub name: String,
    pub resource_group: String,
    pub region: Region,
    pub kind: String,
    pub instrumentation_key: Option<String>,
    pub connection_string: Option<String>,
    pub workspace_resource_id: Option<String>,
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationInsightConfig {
    pub region: Option<Region>,
    pub workspace: Option<LogAnalyticsWorkspaceConfig>,
}

// Only the region counts as a change; the workspace is used on create only.
impl Overlay<ApplicationInsight> for ApplicationInsightConfig {
    fn differs_from(&self, origin: Option<&ApplicationInsight>) -> bool {
        overrides(&self.region, origin.map(|o| &o.region))
    }
}

pub struct ApplicationInsightKind;

impl ResourceKind for ApplicationInsightKind {
    type Remote = ApplicationInsight;
    type Config = ApplicationInsightConfig;

    const FULL_TYPE: &'static str = "Microsoft.Insights/components";
    const TYPE_NAME: &'static str = "Application Insights";

    fn name_of(remote: &ApplicationInsight) -> &str {
        &remote.name
    }

    fn resource_group_of(remote: &ApplicationInsight) -> &str {
        &remote.resource_group
    }

    fn status_of(remote: &ApplicationInsight) -> ResourceStatus {
        ResourceStatus::from_remote(remote.provisioning_state.as_deref())
    }
}

impl Draft<ApplicationInsightKind> {
    /// Staged region, otherwise the origin's.
    pub fn region(&self) -> Option<Region> {
        self.config()
            .region
            .clone()
            .or_else(|| self.from_origin(|o| Some(o.region.clone())))
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait InsightsManager: Send + Sync {
    fn components(&self) -> Arc<dyn ArmCollection<ApplicationInsight>>;
}

pub struct InsightsClient {
    components: Arc<dyn ArmCollection<ApplicationInsight>>,
    groups: Arc<ResourceModule<ResourceGroupKind>>,
    workspaces: Arc<ResourceModule<LogAnalyticsWorkspaceKind>>,
}

impl InsightsClient {
    pub fn new(
        components: Arc<dyn ArmCollection<ApplicationInsight>>,
        groups: Arc<ResourceModule<ResourceGroupKind>>,
        workspaces: Arc<ResourceModule<LogAnalyticsWorkspaceKind>>,
    ) -> Self {
        Self {
            components,
            groups,
            workspaces,
        }
    }

    /// Id of the workspace the component should report to, creating it first
    /// when asked to.
    #[instrument(skip_all, fields(workspace = %config.name))]
    fn workspace_id(
        &self,
        config: &LogAnalyticsWorkspaceConfig,
        region: &Region,
        ctx: &OperationContext,
    ) -> CloudResult<Option<String>> {
        if !config.new_create {
            return Ok(config.resource_id.clone());
        }

        let group_name = format!("DefaultResourceGroup-{}", region.abbreviation());
        if let Err(mut draft) = self.groups.get_or_draft(&group_name, &group_name)? {
            debug!(group = %group_name, "Creating default resource group");
            draft.config_mut().region = Some(region.clone());
            self.groups.create_if_not_exist(draft, ctx)?;
        }

        let mut draft = self.workspaces.create(&config.name, &group_name);
        draft.config_mut().region = Some(region.clone());
        let workspace = self.workspaces.create_if_not_exist(draft, ctx)?;
        Ok(Some(workspace.id().to_string()))
    }
}

impl ResourceClient<ApplicationInsightKind> for InsightsClient {
    fn list_page(&self, continuation: Option<&str>) -> CloudResult<Page<ApplicationInsight>> {
        self.components.list_page(continuation)
    }

    fn get(&self, name: &str, resource_group: &str) -> CloudResult<Option<ApplicationInsight>> {
        self.components.get(resource_group, name)
    }

    fn delete(&self, name: &str, resource_group: &str) -> CloudResult<()> {
        self.components.delete(resource_group, name)
    }

    fn create(
        &self,
        draft: &Draft<ApplicationInsightKind>,
        ctx: &OperationContext,
    ) -> CloudResult<ApplicationInsight> {
        let region = draft.region().ok_or_else(|| {
            CloudError::MissingField("'region' is required to create Application Insights.".into())
        })?;
        let workspace_resource_id = match &draft.config().workspace {
            Some(config) => self.workspace_id(config, &region, ctx)?,
            None => None,
        };

        ctx.messager().info(&format!(
            "Start creating Application Insights ({})...",
            draft.name()
        ));
        let created = self.components.create_or_update(
            draft.resource_group(),
            draft.name(),
            ApplicationInsight {
                name: draft.name().to_string(),
                resource_group: draft.resource_group().to_string(),
                region,
                kind: "web".into(),
                instrumentation_key: None,
                connection_string: None,
                workspace_resource_id,
                provisioning_state: None,
            },
        )?;
        ctx.messager().success(&format!(
            "Application Insights ({}) is successfully created.",
            draft.name()
        ));
        Ok(created)
    }

    fn update(
        &self,
        _draft: &Draft<ApplicationInsightKind>,
        _origin: &ApplicationInsight,
        _ctx: &OperationContext,
    ) -> CloudResult<ApplicationInsight> {
        Err(CloudError::Unsupported("not supported".into()))
    }
}

pub struct InsightsSubscription {
    components: Arc<ResourceModule<ApplicationInsightKind>>,
}

impl InsightsSubscription {
    pub fn components(&self) -> Arc<ResourceModule<ApplicationInsightKind>> {
        Arc::clone(&self.components)
    }
}

pub struct AzureApplicationInsights {
    service: AzureService<InsightsSubscription>,
}

impl AzureApplicationInsights {
    pub fn new(
        connector: Connector<dyn InsightsManager>,
        resources: Arc<AzureResources>,
        workspaces: Arc<AzureLogAnalyticsWorkspace>,
    ) -> Self {
        Self {
            service: AzureService::new("Microsoft.Insights", "Application Insights", move |sub| {
                let client: Arc<dyn ResourceClient<ApplicationInsightKind>> =
                    Arc::new(InsightsClient::new(
                        connector(sub)?.components(),
                        resources.groups(sub)?,
                        workspaces.workspaces(sub)?,
                    ));
                Ok(InsightsSubscription {
                    components: Arc::new(ResourceModule::with_client("components", sub, client)),
                })
            }),
        }
    }

    pub fn service(&self) -> &AzureService<InsightsSubscription> {
        &self.service
    }

    pub fn application_insights(
        &self,
        subscription_id: &str,
    ) -> CloudResult<Arc<ResourceModule<ApplicationInsightKind>>> {
        Ok(self.service.get(subscription_id)?.components())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::{
        monitor::{LogAnalyticsWorkspace, MockWorkspaceManager, WorkspaceManager},
        resources::{MockResourcesManager, ResourceGroup, ResourcesManager},
    };
    use crate::resource::MockArmCollection;

    fn resources(groups: MockArmCollection<ResourceGroup>) -> Arc<AzureResources> {
        let groups: Arc<dyn ArmCollection<ResourceGroup>> = Arc::new(groups);
        Arc::new(AzureResources::new(Arc::new(
            move |_: &str| -> CloudResult<Arc<dyn ResourcesManager>> {
                let mut manager = MockResourcesManager::new();
                let groups = Arc::clone(&groups);
                manager
                    .expect_resource_groups()
                    .returning(move || Arc::clone(&groups));
                Ok(Arc::new(manager))
            },
        )))
    }

    fn workspaces(
        collection: MockArmCollection<LogAnalyticsWorkspace>,
    ) -> Arc<AzureLogAnalyticsWorkspace> {
        let collection: Arc<dyn ArmCollection<LogAnalyticsWorkspace>> = Arc::new(collection);
        Arc::new(AzureLogAnalyticsWorkspace::new(Arc::new(
            move |_: &str| -> CloudResult<Arc<dyn WorkspaceManager>> {
                let mut manager = MockWorkspaceManager::new();
                let collection = Arc::clone(&collection);
                manager
                    .expect_workspaces()
                    .returning(move || Arc::clone(&collection));
                Ok(Arc::new(manager))
            },
        )))
    }

    fn insights(
        components: MockArmCollection<ApplicationInsight>,
        groups: MockArmCollection<ResourceGroup>,
        ws: MockArmCollection<LogAnalyticsWorkspace>,
    ) -> Arc<ResourceModule<ApplicationInsightKind>> {
        let components: Arc<dyn ArmCollection<ApplicationInsight>> = Arc::new(components);
        let service = AzureApplicationInsights::new(
            Arc::new(move |_: &str| -> CloudResult<Arc<dyn InsightsManager>> {
                let mut manager = MockInsightsManager::new();
                let components = Arc::clone(&components);
                manager
                    .expect_components()
                    .returning(move || Arc::clone(&components));
                Ok(Arc::new(manager))
            }),
            resources(groups),
            workspaces(ws),
        );
        service.application_insights("sub").unwrap()
    }

    #[test]
    fn create_requires_region() {
        let mut components = MockArmCollection::new();
        components.expect_create_or_update().never();
        let module = insights(components, MockArmCollection::new(), MockArmCollection::new());

        let err = module
            .commit(module.create("ai", "rg"), &OperationContext::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "'region' is required to create Application Insights."
        );
    }

    #[test]
    fn new_workspace_cascades_through_default_group() {
        let mut groups = MockArmCollection::new();
        groups.expect_get().returning(|_, _| Ok(None));
        groups
            .expect_create_or_update()
            .withf(|rg, name, _| rg == "DefaultResourceGroup-EUS" && name == "DefaultResourceGroup-EUS")
            .times(1)
            .returning(|_, _, group| Ok(group));

        let mut ws = MockArmCollection::new();
        ws.expect_get().returning(|_, _| Ok(None));
        ws.expect_create_or_update()
            .times(1)
            .returning(|_, _, workspace| Ok(workspace));

        let mut components = MockArmCollection::new();
        components
            .expect_create_or_update()
            .withf(|_, _, ai: &ApplicationInsight| {
                ai.kind == "web"
                    && ai.workspace_resource_id.as_deref()
                        == Some("/subscriptions/sub/resourceGroups/DefaultResourceGroup-EUS/providers/Microsoft.OperationalInsights/workspaces/logs")
            })
            .times(1)
            .returning(|_, _, ai| Ok(ai));

        let module = insights(components, groups, ws);
        let mut draft = module.create("ai", "rg");
        draft.config_mut().region = Some(Region::from_name("eastus"));
        draft.config_mut().workspace = Some(LogAnalyticsWorkspaceConfig::create_new("logs"));

        let created = module.commit(draft, &OperationContext::default()).unwrap();
        assert!(created.exists());
    }

    #[test]
    fn cascade_failure_aborts_the_create() {
        let mut groups = MockArmCollection::new();
        groups.expect_get().returning(|_, _| Ok(None));
        groups
            .expect_create_or_update()
            .returning(|_, _, _| Err(CloudError::http(403, "forbidden")));

        let mut components = MockArmCollection::new();
        components.expect_create_or_update().never();

        let module = insights(components, groups, MockArmCollection::new());
        let mut draft = module.create("ai", "rg");
        draft.config_mut().region = Some(Region::from_name("eastus"));
        draft.config_mut().workspace = Some(LogAnalyticsWorkspaceConfig::create_new("logs"));

        let err = module.commit(draft, &OperationContext::default()).unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert!(!module.get("ai", "rg").unwrap().exists());
    }

    #[test]
    fn update_is_not_supported() {
        let mut components = MockArmCollection::new();
        components.expect_get().returning(|rg, name| {
            Ok(Some(ApplicationInsight {
                name: name.into(),
                resource_group: rg.into(),
                region: Region::from_name("eastus"),
                kind: "web".into(),
                instrumentation_key: None,
                connection_string: None,
                workspace_resource_id: None,
                provisioning_state: None,
            }))
        });
        let module = insights(components, MockArmCollection::new(), MockArmCollection::new());

        let mut draft = module.update(module.get("ai", "rg").unwrap());
        assert_eq!(draft.region(), Some(Region::from_name("eastus")));
        draft.config_mut().region = Some(Region::from_name("westus"));
        assert_eq!(draft.region(), Some(Region::from_name("westus")));
        assert!(draft.is_modified());
        let err = module.commit(draft, &OperationContext::default()).unwrap_err();
        assert!(matches!(err, CloudError::Unsupported(_)));
    }
}
