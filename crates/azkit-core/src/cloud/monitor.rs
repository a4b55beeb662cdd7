//! Log Analytics workspaces (`Microsoft.OperationalInsights`).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Connector;
use crate::resource::{
    ArmCollection, AzureService, Buildable, CloudError, CloudResult, CollectionClient, Draft,
    Overlay, Region, ResourceKind, ResourceModule, ResourceStatus, overrides,
};

const DEFAULT_SKU: &str = "PerGB2018";
const DEFAULT_RETENTION_DAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogAnalyticsWorkspace {
    pub id: String,
    pub name: String,
    pub resource_group: String,
    pub region: Region,
    pub sku: String,
    pub retention_in_days: u32,
    pub customer_id: Option<String>,
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogAnalyticsWorkspaceDraftConfig {
    pub region: Option<Region>,
    pub retention_in_days: Option<u32>,
}

impl Overlay<LogAnalyticsWorkspace> for LogAnalyticsWorkspaceDraftConfig {
    fn differs_from(&self, origin: Option<&LogAnalyticsWorkspace>) -> bool {
        overrides(&self.region, origin.map(|o| &o.region))
            || overrides(&self.retention_in_days, origin.map(|o| &o.retention_in_days))
    }
}

pub struct LogAnalyticsWorkspaceKind;

impl ResourceKind for LogAnalyticsWorkspaceKind {
    type Remote = LogAnalyticsWorkspace;
    type Config = LogAnalyticsWorkspaceDraftConfig;

    const FULL_TYPE: &'static str = "Microsoft.OperationalInsights/workspaces";
    const TYPE_NAME: &'static str = "Log Analytics workspace";

    fn name_of(remote: &LogAnalyticsWorkspace) -> &str {
        &remote.name
    }

    fn resource_group_of(remote: &LogAnalyticsWorkspace) -> &str {
        &remote.resource_group
    }

    fn status_of(remote: &LogAnalyticsWorkspace) -> ResourceStatus {
        ResourceStatus::from_remote(remote.provisioning_state.as_deref())
    }
}

impl Buildable for LogAnalyticsWorkspaceKind {
    fn build_create(draft: &Draft<Self>) -> CloudResult<LogAnalyticsWorkspace> {
        let region = draft.config().region.clone().ok_or_else(|| {
            CloudError::MissingField(
                "'region' is required to create Log Analytics workspace.".into(),
            )
        })?;
        Ok(LogAnalyticsWorkspace {
            id: Self::resource_id(draft.subscription_id(), draft.resource_group(), draft.name())
                .to_string(),
            name: draft.name().to_string(),
            resource_group: draft.resource_group().to_string(),
            region,
            sku: DEFAULT_SKU.to_string(),
            retention_in_days: draft
                .config()
                .retention_in_days
                .unwrap_or(DEFAULT_RETENTION_DAYS),
            customer_id: None,
            provisioning_state: None,
        })
    }

    fn build_update(
        draft: &Draft<Self>,
        origin: &LogAnalyticsWorkspace,
    ) -> CloudResult<LogAnalyticsWorkspace> {
        let mut updated = origin.clone();
        if let Some(days) = draft.config().retention_in_days {
            updated.retention_in_days = days;
        }
        Ok(updated)
    }
}

/// Which workspace a new Application Insights component reports to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogAnalyticsWorkspaceConfig {
    /// Create the workspace (in the default resource group) if it is missing.
    pub new_create: bool,
    pub name: String,
    /// Id of an existing workspace; used when `new_create` is false.
    pub resource_id: Option<String>,
}

impl LogAnalyticsWorkspaceConfig {
    pub fn create_new(name: impl Into<String>) -> Self {
        Self {
            new_create: true,
            name: name.into(),
            resource_id: None,
        }
    }

    pub fn existing(resource_id: impl Into<String>) -> Self {
        Self {
            new_create: false,
            name: String::new(),
            resource_id: Some(resource_id.into()),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait WorkspaceManager: Send + Sync {
    fn workspaces(&self) -> Arc<dyn ArmCollection<LogAnalyticsWorkspace>>;
}

pub struct MonitorSubscription {
    workspaces: Arc<ResourceModule<LogAnalyticsWorkspaceKind>>,
}

impl MonitorSubscription {
    pub fn new(subscription_id: &str, manager: Arc<dyn WorkspaceManager>) -> Self {
        Self {
            workspaces: Arc::new(ResourceModule::with_client(
                "workspaces",
                subscription_id,
                CollectionClient::<LogAnalyticsWorkspaceKind>::shared(manager.workspaces()),
            )),
        }
    }

    pub fn workspaces(&self) -> Arc<ResourceModule<LogAnalyticsWorkspaceKind>> {
        Arc::clone(&self.workspaces)
    }
}

pub struct AzureLogAnalyticsWorkspace {
    service: AzureService<MonitorSubscription>,
}

impl AzureLogAnalyticsWorkspace {
    pub fn new(connector: Connector<dyn WorkspaceManager>) -> Self {
        Self {
            service: AzureService::new(
                "Microsoft.OperationalInsights",
                "Log Analytics workspaces",
                move |sub| Ok(MonitorSubscription::new(sub, connector(sub)?)),
            ),
        }
    }

    pub fn service(&self) -> &AzureService<MonitorSubscription> {
        &self.service
    }

    pub fn workspaces(
        &self,
        subscription_id: &str,
    ) -> CloudResult<Arc<ResourceModule<LogAnalyticsWorkspaceKind>>> {
        Ok(self.service.get(subscription_id)?.workspaces())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{MockArmCollection, OperationContext};

    fn workspace() -> LogAnalyticsWorkspace {
        LogAnalyticsWorkspace {
            id: "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.OperationalInsights/workspaces/logs".into(),
            name: "logs".into(),
            resource_group: "rg".into(),
            region: Region::from_name("westeurope"),
            sku: DEFAULT_SKU.into(),
            retention_in_days: 30,
            customer_id: Some("c1".into()),
            provisioning_state: Some("Succeeded".into()),
        }
    }

    fn module(collection: MockArmCollection<LogAnalyticsWorkspace>) -> ResourceModule<LogAnalyticsWorkspaceKind> {
        ResourceModule::with_client(
            "workspaces",
            "sub",
            CollectionClient::<LogAnalyticsWorkspaceKind>::shared(Arc::new(collection)),
        )
    }

    #[test]
    fn unchanged_update_sends_nothing() {
        let mut collection = MockArmCollection::new();
        collection
            .expect_get()
            .returning(|_, _| Ok(Some(workspace())));
        collection.expect_create_or_update().never();
        let workspaces = module(collection);

        let existing = workspaces.get("logs", "rg").unwrap();
        let mut draft = workspaces.update(existing);
        draft.config_mut().retention_in_days = Some(30);
        assert!(!draft.is_modified());

        let committed = workspaces.commit(draft, &OperationContext::default()).unwrap();
        assert_eq!(committed.remote().unwrap().retention_in_days, 30);
    }

    #[test]
    fn retention_update_is_written_once() {
        let mut collection = MockArmCollection::new();
        collection
            .expect_get()
            .returning(|_, _| Ok(Some(workspace())));
        collection
            .expect_create_or_update()
            .times(1)
            .returning(|_, _, ws| Ok(ws));
        let workspaces = module(collection);

        let mut draft = workspaces.update(workspaces.get("logs", "rg").unwrap());
        draft.config_mut().retention_in_days = Some(90);
        let committed = workspaces.commit(draft, &OperationContext::default()).unwrap();
        assert_eq!(committed.remote().unwrap().retention_in_days, 90);
    }
}
