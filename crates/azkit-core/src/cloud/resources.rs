//! Resource groups and generic resource lookup (`Microsoft.Resources`).

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};

use super::Connector;

use crate::resource::{
    ArmCollection, AzureService, Buildable, CloudError, CloudResult, CollectionClient, Draft,
    Overlay, Region, ResourceId, ResourceKind, ResourceModule, ResourceStatus, overrides,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub name: String,
    pub region: Region,
    pub provisioning_state: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceGroupConfig {
    pub region: Option<Region>,
    pub tags: Option<BTreeMap<String, String>>,
}

impl Overlay<ResourceGroup> for ResourceGroupConfig {
    fn differs_from(&self, origin: Option<&ResourceGroup>) -> bool {
        overrides(&self.region, origin.map(|o| &o.region))
            || overrides(&self.tags, origin.map(|o| &o.tags))
    }
}

pub struct ResourceGroupKind;

impl ResourceKind for ResourceGroupKind {
    type Remote = ResourceGroup;
    type Config = ResourceGroupConfig;

    const FULL_TYPE: &'static str = "Microsoft.Resources/resourceGroups";
    const TYPE_NAME: &'static str = "Resource group";

    fn name_of(remote: &ResourceGroup) -> &str {
        &remote.name
    }

    // A group is its own resource group.
    fn resource_group_of(remote: &ResourceGroup) -> &str {
        &remote.name
    }

    fn status_of(remote: &ResourceGroup) -> ResourceStatus {
        ResourceStatus::from_remote(remote.provisioning_state.as_deref())
    }

    fn resource_id(subscription_id: &str, _resource_group: &str, name: &str) -> ResourceId {
        ResourceId::for_group(subscription_id, name)
    }
}

impl Buildable for ResourceGroupKind {
    fn build_create(draft: &Draft<Self>) -> CloudResult<ResourceGroup> {
        let region = draft.config().region.clone().ok_or_else(|| {
            CloudError::MissingField("'region' is required to create resource group.".into())
        })?;
        Ok(ResourceGroup {
            name: draft.name().to_string(),
            region,
            provisioning_state: None,
            tags: draft.config().tags.clone().unwrap_or_default(),
        })
    }

    fn build_update(draft: &Draft<Self>, origin: &ResourceGroup) -> CloudResult<ResourceGroup> {
        if overrides(&draft.config().region, Some(&origin.region)) {
            return Err(CloudError::Unsupported(
                "The region of a resource group cannot be changed.".into(),
            ));
        }
        let mut updated = origin.clone();
        if let Some(tags) = &draft.config().tags {
            updated.tags = tags.clone();
        }
        Ok(updated)
    }
}

/// Any ARM resource, as returned by the generic lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericResource {
    pub id: String,
    pub name: String,
    /// Free-form kind, e.g. `functionapp,linux`.
    pub kind: Option<String>,
    pub resource_type: String,
}

/// Vendor port for one subscription's resource manager.
#[cfg_attr(test, mockall::automock)]
pub trait ResourcesManager: Send + Sync {
    fn resource_groups(&self) -> Arc<dyn ArmCollection<ResourceGroup>>;

    fn generic_resource(&self, id: &str) -> CloudResult<GenericResource>;
}

pub struct ResourcesSubscription {
    manager: Arc<dyn ResourcesManager>,
    groups: Arc<ResourceModule<ResourceGroupKind>>,
}

impl ResourcesSubscription {
    pub fn new(subscription_id: &str, manager: Arc<dyn ResourcesManager>) -> Self {
        let groups = Arc::new(ResourceModule::with_client(
            "resourceGroups",
            subscription_id,
            CollectionClient::<ResourceGroupKind>::shared(manager.resource_groups()),
        ));
        Self { manager, groups }
    }

    pub fn groups(&self) -> Arc<ResourceModule<ResourceGroupKind>> {
        Arc::clone(&self.groups)
    }
}

pub struct AzureResources {
    service: AzureService<ResourcesSubscription>,
}

impl AzureResources {
    pub fn new(connector: Connector<dyn ResourcesManager>) -> Self {
        Self {
            service: AzureService::new("Microsoft.Resources", "Resource Groups", move |sub| {
                Ok(ResourcesSubscription::new(sub, connector(sub)?))
            }),
        }
    }

    pub fn service(&self) -> &AzureService<ResourcesSubscription> {
        &self.service
    }

    pub fn groups(&self, subscription_id: &str) -> CloudResult<Arc<ResourceModule<ResourceGroupKind>>> {
        Ok(self.service.get(subscription_id)?.groups())
    }

    /// Look up any resource by id in the subscription the id names.
    pub fn generic_resource(&self, id: &str) -> CloudResult<GenericResource> {
        let parsed: ResourceId = id.parse()?;
        self.service
            .get(parsed.subscription_id())?
            .manager
            .generic_resource(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{MockArmCollection, OperationContext, Page};

    fn group(name: &str) -> ResourceGroup {
        ResourceGroup {
            name: name.into(),
            region: Region::from_name("eastus"),
            provisioning_state: Some("Succeeded".into()),
            tags: BTreeMap::new(),
        }
    }

    fn resources(collection: MockArmCollection<ResourceGroup>) -> AzureResources {
        let collection: Arc<dyn ArmCollection<ResourceGroup>> = Arc::new(collection);
        AzureResources::new(Arc::new(move |_: &str| -> CloudResult<Arc<dyn ResourcesManager>> {
            let mut manager = MockResourcesManager::new();
            let groups = Arc::clone(&collection);
            manager
                .expect_resource_groups()
                .returning(move || Arc::clone(&groups));
            Ok(Arc::new(manager) as Arc<dyn ResourcesManager>)
        }))
    }

    #[test]
    fn group_create_requires_region() {
        let mut collection = MockArmCollection::new();
        collection.expect_create_or_update().never();
        let groups = resources(collection).groups("sub").unwrap();

        let draft = groups.create("rg-app", "rg-app");
        let err = groups.commit(draft, &OperationContext::default()).unwrap_err();
        assert!(matches!(err, CloudError::MissingField(_)));
    }

    #[test]
    fn listed_groups_are_keyed_by_their_own_name() {
        let mut collection = MockArmCollection::new();
        collection
            .expect_list_page()
            .returning(|_| Ok(Page::last(vec![group("rg-a"), group("rg-b")])));
        collection.expect_get().never();
        let groups = resources(collection).groups("sub").unwrap();

        assert_eq!(groups.list().unwrap().len(), 2);
        let cached = groups.get("RG-A", "rg-a").unwrap();
        assert!(cached.exists());
        assert_eq!(
            cached.id().to_string(),
            "/subscriptions/sub/resourceGroups/rg-a"
        );
    }
}
