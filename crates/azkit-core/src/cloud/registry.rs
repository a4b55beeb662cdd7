//! Container registries and their repositories (`Microsoft.ContainerRegistry`).

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Connector;
use crate::resource::{
    ArmCollection, AzureService, Buildable, CloudError, CloudResult, CollectionClient, Draft,
    OperationContext, Overlay, Page, Region, ResourceClient, ResourceKind, ResourceModule,
    ResourceStatus, overrides,
};

const DEFAULT_SKU: &str = "Basic";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerRegistry {
    pub name: String,
    pub resource_group: String,
    pub region: Region,
    pub login_server: String,
    pub sku: String,
    pub admin_user_enabled: bool,
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerRegistryConfig {
    pub region: Option<Region>,
    pub sku: Option<String>,
    pub admin_user_enabled: Option<bool>,
}

impl Overlay<ContainerRegistry> for ContainerRegistryConfig {
    fn differs_from(&self, origin: Option<&ContainerRegistry>) -> bool {
        overrides(&self.region, origin.map(|o| &o.region))
            || overrides(&self.sku, origin.map(|o| &o.sku))
            || overrides(&self.admin_user_enabled, origin.map(|o| &o.admin_user_enabled))
    }
}

pub struct ContainerRegistryKind;

impl ResourceKind for ContainerRegistryKind {
    type Remote = ContainerRegistry;
    type Config = ContainerRegistryConfig;

    const FULL_TYPE: &'static str = "Microsoft.ContainerRegistry/registries";
    const TYPE_NAME: &'static str = "Container Registry";

    fn name_of(remote: &ContainerRegistry) -> &str {
        &remote.name
    }

    fn resource_group_of(remote: &ContainerRegistry) -> &str {
        &remote.resource_group
    }

    fn status_of(remote: &ContainerRegistry) -> ResourceStatus {
        ResourceStatus::from_remote(remote.provisioning_state.as_deref())
    }
}

impl Buildable for ContainerRegistryKind {
    fn build_create(draft: &Draft<Self>) -> CloudResult<ContainerRegistry> {
        let config = draft.config();
        let region = config.region.clone().ok_or_else(|| {
            CloudError::MissingField("'region' is required to create Container Registry.".into())
        })?;
        Ok(ContainerRegistry {
            name: draft.name().to_string(),
            resource_group: draft.resource_group().to_string(),
            region,
            login_server: format!("{}.azurecr.io", draft.name().to_lowercase()),
            sku: config.sku.clone().unwrap_or_else(|| DEFAULT_SKU.into()),
            admin_user_enabled: config.admin_user_enabled.unwrap_or(false),
            provisioning_state: None,
        })
    }

    fn build_update(draft: &Draft<Self>, origin: &ContainerRegistry) -> CloudResult<ContainerRegistry> {
        let config = draft.config();
        let mut updated = origin.clone();
        if let Some(sku) = &config.sku {
            updated.sku = sku.clone();
        }
        if let Some(enabled) = config.admin_user_enabled {
            updated.admin_user_enabled = enabled;
        }
        Ok(updated)
    }
}

/// Properties of one repository as reported by the registry data plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryProperties {
    pub name: String,
    pub tag_count: u32,
    pub manifest_count: u32,
    pub last_updated_on: Option<DateTime<Utc>>,
}

/// A repository inside one registry.
///
/// Repositories live in the registry's data plane and have no ARM id of their
/// own; [`Resource::id`](crate::resource::Resource::id) is only unique within
/// one registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub registry: String,
    pub resource_group: String,
    #[serde(flatten)]
    pub properties: RepositoryProperties,
}

pub struct RepositoryKind;

impl ResourceKind for RepositoryKind {
    type Remote = Repository;
    type Config = ();

    const FULL_TYPE: &'static str = "Microsoft.ContainerRegistry/repositories";
    const TYPE_NAME: &'static str = "Repository";

    fn name_of(remote: &Repository) -> &str {
        &remote.properties.name
    }

    fn resource_group_of(remote: &Repository) -> &str {
        &remote.resource_group
    }
}

/// Data-plane client of one registry, reached through its login server.
#[cfg_attr(test, mockall::automock)]
pub trait RepositoryClient: Send + Sync {
    fn list_repository_names<'a>(&self, continuation: Option<&'a str>) -> CloudResult<Page<String>>;

    fn get_repository(&self, name: &str) -> CloudResult<Option<RepositoryProperties>>;

    fn delete_repository(&self, name: &str) -> CloudResult<()>;
}

#[cfg_attr(test, mockall::automock)]
pub trait RegistryManager: Send + Sync {
    fn registries(&self) -> Arc<dyn ArmCollection<ContainerRegistry>>;

    fn repository_client(&self, login_server: &str) -> CloudResult<Arc<dyn RepositoryClient>>;
}

struct RepositoryModuleClient {
    client: Arc<dyn RepositoryClient>,
    registry: String,
    resource_group: String,
}

impl RepositoryModuleClient {
    fn wrap(&self, properties: RepositoryProperties) -> Repository {
        Repository {
            registry: self.registry.clone(),
            resource_group: self.resource_group.clone(),
            properties,
        }
    }
}

impl ResourceClient<RepositoryKind> for RepositoryModuleClient {
    fn list_page(&self, continuation: Option<&str>) -> CloudResult<Page<Repository>> {
        let names = self.client.list_repository_names(continuation)?;
        let mut items = Vec::with_capacity(names.items.len());
        for name in &names.items {
            if let Some(properties) = self.client.get_repository(name)? {
                items.push(self.wrap(properties));
            }
        }
        Ok(Page {
            items,
            continuation: names.continuation,
        })
    }

    fn get(&self, name: &str, _resource_group: &str) -> CloudResult<Option<Repository>> {
        Ok(self.client.get_repository(name)?.map(|p| self.wrap(p)))
    }

    fn delete(&self, name: &str, _resource_group: &str) -> CloudResult<()> {
        self.client.delete_repository(name)
    }

    fn create(&self, _draft: &Draft<RepositoryKind>, _ctx: &OperationContext) -> CloudResult<Repository> {
        Err(CloudError::Unsupported(
            "Repositories are created by pushing an image to the registry.".into(),
        ))
    }

    fn update(
        &self,
        _draft: &Draft<RepositoryKind>,
        origin: &Repository,
        _ctx: &OperationContext,
    ) -> CloudResult<Repository> {
        Ok(origin.clone())
    }
}

type RegistryKey = (String, String);

pub struct ContainerRegistrySubscription {
    subscription_id: String,
    manager: Arc<dyn RegistryManager>,
    registries: Arc<ResourceModule<ContainerRegistryKind>>,
    repositories: RwLock<HashMap<RegistryKey, Arc<ResourceModule<RepositoryKind>>>>,
}

impl ContainerRegistrySubscription {
    pub fn new(subscription_id: &str, manager: Arc<dyn RegistryManager>) -> Self {
        let registries = Arc::new(ResourceModule::with_client(
            "registries",
            subscription_id,
            CollectionClient::<ContainerRegistryKind>::shared(manager.registries()),
        ));
        Self {
            subscription_id: subscription_id.to_string(),
            manager,
            registries,
            repositories: RwLock::new(HashMap::new()),
        }
    }

    pub fn registries(&self) -> Arc<ResourceModule<ContainerRegistryKind>> {
        Arc::clone(&self.registries)
    }

    /// Repositories of one registry. The module is empty while the registry
    /// does not exist.
    pub fn repositories(&self, registry: &str, resource_group: &str) -> Arc<ResourceModule<RepositoryKind>> {
        let key = (registry.to_lowercase(), resource_group.to_lowercase());
        if let Some(module) = self.repositories.read().get(&key) {
            return Arc::clone(module);
        }

        let registries = Arc::clone(&self.registries);
        let manager = Arc::clone(&self.manager);
        let (name, group) = (registry.to_string(), resource_group.to_string());
        let module = Arc::new(ResourceModule::new(
            "repositories",
            &self.subscription_id,
            move || {
                let parent = registries.get(&name, &group)?;
                let login_server = parent
                    .with_remote(|r| r.login_server.clone())
                    .filter(|_| parent.exists());
                let Some(login_server) = login_server else {
                    debug!(registry = %name, "Registry does not exist");
                    return Ok(None);
                };
                let client: Arc<dyn ResourceClient<RepositoryKind>> =
                    Arc::new(RepositoryModuleClient {
                        client: manager.repository_client(&login_server)?,
                        registry: name.clone(),
                        resource_group: group.clone(),
                    });
                Ok(Some(client))
            },
        ));
        Arc::clone(self.repositories.write().entry(key).or_insert(module))
    }
}

pub struct AzureContainerRegistry {
    service: AzureService<ContainerRegistrySubscription>,
}

impl AzureContainerRegistry {
    pub fn new(connector: Connector<dyn RegistryManager>) -> Self {
        Self {
            service: AzureService::new(
                "Microsoft.ContainerRegistry",
                "Container Registries",
                move |sub| Ok(ContainerRegistrySubscription::new(sub, connector(sub)?)),
            ),
        }
    }

    pub fn service(&self) -> &AzureService<ContainerRegistrySubscription> {
        &self.service
    }

    pub fn registries(
        &self,
        subscription_id: &str,
    ) -> CloudResult<Arc<ResourceModule<ContainerRegistryKind>>> {
        Ok(self.service.get(subscription_id)?.registries())
    }

    pub fn repositories(
        &self,
        subscription_id: &str,
        registry: &str,
        resource_group: &str,
    ) -> CloudResult<Arc<ResourceModule<RepositoryKind>>> {
        Ok(self
            .service
            .get(subscription_id)?
            .repositories(registry, resource_group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MockArmCollection;

    fn registry(name: &str) -> ContainerRegistry {
        ContainerRegistry {
            name: name.into(),
            resource_group: "rg".into(),
            region: Region::from_name("eastus"),
            login_server: format!("{name}.azurecr.io"),
            sku: "Basic".into(),
            admin_user_enabled: false,
            provisioning_state: Some("Succeeded".into()),
        }
    }

    fn subscription(registries: MockArmCollection<ContainerRegistry>) -> ContainerRegistrySubscription {
        let registries: Arc<dyn ArmCollection<ContainerRegistry>> = Arc::new(registries);
        let mut manager = MockRegistryManager::new();
        manager
            .expect_registries()
            .returning(move || Arc::clone(&registries));
        manager.expect_repository_client().returning(|login| {
            assert_eq!(login, "acr1.azurecr.io");
            let mut client = MockRepositoryClient::new();
            client
                .expect_list_repository_names()
                .returning(|_| Ok(Page::last(vec!["web".into(), "gone".into()])));
            client.expect_get_repository().returning(|name| {
                Ok((name == "web").then(|| RepositoryProperties {
                    name: name.into(),
                    tag_count: 3,
                    manifest_count: 3,
                    last_updated_on: None,
                }))
            });
            Ok(Arc::new(client) as Arc<dyn RepositoryClient>)
        });
        ContainerRegistrySubscription::new("sub", Arc::new(manager))
    }

    #[test]
    fn repositories_of_a_missing_registry_are_empty() {
        let mut registries = MockArmCollection::new();
        registries.expect_get().returning(|_, _| Ok(None));
        let sub = subscription(registries);

        let repositories = sub.repositories("nope", "rg");
        assert!(repositories.list().unwrap().is_empty());
        assert!(!repositories.get("web", "rg").unwrap().exists());

        let err = repositories
            .commit(repositories.create("web", "rg"), &OperationContext::default())
            .unwrap_err();
        assert!(matches!(err, CloudError::ParentMissing { .. }));
    }

    #[test]
    fn repositories_are_listed_through_the_login_server() {
        let mut registries = MockArmCollection::new();
        registries
            .expect_get()
            .returning(|_, name| Ok(Some(registry(name))));
        let sub = subscription(registries);

        let repositories = sub.repositories("acr1", "rg");
        assert!(Arc::ptr_eq(&repositories, &sub.repositories("ACR1", "RG")));

        let listed = repositories.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].remote().unwrap().properties.tag_count, 3);

        let err = repositories
            .commit(repositories.create("new", "rg"), &OperationContext::default())
            .unwrap_err();
        assert!(matches!(err, CloudError::Unsupported(_)));
    }

    #[test]
    fn registry_create_defaults_sku_and_login_server() {
        let mut draft = ResourceModule::<ContainerRegistryKind>::with_client(
            "registries",
            "sub",
            CollectionClient::<ContainerRegistryKind>::shared(Arc::new(MockArmCollection::new())),
        )
        .create("MyAcr", "rg");
        draft.config_mut().region = Some(Region::from_name("eastus"));

        let payload = ContainerRegistryKind::build_create(&draft).unwrap();
        assert_eq!(payload.sku, "Basic");
        assert_eq!(payload.login_server, "myacr.azurecr.io");
    }
}
