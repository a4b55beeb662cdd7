//! In-memory stand-in for the Azure management APIs.
//!
//! [`InMemoryCloud`] implements [`CloudConnector`] and [`SubscriptionManager`];
//! each registered subscription is an [`InMemorySubscription`] that implements
//! every family's manager port over [`InMemoryCollection`]s. Writes stamp the
//! fields the real service would assign (provisioning state, host names,
//! instrumentation keys).

mod collection;

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use azkit_core::{
    cloud::{
        AppServiceManager, CloudConnector, GenericResource, InsightsManager, MySqlManager,
        NetworkManager, RegistryManager, RepositoryClient, ResourcesManager, WorkspaceManager,
        appservice::{
            AppServicePlan, AppServicePlanKind, FunctionAppKind, FunctionEntity, WebAppKind,
            WebSite,
        },
        insights::{ApplicationInsight, ApplicationInsightKind},
        monitor::{LogAnalyticsWorkspace, LogAnalyticsWorkspaceKind},
        mysql::{
            FirewallRule, LocationCapability, MySqlServer, MySqlServerKind,
            ServerEditionCapability, ServerVersionCapability, SkuCapability,
        },
        network::{
            NetworkSecurityGroup, NetworkSecurityGroupKind, PublicIpAddress, PublicIpAddressKind,
            VirtualNetwork, VirtualNetworkKind,
        },
        registry::{ContainerRegistry, ContainerRegistryKind, RepositoryProperties},
        resources::{ResourceGroup, ResourceGroupKind},
    },
    resource::{
        ArmCollection, CloudError, CloudResult, Page, ResourceId, ResourceKind, Subscription,
        SubscriptionManager,
    },
};
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

pub use collection::InMemoryCollection;

const SUCCEEDED: &str = "Succeeded";
const DEFAULT_PUBLIC_IP: &str = "127.0.0.1";

/// Every resource collection of one subscription.
pub struct InMemorySubscription {
    id: String,
    pub groups: Arc<InMemoryCollection<ResourceGroupKind>>,
    pub workspaces: Arc<InMemoryCollection<LogAnalyticsWorkspaceKind>>,
    pub components: Arc<InMemoryCollection<ApplicationInsightKind>>,
    pub mysql_servers: Arc<InMemoryCollection<MySqlServerKind>>,
    pub registries: Arc<InMemoryCollection<ContainerRegistryKind>>,
    pub virtual_networks: Arc<InMemoryCollection<VirtualNetworkKind>>,
    pub security_groups: Arc<InMemoryCollection<NetworkSecurityGroupKind>>,
    pub public_ips: Arc<InMemoryCollection<PublicIpAddressKind>>,
    pub plans: Arc<InMemoryCollection<AppServicePlanKind>>,
    pub web_apps: Arc<InMemoryCollection<WebAppKind>>,
    pub function_apps: Arc<InMemoryCollection<FunctionAppKind>>,
    functions: RwLock<HashMap<String, Vec<FunctionEntity>>>,
    repositories: RwLock<HashMap<String, Arc<InMemoryRepositories>>>,
    capabilities: RwLock<HashMap<String, Vec<LocationCapability>>>,
    public_ip: RwLock<String>,
}

impl InMemorySubscription {
    pub fn new(subscription_id: &str) -> Self {
        Self {
            id: subscription_id.to_string(),
            groups: Arc::new(
                InMemoryCollection::new()
                    .on_write(|g: &mut ResourceGroup| g.provisioning_state = Some(SUCCEEDED.into())),
            ),
            workspaces: Arc::new(InMemoryCollection::new().on_write(
                |w: &mut LogAnalyticsWorkspace| {
                    w.provisioning_state = Some(SUCCEEDED.into());
                    w.customer_id.get_or_insert_with(|| Uuid::new_v4().to_string());
                },
            )),
            components: Arc::new(InMemoryCollection::new().on_write(
                |c: &mut ApplicationInsight| {
                    let key = c
                        .instrumentation_key
                        .get_or_insert_with(|| Uuid::new_v4().to_string())
                        .clone();
                    c.connection_string = Some(format!("InstrumentationKey={key}"));
                    c.provisioning_state = Some(SUCCEEDED.into());
                },
            )),
            mysql_servers: Arc::new(InMemoryCollection::new().on_write(|s: &mut MySqlServer| {
                s.state = Some("Ready".into());
                s.fully_qualified_domain_name =
                    Some(format!("{}.mysql.database.azure.com", s.name.to_lowercase()));
                s.admin_password = None;
            })),
            registries: Arc::new(InMemoryCollection::new().on_write(
                |r: &mut ContainerRegistry| r.provisioning_state = Some(SUCCEEDED.into()),
            )),
            virtual_networks: Arc::new(
                InMemoryCollection::new()
                    .on_write(|v: &mut VirtualNetwork| v.provisioning_state = Some(SUCCEEDED.into())),
            ),
            security_groups: Arc::new(InMemoryCollection::new().on_write(
                |n: &mut NetworkSecurityGroup| n.provisioning_state = Some(SUCCEEDED.into()),
            )),
            public_ips: Arc::new(InMemoryCollection::new().on_write(|p: &mut PublicIpAddress| {
                p.provisioning_state = Some(SUCCEEDED.into());
                p.ip_address.get_or_insert_with(|| "20.0.0.1".into());
            })),
            plans: Arc::new(
                InMemoryCollection::new()
                    .on_write(|p: &mut AppServicePlan| p.provisioning_state = Some(SUCCEEDED.into())),
            ),
            web_apps: Arc::new(InMemoryCollection::new().on_write(stamp_site)),
            function_apps: Arc::new(InMemoryCollection::new().on_write(stamp_site)),
            functions: RwLock::default(),
            repositories: RwLock::default(),
            capabilities: RwLock::default(),
            public_ip: RwLock::new(DEFAULT_PUBLIC_IP.into()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Register the functions deployed in a function app.
    pub fn set_functions(&self, resource_group: &str, app: &str, functions: Vec<FunctionEntity>) {
        self.functions
            .write()
            .insert(site_key(resource_group, app), functions);
    }

    /// Override the MySQL capabilities reported for `region`.
    pub fn set_mysql_capabilities(&self, region: &str, capabilities: Vec<LocationCapability>) {
        self.capabilities
            .write()
            .insert(region.to_lowercase(), capabilities);
    }

    pub fn set_public_ip(&self, ip: &str) {
        *self.public_ip.write() = ip.to_string();
    }

    /// The repository store of a registry, created on first use.
    pub fn repositories(&self, login_server: &str) -> Arc<InMemoryRepositories> {
        Arc::clone(
            self.repositories
                .write()
                .entry(login_server.to_lowercase())
                .or_default(),
        )
    }
}

fn stamp_site(site: &mut WebSite) {
    site.state = Some("Running".into());
    site.default_host_name = Some(format!("{}.azurewebsites.net", site.name.to_lowercase()));
}

fn site_key(resource_group: &str, app: &str) -> String {
    format!("{}/{}", resource_group.to_lowercase(), app.to_lowercase())
}

/// What a region offers when no capabilities were configured: a zone-less entry
/// with nothing on offer, then zone 1 with a burstable edition running every
/// supported version.
pub fn default_mysql_capabilities() -> Vec<LocationCapability> {
    let versions = ["5.7", "8.0.21"]
        .into_iter()
        .map(|version| ServerVersionCapability {
            name: version.into(),
            supported_skus: vec![SkuCapability {
                name: "Standard_B1ms".into(),
                supported_iops: 400,
            }],
        })
        .collect();
    vec![
        LocationCapability {
            zone: "none".into(),
            supported_flexible_server_editions: vec![],
        },
        LocationCapability {
            zone: "1".into(),
            supported_flexible_server_editions: vec![ServerEditionCapability {
                name: "Burstable".into(),
                supported_server_versions: versions,
            }],
        },
    ]
}

impl ResourcesManager for InMemorySubscription {
    fn resource_groups(&self) -> Arc<dyn ArmCollection<ResourceGroup>> {
        self.groups.clone()
    }

    fn generic_resource(&self, id: &str) -> CloudResult<GenericResource> {
        let parsed: ResourceId = id.parse()?;
        let resource_group = parsed.resource_group().unwrap_or_default();
        let site = self
            .function_apps
            .snapshot(resource_group, parsed.name())
            .or_else(|| self.web_apps.snapshot(resource_group, parsed.name()));
        match site {
            Some(site) if parsed.resource_type().eq_ignore_ascii_case("sites") => {
                Ok(GenericResource {
                    id: id.to_string(),
                    name: site.name,
                    kind: Some(site.kind),
                    resource_type: WebAppKind::FULL_TYPE.to_string(),
                })
            }
            _ => Err(CloudError::http(404, format!("Resource '{id}' was not found"))),
        }
    }
}

impl WorkspaceManager for InMemorySubscription {
    fn workspaces(&self) -> Arc<dyn ArmCollection<LogAnalyticsWorkspace>> {
        self.workspaces.clone()
    }
}

impl InsightsManager for InMemorySubscription {
    fn components(&self) -> Arc<dyn ArmCollection<ApplicationInsight>> {
        self.components.clone()
    }
}

impl MySqlManager for InMemorySubscription {
    fn servers(&self) -> Arc<dyn ArmCollection<MySqlServer>> {
        self.mysql_servers.clone()
    }

    fn location_capabilities(&self, region: &str) -> CloudResult<Vec<LocationCapability>> {
        Ok(self
            .capabilities
            .read()
            .get(&region.to_lowercase())
            .cloned()
            .unwrap_or_else(default_mysql_capabilities))
    }

    fn create_firewall_rule(
        &self,
        resource_group: &str,
        server: &str,
        rule: FirewallRule,
    ) -> CloudResult<()> {
        self.mysql_servers.modify(resource_group, server, |s| {
            s.firewall_rules.retain(|r| r.name != rule.name);
            s.firewall_rules.push(rule);
        })
    }

    fn delete_firewall_rule(&self, resource_group: &str, server: &str, rule: &str) -> CloudResult<()> {
        self.mysql_servers.modify(resource_group, server, |s| {
            s.firewall_rules.retain(|r| r.name != rule);
        })
    }

    fn public_ip_address(&self) -> CloudResult<String> {
        Ok(self.public_ip.read().clone())
    }
}

impl RegistryManager for InMemorySubscription {
    fn registries(&self) -> Arc<dyn ArmCollection<ContainerRegistry>> {
        self.registries.clone()
    }

    fn repository_client(&self, login_server: &str) -> CloudResult<Arc<dyn RepositoryClient>> {
        Ok(self.repositories(login_server))
    }
}

impl NetworkManager for InMemorySubscription {
    fn virtual_networks(&self) -> Arc<dyn ArmCollection<VirtualNetwork>> {
        self.virtual_networks.clone()
    }

    fn network_security_groups(&self) -> Arc<dyn ArmCollection<NetworkSecurityGroup>> {
        self.security_groups.clone()
    }

    fn public_ip_addresses(&self) -> Arc<dyn ArmCollection<PublicIpAddress>> {
        self.public_ips.clone()
    }
}

impl AppServiceManager for InMemorySubscription {
    fn plans(&self) -> Arc<dyn ArmCollection<AppServicePlan>> {
        self.plans.clone()
    }

    fn web_apps(&self) -> Arc<dyn ArmCollection<WebSite>> {
        self.web_apps.clone()
    }

    fn function_apps(&self) -> Arc<dyn ArmCollection<WebSite>> {
        self.function_apps.clone()
    }

    fn list_functions(&self, resource_group: &str, app: &str) -> CloudResult<Vec<FunctionEntity>> {
        if self.function_apps.snapshot(resource_group, app).is_none() {
            return Err(CloudError::http(404, format!("Function app '{app}' was not found")));
        }
        Ok(self
            .functions
            .read()
            .get(&site_key(resource_group, app))
            .cloned()
            .unwrap_or_default())
    }
}

/// Repositories of one registry, by name.
#[derive(Debug, Default)]
pub struct InMemoryRepositories {
    repositories: RwLock<BTreeMap<String, RepositoryProperties>>,
}

impl InMemoryRepositories {
    pub fn push(&self, properties: RepositoryProperties) {
        self.repositories
            .write()
            .insert(properties.name.clone(), properties);
    }
}

impl RepositoryClient for InMemoryRepositories {
    fn list_repository_names(&self, continuation: Option<&str>) -> CloudResult<Page<String>> {
        let names = self.repositories.read();
        let items = names
            .keys()
            .filter(|name| continuation.is_none_or(|after| name.as_str() > after))
            .cloned()
            .collect();
        Ok(Page::last(items))
    }

    fn get_repository(&self, name: &str) -> CloudResult<Option<RepositoryProperties>> {
        Ok(self.repositories.read().get(name).cloned())
    }

    fn delete_repository(&self, name: &str) -> CloudResult<()> {
        self.repositories
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| CloudError::http(404, format!("Repository '{name}' was not found")))
    }
}

/// Subscriptions and their resources, shared between clones.
#[derive(Clone, Default)]
pub struct InMemoryCloud {
    subscriptions: Arc<RwLock<Vec<(Subscription, Arc<InMemorySubscription>)>>>,
}

impl InMemoryCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription visible to the signed-in account.
    pub fn add_subscription(&self, id: &str, name: &str) -> Arc<InMemorySubscription> {
        let subscription = Arc::new(InMemorySubscription::new(id));
        self.subscriptions.write().push((
            Subscription {
                id: id.to_string(),
                name: name.to_string(),
                tenant_id: "00000000-0000-0000-0000-000000000000".into(),
                selected: false,
            },
            Arc::clone(&subscription),
        ));
        debug!(subscription = id, "Added in-memory subscription");
        subscription
    }

    pub fn subscription(&self, id: &str) -> CloudResult<Arc<InMemorySubscription>> {
        self.subscriptions
            .read()
            .iter()
            .find(|(s, _)| s.id.eq_ignore_ascii_case(id))
            .map(|(_, resources)| Arc::clone(resources))
            .ok_or_else(|| CloudError::Vendor(format!("Subscription '{id}' is not available")))
    }
}

impl SubscriptionManager for InMemoryCloud {
    fn list_subscriptions(&self) -> CloudResult<Vec<Subscription>> {
        Ok(self
            .subscriptions
            .read()
            .iter()
            .map(|(s, _)| s.clone())
            .collect())
    }
}

impl CloudConnector for InMemoryCloud {
    fn resources(&self, subscription_id: &str) -> CloudResult<Arc<dyn ResourcesManager>> {
        Ok(self.subscription(subscription_id)?)
    }

    fn workspaces(&self, subscription_id: &str) -> CloudResult<Arc<dyn WorkspaceManager>> {
        Ok(self.subscription(subscription_id)?)
    }

    fn insights(&self, subscription_id: &str) -> CloudResult<Arc<dyn InsightsManager>> {
        Ok(self.subscription(subscription_id)?)
    }

    fn mysql(&self, subscription_id: &str) -> CloudResult<Arc<dyn MySqlManager>> {
        Ok(self.subscription(subscription_id)?)
    }

    fn registries(&self, subscription_id: &str) -> CloudResult<Arc<dyn RegistryManager>> {
        Ok(self.subscription(subscription_id)?)
    }

    fn network(&self, subscription_id: &str) -> CloudResult<Arc<dyn NetworkManager>> {
        Ok(self.subscription(subscription_id)?)
    }

    fn app_service(&self, subscription_id: &str) -> CloudResult<Arc<dyn AppServiceManager>> {
        Ok(self.subscription(subscription_id)?)
    }
}
