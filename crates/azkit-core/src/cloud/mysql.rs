//! MySQL flexible servers (`Microsoft.DBforMySQL`).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::Connector;
use crate::resource::{
    ArmCollection, AzureService, CloudError, CloudResult, Draft, OperationContext, Overlay, Page,
    Region, ResourceClient, ResourceKind, ResourceModule, ResourceStatus, overrides,
};

pub const AZURE_SERVICE_RULE: &str = "AllowAllWindowsAzureIps";
pub const LOCAL_MACHINE_RULE_PREFIX: &str = "ClientIPAddress_";
const SUPPORTED_VERSIONS: &[&str] = &["5.7", "8.0.21"];
const STORAGE_SIZE_GB: u32 = 20;
const CAPABILITIES_CACHE: &str = "mysql/location-capabilities";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    pub name: String,
    pub start_ip_address: String,
    pub end_ip_address: String,
}

impl FirewallRule {
    pub fn azure_services() -> Self {
        Self {
            name: AZURE_SERVICE_RULE.into(),
            start_ip_address: "0.0.0.0".into(),
            end_ip_address: "0.0.0.0".into(),
        }
    }

    pub fn local_machine(ip: &str) -> Self {
        Self {
            name: format!("{LOCAL_MACHINE_RULE_PREFIX}{}", ip.replace(['.', ':'], "-")),
            start_ip_address: ip.into(),
            end_ip_address: ip.into(),
        }
    }

    fn is_local_machine(&self) -> bool {
        self.name.starts_with(LOCAL_MACHINE_RULE_PREFIX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sku {
    pub name: String,
    pub tier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Storage {
    pub size_gb: u32,
    pub iops: u32,
    pub auto_grow: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MySqlServer {
    pub name: String,
    pub resource_group: String,
    pub region: Region,
    pub version: String,
    pub admin_name: Option<String>,
    /// Only sent on create; never read back.
    #[serde(skip_serializing, default)]
    pub admin_password: Option<String>,
    pub fully_qualified_domain_name: Option<String>,
    pub availability_zone: Option<String>,
    pub sku: Option<Sku>,
    pub storage: Option<Storage>,
    pub state: Option<String>,
    #[serde(default)]
    pub firewall_rules: Vec<FirewallRule>,
}

impl MySqlServer {
    pub fn is_azure_service_access_allowed(&self) -> bool {
        self.firewall_rules
            .iter()
            .any(|r| r.name == AZURE_SERVICE_RULE)
    }

    pub fn is_local_machine_access_allowed(&self) -> bool {
        self.firewall_rules.iter().any(FirewallRule::is_local_machine)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MySqlServerConfig {
    pub admin_name: Option<String>,
    pub admin_password: Option<String>,
    pub region: Option<Region>,
    pub version: Option<String>,
    pub fully_qualified_domain_name: Option<String>,
    pub azure_service_access_allowed: Option<bool>,
    pub local_machine_access_allowed: Option<bool>,
}

impl MySqlServerConfig {
    /// Firewall toggles that differ from `current`.
    fn firewall_changes(&self, current: Option<&MySqlServer>) -> (Option<bool>, Option<bool>) {
        let azure = current.is_some_and(MySqlServer::is_azure_service_access_allowed);
        let local = current.is_some_and(MySqlServer::is_local_machine_access_allowed);
        (
            self.azure_service_access_allowed.filter(|v| *v != azure),
            self.local_machine_access_allowed.filter(|v| *v != local),
        )
    }
}

impl Overlay<MySqlServer> for MySqlServerConfig {
    fn differs_from(&self, origin: Option<&MySqlServer>) -> bool {
        let (azure, local) = self.firewall_changes(origin);
        azure.is_some()
            || local.is_some()
            || self.admin_password.is_some()
            || overrides(&self.admin_name, origin.and_then(|o| o.admin_name.as_ref()))
            || overrides(&self.region, origin.map(|o| &o.region))
            || overrides(&self.version, origin.map(|o| &o.version))
            || overrides(
                &self.fully_qualified_domain_name,
                origin.and_then(|o| o.fully_qualified_domain_name.as_ref()),
            )
    }
}

pub struct MySqlServerKind;

impl ResourceKind for MySqlServerKind {
    type Remote = MySqlServer;
    type Config = MySqlServerConfig;

    const FULL_TYPE: &'static str = "Microsoft.DBforMySQL/flexibleServers";
    const TYPE_NAME: &'static str = "MySQL server";

    fn name_of(remote: &MySqlServer) -> &str {
        &remote.name
    }

    fn resource_group_of(remote: &MySqlServer) -> &str {
        &remote.resource_group
    }

    fn status_of(remote: &MySqlServer) -> ResourceStatus {
        ResourceStatus::from_remote(remote.state.as_deref())
    }
}

/// Staged value when set, otherwise the origin's current one.
impl Draft<MySqlServerKind> {
    pub fn region(&self) -> Option<Region> {
        self.config()
            .region
            .clone()
            .or_else(|| self.from_origin(|o| Some(o.region.clone())))
    }

    pub fn version(&self) -> Option<String> {
        self.config()
            .version
            .clone()
            .or_else(|| self.from_origin(|o| Some(o.version.clone())))
    }

    pub fn admin_name(&self) -> Option<String> {
        self.config()
            .admin_name
            .clone()
            .or_else(|| self.from_origin(|o| o.admin_name.clone()))
    }

    pub fn fully_qualified_domain_name(&self) -> Option<String> {
        self.config()
            .fully_qualified_domain_name
            .clone()
            .or_else(|| self.from_origin(|o| o.fully_qualified_domain_name.clone()))
    }

    pub fn is_azure_service_access_allowed(&self) -> bool {
        self.config()
            .azure_service_access_allowed
            .or_else(|| self.from_origin(|o| Some(o.is_azure_service_access_allowed())))
            .unwrap_or(false)
    }

    pub fn is_local_machine_access_allowed(&self) -> bool {
        self.config()
            .local_machine_access_allowed
            .or_else(|| self.from_origin(|o| Some(o.is_local_machine_access_allowed())))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuCapability {
    pub name: String,
    pub supported_iops: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerVersionCapability {
    pub name: String,
    pub supported_skus: Vec<SkuCapability>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEditionCapability {
    pub name: String,
    pub supported_server_versions: Vec<ServerVersionCapability>,
}

/// What one availability zone of a region offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCapability {
    /// `"none"` for the zone-less entry.
    pub zone: String,
    pub supported_flexible_server_editions: Vec<ServerEditionCapability>,
}

#[cfg_attr(test, mockall::automock)]
pub trait MySqlManager: Send + Sync {
    fn servers(&self) -> Arc<dyn ArmCollection<MySqlServer>>;

    fn location_capabilities(&self, region: &str) -> CloudResult<Vec<LocationCapability>>;

    fn create_firewall_rule(
        &self,
        resource_group: &str,
        server: &str,
        rule: FirewallRule,
    ) -> CloudResult<()>;

    fn delete_firewall_rule(&self, resource_group: &str, server: &str, rule: &str)
    -> CloudResult<()>;

    /// Public address of this machine, as seen by Azure.
    fn public_ip_address(&self) -> CloudResult<String>;
}

fn validate_version(version: &str) -> CloudResult<()> {
    if SUPPORTED_VERSIONS.iter().any(|v| v.eq_ignore_ascii_case(version)) {
        Ok(())
    } else {
        Err(CloudError::InvalidArgument(format!(
            "Invalid MySQL version '{version}'."
        )))
    }
}

/// Apply the firewall toggles that differ from `current`.
fn toggle_firewall(
    manager: &dyn MySqlManager,
    server: &MySqlServer,
    azure: Option<bool>,
    local: Option<bool>,
) -> CloudResult<()> {
    let (group, name) = (server.resource_group.as_str(), server.name.as_str());
    match azure {
        Some(true) => manager.create_firewall_rule(group, name, FirewallRule::azure_services())?,
        Some(false) => manager.delete_firewall_rule(group, name, AZURE_SERVICE_RULE)?,
        None => {}
    }
    match local {
        Some(true) => {
            let ip = manager.public_ip_address()?;
            manager.create_firewall_rule(group, name, FirewallRule::local_machine(&ip))?;
        }
        Some(false) => {
            for rule in server.firewall_rules.iter().filter(|r| r.is_local_machine()) {
                manager.delete_firewall_rule(group, name, &rule.name)?;
            }
        }
        None => {}
    }
    Ok(())
}

pub struct MySqlClient {
    manager: Arc<dyn MySqlManager>,
    servers: Arc<dyn ArmCollection<MySqlServer>>,
}

impl MySqlClient {
    pub fn new(manager: Arc<dyn MySqlManager>) -> Self {
        let servers = manager.servers();
        Self { manager, servers }
    }

    fn capabilities(
        &self,
        region: &Region,
        ctx: &OperationContext,
    ) -> CloudResult<Vec<LocationCapability>> {
        ctx.caches()
            .cache_or_compute(CAPABILITIES_CACHE, region.name(), || {
                self.manager.location_capabilities(region.name())
            })
    }

    /// Zone, edition tier and SKU for `version` in `region`.
    fn pick_sku(
        &self,
        region: &Region,
        version: &str,
        ctx: &OperationContext,
    ) -> CloudResult<(String, Sku, u32)> {
        let capabilities = self.capabilities(region, ctx)?;
        let zone = capabilities
            .iter()
            .find(|c| !c.zone.eq_ignore_ascii_case("none"))
            .ok_or_else(|| {
                CloudError::Vendor("No available zones for current subscription.".into())
            })?;
        let edition = zone
            .supported_flexible_server_editions
            .first()
            .ok_or_else(|| CloudError::Vendor("No available MySQL server editions.".into()))?;
        let sku = edition
            .supported_server_versions
            .iter()
            .filter(|v| v.name.eq_ignore_ascii_case(version))
            .flat_map(|v| v.supported_skus.iter())
            .next()
            .ok_or_else(|| {
                CloudError::InvalidArgument(format!(
                    "Version '{version}' is not supported in region '{}'.",
                    region.name()
                ))
            })?;

        Ok((
            zone.zone.clone(),
            Sku {
                name: sku.name.clone(),
                tier: edition.name.clone(),
            },
            sku.supported_iops,
        ))
    }
}

impl ResourceClient<MySqlServerKind> for MySqlClient {
    fn list_page(&self, continuation: Option<&str>) -> CloudResult<Page<MySqlServer>> {
        self.servers.list_page(continuation)
    }

    fn get(&self, name: &str, resource_group: &str) -> CloudResult<Option<MySqlServer>> {
        self.servers.get(resource_group, name)
    }

    fn delete(&self, name: &str, resource_group: &str) -> CloudResult<()> {
        self.servers.delete(resource_group, name)
    }

    #[instrument(skip_all, fields(server = draft.name()))]
    fn create(
        &self,
        draft: &Draft<MySqlServerKind>,
        ctx: &OperationContext,
    ) -> CloudResult<MySqlServer> {
        let config = draft.config();
        let region = draft.region().ok_or_else(|| {
            CloudError::MissingField("'region' is required to create MySQL flexible server.".into())
        })?;
        let version = draft.version().ok_or_else(|| {
            CloudError::MissingField("'version' is required to create MySQL flexible server.".into())
        })?;
        validate_version(&version)?;
        let (zone, sku, iops) = self.pick_sku(&region, &version, ctx)?;
        debug!(zone = %zone, sku = %sku.name, "Selected capability");

        ctx.messager()
            .info(&format!("Start creating MySQL server ({})...", draft.name()));
        let created = self.servers.create_or_update(
            draft.resource_group(),
            draft.name(),
            MySqlServer {
                name: draft.name().to_string(),
                resource_group: draft.resource_group().to_string(),
                region,
                version,
                admin_name: draft.admin_name(),
                admin_password: config.admin_password.clone(),
                fully_qualified_domain_name: draft.fully_qualified_domain_name(),
                availability_zone: Some(zone),
                sku: Some(sku),
                storage: Some(Storage {
                    size_gb: STORAGE_SIZE_GB,
                    iops,
                    auto_grow: true,
                }),
                state: None,
                firewall_rules: Vec::new(),
            },
        )?;
        ctx.messager().success(&format!(
            "MySQL server ({}) is successfully created.",
            draft.name()
        ));

        let (azure, local) = config.firewall_changes(Some(&created));
        if azure.is_some() || local.is_some() {
            let manager = Arc::clone(&self.manager);
            let server = created.clone();
            ctx.spawn_background(
                format!("Update firewall rules of MySQL server ({})", draft.name()),
                move |ctx| {
                    ctx.messager().info(&format!(
                        "Start updating firewall rules of MySQL server ({})...",
                        server.name
                    ));
                    toggle_firewall(manager.as_ref(), &server, azure, local)?;
                    ctx.messager().success(&format!(
                        "Firewall rules of MySQL server ({}) is successfully updated.",
                        server.name
                    ));
                    Ok(())
                },
            );
        }
        Ok(created)
    }

    /// Only firewall toggles can be changed on an existing server.
    fn update(
        &self,
        draft: &Draft<MySqlServerKind>,
        origin: &MySqlServer,
        ctx: &OperationContext,
    ) -> CloudResult<MySqlServer> {
        let (azure, local) = draft.config().firewall_changes(Some(origin));
        if azure.is_none() && local.is_none() {
            return Ok(origin.clone());
        }

        ctx.messager().info(&format!(
            "Start updating firewall rules of MySQL server ({})...",
            draft.name()
        ));
        toggle_firewall(self.manager.as_ref(), origin, azure, local)?;
        ctx.messager().success(&format!(
            "Firewall rules of MySQL server ({}) is successfully updated.",
            draft.name()
        ));
        Ok(self
            .servers
            .get(&origin.resource_group, &origin.name)?
            .unwrap_or_else(|| origin.clone()))
    }
}

pub struct MySqlSubscription {
    servers: Arc<ResourceModule<MySqlServerKind>>,
}

impl MySqlSubscription {
    pub fn new(subscription_id: &str, manager: Arc<dyn MySqlManager>) -> Self {
        let client: Arc<dyn ResourceClient<MySqlServerKind>> = Arc::new(MySqlClient::new(manager));
        Self {
            servers: Arc::new(ResourceModule::with_client("flexibleServers", subscription_id, client)),
        }
    }

    pub fn servers(&self) -> Arc<ResourceModule<MySqlServerKind>> {
        Arc::clone(&self.servers)
    }
}

pub struct AzureMySql {
    service: AzureService<MySqlSubscription>,
}

impl AzureMySql {
    pub fn new(connector: Connector<dyn MySqlManager>) -> Self {
        Self {
            service: AzureService::new("Microsoft.DBforMySQL", "Azure Database for MySQL", move |sub| {
                Ok(MySqlSubscription::new(sub, connector(sub)?))
            }),
        }
    }

    pub fn service(&self) -> &AzureService<MySqlSubscription> {
        &self.service
    }

    pub fn servers(&self, subscription_id: &str) -> CloudResult<Arc<ResourceModule<MySqlServerKind>>> {
        Ok(self.service.get(subscription_id)?.servers())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MockArmCollection;

    fn capabilities() -> Vec<LocationCapability> {
        vec![
            LocationCapability {
                zone: "none".into(),
                supported_flexible_server_editions: Vec::new(),
            },
            LocationCapability {
                zone: "1".into(),
                supported_flexible_server_editions: vec![ServerEditionCapability {
                    name: "Burstable".into(),
                    supported_server_versions: vec![ServerVersionCapability {
                        name: "8.0.21".into(),
                        supported_skus: vec![
                            SkuCapability {
                                name: "Standard_B1ms".into(),
                                supported_iops: 400,
                            },
                            SkuCapability {
                                name: "Standard_B2s".into(),
                                supported_iops: 800,
                            },
                        ],
                    }],
                }],
            },
        ]
    }

    fn servers_echoing_creates() -> MockArmCollection<MySqlServer> {
        let mut servers = MockArmCollection::new();
        servers.expect_get().returning(|_, _| Ok(None));
        servers
            .expect_create_or_update()
            .returning(|_, _, server| Ok(server));
        servers
    }

    fn module(manager: MockMySqlManager) -> ResourceModule<MySqlServerKind> {
        let client: Arc<dyn ResourceClient<MySqlServerKind>> =
            Arc::new(MySqlClient::new(Arc::new(manager)));
        ResourceModule::with_client("flexibleServers", "sub", client)
    }

    fn draft(module: &ResourceModule<MySqlServerKind>, name: &str) -> Draft<MySqlServerKind> {
        let mut draft = module.create(name, "rg");
        let config = draft.config_mut();
        config.region = Some(Region::from_name("eastus"));
        config.version = Some("8.0.21".into());
        config.admin_name = Some("admin".into());
        config.admin_password = Some("secret".into());
        draft
    }

    #[test]
    fn create_picks_first_zone_edition_and_sku() {
        let servers: Arc<dyn ArmCollection<MySqlServer>> = Arc::new(servers_echoing_creates());
        let mut manager = MockMySqlManager::new();
        manager
            .expect_servers()
            .returning(move || Arc::clone(&servers));
        manager
            .expect_location_capabilities()
            .times(1)
            .returning(|_| Ok(capabilities()));
        let module = module(manager);
        let ctx = OperationContext::default();

        let created = module.commit(draft(&module, "db1"), &ctx).unwrap();
        let remote = created.remote().unwrap();
        assert_eq!(remote.availability_zone.as_deref(), Some("1"));
        assert_eq!(
            remote.sku,
            Some(Sku {
                name: "Standard_B1ms".into(),
                tier: "Burstable".into()
            })
        );
        assert_eq!(
            remote.storage,
            Some(Storage {
                size_gb: 20,
                iops: 400,
                auto_grow: true
            })
        );

        // capabilities come from the cache the second time
        module.commit(draft(&module, "db2"), &ctx).unwrap();
    }

    #[test]
    fn unsupported_version_and_missing_zones_fail() {
        let servers: Arc<dyn ArmCollection<MySqlServer>> = Arc::new(servers_echoing_creates());
        let mut manager = MockMySqlManager::new();
        manager
            .expect_servers()
            .returning(move || Arc::clone(&servers));
        manager
            .expect_location_capabilities()
            .returning(|region| match region {
                "eastus" => Ok(capabilities()),
                _ => Ok(Vec::new()),
            });
        let module = module(manager);
        let ctx = OperationContext::default();

        let mut old = draft(&module, "db1");
        old.config_mut().version = Some("5.7".into());
        assert_eq!(
            module.commit(old, &ctx).unwrap_err().to_string(),
            "Version '5.7' is not supported in region 'eastus'."
        );

        let mut elsewhere = draft(&module, "db2");
        elsewhere.config_mut().region = Some(Region::from_name("westus"));
        assert_eq!(
            module.commit(elsewhere, &ctx).unwrap_err().to_string(),
            "No available zones for current subscription."
        );

        let mut bogus = draft(&module, "db3");
        bogus.config_mut().version = Some("9.9".into());
        assert!(matches!(
            module.commit(bogus, &ctx).unwrap_err(),
            CloudError::InvalidArgument(_)
        ));
    }

    #[test]
    fn firewall_rules_are_applied_in_background_after_create() {
        let servers: Arc<dyn ArmCollection<MySqlServer>> = Arc::new(servers_echoing_creates());
        let mut manager = MockMySqlManager::new();
        manager
            .expect_servers()
            .returning(move || Arc::clone(&servers));
        manager
            .expect_location_capabilities()
            .returning(|_| Ok(capabilities()));
        manager
            .expect_public_ip_address()
            .returning(|| Ok("203.0.113.7".into()));
        manager
            .expect_create_firewall_rule()
            .withf(|rg, server, _| rg == "rg" && server == "db1")
            .times(2)
            .returning(|_, _, _| Ok(()));
        let module = module(manager);
        let ctx = OperationContext::default();

        let mut draft = draft(&module, "db1");
        draft.config_mut().azure_service_access_allowed = Some(true);
        draft.config_mut().local_machine_access_allowed = Some(true);
        module.commit(draft, &ctx).unwrap();
        ctx.join_background();
    }

    #[test]
    fn update_only_touches_firewall_rules() {
        let mut servers = MockArmCollection::new();
        servers.expect_get().returning(|rg, name| {
            Ok(Some(MySqlServer {
                name: name.into(),
                resource_group: rg.into(),
                region: Region::from_name("eastus"),
                version: "8.0.21".into(),
                admin_name: Some("admin".into()),
                admin_password: None,
                fully_qualified_domain_name: None,
                availability_zone: Some("1".into()),
                sku: None,
                storage: None,
                state: Some("Ready".into()),
                firewall_rules: vec![FirewallRule::azure_services()],
            }))
        });
        servers.expect_create_or_update().never();
        let servers: Arc<dyn ArmCollection<MySqlServer>> = Arc::new(servers);
        let mut manager = MockMySqlManager::new();
        manager
            .expect_servers()
            .returning(move || Arc::clone(&servers));
        manager
            .expect_delete_firewall_rule()
            .withf(|_, _, rule| rule == AZURE_SERVICE_RULE)
            .times(1)
            .returning(|_, _, _| Ok(()));
        let module = module(manager);

        let existing = module.get("db1", "rg").unwrap();
        assert!(existing.remote().unwrap().is_azure_service_access_allowed());
        let mut draft = module.update(existing);
        assert!(draft.is_azure_service_access_allowed());
        draft.config_mut().azure_service_access_allowed = Some(false);
        assert!(!draft.is_azure_service_access_allowed());
        assert!(draft.is_modified());
        module.commit(draft, &OperationContext::default()).unwrap();
    }

    #[test]
    fn update_draft_reads_through_to_the_origin() {
        let mut servers = MockArmCollection::new();
        servers.expect_get().returning(|rg, name| {
            Ok(Some(MySqlServer {
                name: name.into(),
                resource_group: rg.into(),
                region: Region::from_name("eastus"),
                version: "5.7".into(),
                admin_name: Some("admin".into()),
                admin_password: None,
                fully_qualified_domain_name: Some("db1.mysql.database.azure.com".into()),
                availability_zone: None,
                sku: None,
                storage: None,
                state: Some("Ready".into()),
                firewall_rules: Vec::new(),
            }))
        });
        let servers: Arc<dyn ArmCollection<MySqlServer>> = Arc::new(servers);
        let mut manager = MockMySqlManager::new();
        manager
            .expect_servers()
            .returning(move || Arc::clone(&servers));
        let module = module(manager);

        let mut draft = module.update(module.get("db1", "rg").unwrap());
        assert_eq!(draft.region(), Some(Region::from_name("eastus")));
        assert_eq!(draft.version().as_deref(), Some("5.7"));
        assert_eq!(draft.admin_name().as_deref(), Some("admin"));
        assert!(!draft.is_local_machine_access_allowed());
        assert!(!draft.is_modified());

        draft.config_mut().region = Some(Region::from_name("westus"));
        assert_eq!(draft.region(), Some(Region::from_name("westus")));
        assert_eq!(draft.version().as_deref(), Some("5.7"));
    }

    #[test]
    fn create_draft_reports_only_staged_values() {
        let servers: Arc<dyn ArmCollection<MySqlServer>> = Arc::new(MockArmCollection::new());
        let mut manager = MockMySqlManager::new();
        manager
            .expect_servers()
            .returning(move || Arc::clone(&servers));
        let module = module(manager);
        let draft = module.create("db1", "rg");
        assert_eq!(draft.region(), None);
        assert_eq!(draft.admin_name(), None);
        assert!(!draft.is_azure_service_access_allowed());
    }
}
