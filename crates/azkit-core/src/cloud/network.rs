//! Virtual networks, network security groups and public IPs (`Microsoft.Network`).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Connector;
use crate::resource::{
    ArmCollection, AzureService, Buildable, CloudError, CloudResult, CollectionClient, Draft,
    Overlay, Region, ResourceKind, ResourceModule, ResourceStatus, overrides,
};

fn required_region(region: &Option<Region>, type_name: &str) -> CloudResult<Region> {
    region
        .clone()
        .ok_or_else(|| CloudError::MissingField(format!("'region' is required to create {type_name}.")))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subnet {
    pub name: String,
    pub address_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualNetwork {
    pub name: String,
    pub resource_group: String,
    pub region: Region,
    pub address_space: String,
    pub subnets: Vec<Subnet>,
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VirtualNetworkConfig {
    pub region: Option<Region>,
    pub address_space: Option<String>,
    pub subnet: Option<Subnet>,
}

impl Overlay<VirtualNetwork> for VirtualNetworkConfig {
    fn differs_from(&self, origin: Option<&VirtualNetwork>) -> bool {
        overrides(&self.region, origin.map(|o| &o.region))
            || overrides(&self.address_space, origin.map(|o| &o.address_space))
            || self
                .subnet
                .as_ref()
                .is_some_and(|s| !origin.is_some_and(|o| o.subnets.contains(s)))
    }
}

pub struct VirtualNetworkKind;

impl ResourceKind for VirtualNetworkKind {
    type Remote = VirtualNetwork;
    type Config = VirtualNetworkConfig;

    const FULL_TYPE: &'static str = "Microsoft.Network/virtualNetworks";
    const TYPE_NAME: &'static str = "Virtual network";

    fn name_of(remote: &VirtualNetwork) -> &str {
        &remote.name
    }

    fn resource_group_of(remote: &VirtualNetwork) -> &str {
        &remote.resource_group
    }

    fn status_of(remote: &VirtualNetwork) -> ResourceStatus {
        ResourceStatus::from_remote(remote.provisioning_state.as_deref())
    }
}

impl Buildable for VirtualNetworkKind {
    fn build_create(draft: &Draft<Self>) -> CloudResult<VirtualNetwork> {
        let config = draft.config();
        let address_space = config.address_space.clone().ok_or_else(|| {
            CloudError::MissingField("'address space' is required to create Virtual network.".into())
        })?;
        Ok(VirtualNetwork {
            name: draft.name().to_string(),
            resource_group: draft.resource_group().to_string(),
            region: required_region(&config.region, Self::TYPE_NAME)?,
            address_space,
            subnets: config.subnet.iter().cloned().collect(),
            provisioning_state: None,
        })
    }

    fn build_update(draft: &Draft<Self>, origin: &VirtualNetwork) -> CloudResult<VirtualNetwork> {
        let mut updated = origin.clone();
        if let Some(space) = &draft.config().address_space {
            updated.address_space = space.clone();
        }
        if let Some(subnet) = &draft.config().subnet {
            updated.subnets.retain(|s| s.name != subnet.name);
            updated.subnets.push(subnet.clone());
        }
        Ok(updated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityRule {
    pub name: String,
    pub priority: u32,
    pub port: String,
    pub allow: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSecurityGroup {
    pub name: String,
    pub resource_group: String,
    pub region: Region,
    pub security_rules: Vec<SecurityRule>,
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkSecurityGroupConfig {
    pub region: Option<Region>,
    pub security_rules: Option<Vec<SecurityRule>>,
}

impl Overlay<NetworkSecurityGroup> for NetworkSecurityGroupConfig {
    fn differs_from(&self, origin: Option<&NetworkSecurityGroup>) -> bool {
        overrides(&self.region, origin.map(|o| &o.region))
            || overrides(&self.security_rules, origin.map(|o| &o.security_rules))
    }
}

pub struct NetworkSecurityGroupKind;

impl ResourceKind for NetworkSecurityGroupKind {
    type Remote = NetworkSecurityGroup;
    type Config = NetworkSecurityGroupConfig;

    const FULL_TYPE: &'static str = "Microsoft.Network/networkSecurityGroups";
    const TYPE_NAME: &'static str = "Network security group";

    fn name_of(remote: &NetworkSecurityGroup) -> &str {
        &remote.name
    }

    fn resource_group_of(remote: &NetworkSecurityGroup) -> &str {
        &remote.resource_group
    }

    fn status_of(remote: &NetworkSecurityGroup) -> ResourceStatus {
        ResourceStatus::from_remote(remote.provisioning_state.as_deref())
    }
}

impl Buildable for NetworkSecurityGroupKind {
    fn build_create(draft: &Draft<Self>) -> CloudResult<NetworkSecurityGroup> {
        let config = draft.config();
        Ok(NetworkSecurityGroup {
            name: draft.name().to_string(),
            resource_group: draft.resource_group().to_string(),
            region: required_region(&config.region, Self::TYPE_NAME)?,
            security_rules: config.security_rules.clone().unwrap_or_default(),
            provisioning_state: None,
        })
    }

    fn build_update(
        draft: &Draft<Self>,
        origin: &NetworkSecurityGroup,
    ) -> CloudResult<NetworkSecurityGroup> {
        let mut updated = origin.clone();
        if let Some(rules) = &draft.config().security_rules {
            updated.security_rules = rules.clone();
        }
        Ok(updated)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicIpAddress {
    pub name: String,
    pub resource_group: String,
    pub region: Region,
    pub ip_address: Option<String>,
    pub leaf_domain_label: Option<String>,
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublicIpAddressConfig {
    pub region: Option<Region>,
    pub leaf_domain_label: Option<String>,
}

impl Overlay<PublicIpAddress> for PublicIpAddressConfig {
    fn differs_from(&self, origin: Option<&PublicIpAddress>) -> bool {
        overrides(&self.region, origin.map(|o| &o.region))
            || overrides(
                &self.leaf_domain_label,
                origin.and_then(|o| o.leaf_domain_label.as_ref()),
            )
    }
}

pub struct PublicIpAddressKind;

impl ResourceKind for PublicIpAddressKind {
    type Remote = PublicIpAddress;
    type Config = PublicIpAddressConfig;

    const FULL_TYPE: &'static str = "Microsoft.Network/publicIPAddresses";
    const TYPE_NAME: &'static str = "Public IP address";

    fn name_of(remote: &PublicIpAddress) -> &str {
        &remote.name
    }

    fn resource_group_of(remote: &PublicIpAddress) -> &str {
        &remote.resource_group
    }

    fn status_of(remote: &PublicIpAddress) -> ResourceStatus {
        ResourceStatus::from_remote(remote.provisioning_state.as_deref())
    }
}

impl Buildable for PublicIpAddressKind {
    fn build_create(draft: &Draft<Self>) -> CloudResult<PublicIpAddress> {
        let config = draft.config();
        Ok(PublicIpAddress {
            name: draft.name().to_string(),
            resource_group: draft.resource_group().to_string(),
            region: required_region(&config.region, Self::TYPE_NAME)?,
            ip_address: None,
            leaf_domain_label: config.leaf_domain_label.clone(),
            provisioning_state: None,
        })
    }

    fn build_update(draft: &Draft<Self>, origin: &PublicIpAddress) -> CloudResult<PublicIpAddress> {
        let mut updated = origin.clone();
        if let Some(label) = &draft.config().leaf_domain_label {
            updated.leaf_domain_label = Some(label.clone());
        }
        Ok(updated)
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait NetworkManager: Send + Sync {
    fn virtual_networks(&self) -> Arc<dyn ArmCollection<VirtualNetwork>>;

    fn network_security_groups(&self) -> Arc<dyn ArmCollection<NetworkSecurityGroup>>;

    fn public_ip_addresses(&self) -> Arc<dyn ArmCollection<PublicIpAddress>>;
}

pub struct NetworkSubscription {
    networks: Arc<ResourceModule<VirtualNetworkKind>>,
    security_groups: Arc<ResourceModule<NetworkSecurityGroupKind>>,
    public_ips: Arc<ResourceModule<PublicIpAddressKind>>,
}

impl NetworkSubscription {
    pub fn new(subscription_id: &str, manager: &dyn NetworkManager) -> Self {
        Self {
            networks: Arc::new(ResourceModule::with_client(
                "virtualNetworks",
                subscription_id,
                CollectionClient::<VirtualNetworkKind>::shared(manager.virtual_networks()),
            )),
            security_groups: Arc::new(ResourceModule::with_client(
                "networkSecurityGroups",
                subscription_id,
                CollectionClient::<NetworkSecurityGroupKind>::shared(
                    manager.network_security_groups(),
                ),
            )),
            public_ips: Arc::new(ResourceModule::with_client(
                "publicIPAddresses",
                subscription_id,
                CollectionClient::<PublicIpAddressKind>::shared(manager.public_ip_addresses()),
            )),
        }
    }
}

pub struct AzureNetwork {
    service: AzureService<NetworkSubscription>,
}

impl AzureNetwork {
    pub fn new(connector: Connector<dyn NetworkManager>) -> Self {
        Self {
            service: AzureService::new("Microsoft.Network", "Azure Network", move |sub| {
                Ok(NetworkSubscription::new(sub, connector(sub)?.as_ref()))
            }),
        }
    }

    pub fn service(&self) -> &AzureService<NetworkSubscription> {
        &self.service
    }

    pub fn virtual_networks(
        &self,
        subscription_id: &str,
    ) -> CloudResult<Arc<ResourceModule<VirtualNetworkKind>>> {
        Ok(Arc::clone(&self.service.get(subscription_id)?.networks))
    }

    pub fn network_security_groups(
        &self,
        subscription_id: &str,
    ) -> CloudResult<Arc<ResourceModule<NetworkSecurityGroupKind>>> {
        Ok(Arc::clone(&self.service.get(subscription_id)?.security_groups))
    }

    pub fn public_ip_addresses(
        &self,
        subscription_id: &str,
    ) -> CloudResult<Arc<ResourceModule<PublicIpAddressKind>>> {
        Ok(Arc::clone(&self.service.get(subscription_id)?.public_ips))
    }
}
