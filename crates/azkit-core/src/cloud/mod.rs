//! Per-family façades over the vendor management APIs.
//!
//! Each family exposes a vendor port (`*Manager`) that a real SDK binding
//! implements, a per-subscription root holding the family's modules, and an
//! `Azure*` façade caching those roots by subscription id. [`AzureCloud`]
//! wires every family from one [`CloudConnector`].

pub mod appservice;
pub mod insights;
pub mod monitor;
pub mod mysql;
pub mod network;
pub mod registry;
pub mod resources;

use std::sync::Arc;

use tracing::debug;

use crate::resource::{CloudResult, PreloadRegistry};

pub use appservice::{AppServiceManager, AppServiceResource, AzureAppService};
pub use insights::{AzureApplicationInsights, InsightsManager};
pub use monitor::{AzureLogAnalyticsWorkspace, LogAnalyticsWorkspaceConfig, WorkspaceManager};
pub use mysql::{AzureMySql, MySqlManager};
pub use network::{AzureNetwork, NetworkManager};
pub use registry::{AzureContainerRegistry, RegistryManager, RepositoryClient};
pub use resources::{AzureResources, GenericResource, ResourcesManager};

/// Connects a subscription id to its vendor manager.
pub type Connector<M> = Arc<dyn Fn(&str) -> CloudResult<Arc<M>> + Send + Sync>;

/// Hands out the vendor manager of every family for a subscription.
pub trait CloudConnector: Send + Sync {
    fn resources(&self, subscription_id: &str) -> CloudResult<Arc<dyn ResourcesManager>>;

    fn workspaces(&self, subscription_id: &str) -> CloudResult<Arc<dyn WorkspaceManager>>;

    fn insights(&self, subscription_id: &str) -> CloudResult<Arc<dyn InsightsManager>>;

    fn mysql(&self, subscription_id: &str) -> CloudResult<Arc<dyn MySqlManager>>;

    fn registries(&self, subscription_id: &str) -> CloudResult<Arc<dyn RegistryManager>>;

    fn network(&self, subscription_id: &str) -> CloudResult<Arc<dyn NetworkManager>>;

    fn app_service(&self, subscription_id: &str) -> CloudResult<Arc<dyn AppServiceManager>>;
}

/// Every family façade, built on one connector.
pub struct AzureCloud {
    pub resources: Arc<AzureResources>,
    pub workspaces: Arc<AzureLogAnalyticsWorkspace>,
    pub insights: Arc<AzureApplicationInsights>,
    pub mysql: Arc<AzureMySql>,
    pub registries: Arc<AzureContainerRegistry>,
    pub network: Arc<AzureNetwork>,
    pub app_service: Arc<AzureAppService>,
}

impl AzureCloud {
    pub fn connect(connector: Arc<dyn CloudConnector>) -> Self {
        let c = Arc::clone(&connector);
        let resources = Arc::new(AzureResources::new(Arc::new(move |sub: &str| c.resources(sub))));
        let c = Arc::clone(&connector);
        let workspaces = Arc::new(AzureLogAnalyticsWorkspace::new(Arc::new(move |sub: &str| {
            c.workspaces(sub)
        })));
        let c = Arc::clone(&connector);
        let insights = Arc::new(AzureApplicationInsights::new(
            Arc::new(move |sub: &str| c.insights(sub)),
            Arc::clone(&resources),
            Arc::clone(&workspaces),
        ));
        let c = Arc::clone(&connector);
        let mysql = Arc::new(AzureMySql::new(Arc::new(move |sub: &str| c.mysql(sub))));
        let c = Arc::clone(&connector);
        let registries = Arc::new(AzureContainerRegistry::new(Arc::new(move |sub: &str| {
            c.registries(sub)
        })));
        let c = Arc::clone(&connector);
        let network = Arc::new(AzureNetwork::new(Arc::new(move |sub: &str| c.network(sub))));
        let c = connector;
        let app_service = Arc::new(AzureAppService::new(
            Arc::new(move |sub: &str| c.app_service(sub)),
            Arc::clone(&resources),
        ));

        Self {
            resources,
            workspaces,
            insights,
            mysql,
            registries,
            network,
            app_service,
        }
    }

    /// Register warm-up listings of resource groups and App Service plans
    /// for `subscription_ids`.
    pub fn register_preloads(&self, registry: &PreloadRegistry, subscription_ids: &[String]) {
        let resources = Arc::clone(&self.resources);
        let subs = subscription_ids.to_vec();
        registry.register("resource groups", move |_| {
            for sub in &subs {
                let groups = resources.groups(sub)?.list()?;
                debug!(subscription = %sub, count = groups.len(), "Preloaded resource groups");
            }
            Ok(())
        });

        let app_service = Arc::clone(&self.app_service);
        let subs = subscription_ids.to_vec();
        registry.register("app service plans", move |_| {
            for sub in &subs {
                let plans = app_service.plans(sub)?.list()?;
                debug!(subscription = %sub, count = plans.len(), "Preloaded App Service plans");
            }
            Ok(())
        });
    }
}
