//! App Service plans, web apps and function apps (`Microsoft.Web`).

mod function_entity;
mod functionapp;
mod plan;
mod webapp;

use std::sync::Arc;

use tracing::{debug, instrument};

pub use function_entity::{BindingEntity, FunctionEntity, HTTP_TRIGGER};
pub use functionapp::FunctionAppKind;
pub use plan::{AppServicePlan, AppServicePlanConfig, AppServicePlanKind, OperatingSystem};
pub use webapp::{WebAppKind, WebSite, WebSiteConfig};

use super::{Connector, resources::AzureResources};
use crate::resource::{
    ArmCollection, AzureService, CloudError, CloudResult, CollectionClient, Resource, ResourceId,
    ResourceKind, ResourceModule,
};

/// Module name (and ARM type) of App Service plans.
pub const PLANS: &str = "serverfarms";

#[cfg_attr(test, mockall::automock)]
pub trait AppServiceManager: Send + Sync {
    fn plans(&self) -> Arc<dyn ArmCollection<AppServicePlan>>;

    fn web_apps(&self) -> Arc<dyn ArmCollection<WebSite>>;

    fn function_apps(&self) -> Arc<dyn ArmCollection<WebSite>>;

    fn list_functions(&self, resource_group: &str, app: &str) -> CloudResult<Vec<FunctionEntity>>;
}

pub struct AppServiceSubscription {
    manager: Arc<dyn AppServiceManager>,
    plans: Arc<ResourceModule<AppServicePlanKind>>,
    web_apps: Arc<ResourceModule<WebAppKind>>,
    function_apps: Arc<ResourceModule<FunctionAppKind>>,
}

impl AppServiceSubscription {
    pub fn new(subscription_id: &str, manager: Arc<dyn AppServiceManager>) -> Self {
        Self {
            plans: Arc::new(ResourceModule::with_client(
                PLANS,
                subscription_id,
                CollectionClient::<AppServicePlanKind>::shared(manager.plans()),
            )),
            web_apps: Arc::new(ResourceModule::with_client(
                "sites",
                subscription_id,
                CollectionClient::<WebAppKind>::shared(manager.web_apps()),
            )),
            function_apps: Arc::new(ResourceModule::with_client(
                "sites",
                subscription_id,
                CollectionClient::<FunctionAppKind>::shared(manager.function_apps()),
            )),
            manager,
        }
    }
}

/// What an App Service resource id resolved to.
#[derive(Debug, Clone)]
pub enum AppServiceResource {
    Plan(Arc<Resource<AppServicePlanKind>>),
    WebApp(Arc<Resource<WebAppKind>>),
    FunctionApp(Arc<Resource<FunctionAppKind>>),
}

impl AppServiceResource {
    pub fn name(&self) -> &str {
        match self {
            Self::Plan(r) => r.name(),
            Self::WebApp(r) => r.name(),
            Self::FunctionApp(r) => r.name(),
        }
    }

    pub fn exists(&self) -> bool {
        match self {
            Self::Plan(r) => r.exists(),
            Self::WebApp(r) => r.exists(),
            Self::FunctionApp(r) => r.exists(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Plan(_) => AppServicePlanKind::TYPE_NAME,
            Self::WebApp(_) => WebAppKind::TYPE_NAME,
            Self::FunctionApp(_) => FunctionAppKind::TYPE_NAME,
        }
    }
}

pub struct AzureAppService {
    service: AzureService<AppServiceSubscription>,
    resources: Arc<AzureResources>,
}

impl AzureAppService {
    pub fn new(connector: Connector<dyn AppServiceManager>, resources: Arc<AzureResources>) -> Self {
        Self {
            service: AzureService::new("Microsoft.Web", "App Services", move |sub| {
                Ok(AppServiceSubscription::new(sub, connector(sub)?))
            }),
            resources,
        }
    }

    pub fn service(&self) -> &AzureService<AppServiceSubscription> {
        &self.service
    }

    pub fn plans(&self, subscription_id: &str) -> CloudResult<Arc<ResourceModule<AppServicePlanKind>>> {
        Ok(Arc::clone(&self.service.get(subscription_id)?.plans))
    }

    pub fn web_apps(&self, subscription_id: &str) -> CloudResult<Arc<ResourceModule<WebAppKind>>> {
        Ok(Arc::clone(&self.service.get(subscription_id)?.web_apps))
    }

    pub fn function_apps(
        &self,
        subscription_id: &str,
    ) -> CloudResult<Arc<ResourceModule<FunctionAppKind>>> {
        Ok(Arc::clone(&self.service.get(subscription_id)?.function_apps))
    }

    /// Functions deployed in `app`.
    pub fn functions(&self, app: &Resource<FunctionAppKind>) -> CloudResult<Vec<FunctionEntity>> {
        self.service
            .get(app.subscription_id())?
            .manager
            .list_functions(app.resource_group(), app.name())
    }

    /// Resolve an App Service id to a plan, a function app or a web app.
    ///
    /// Plans are recognised by their type. Sites need one generic lookup: a
    /// kind mentioning "function" makes a function app. When that lookup says
    /// not-found (or fails with a 200 status) the site is treated as a web app.
    #[instrument(skip(self))]
    pub fn get_by_id(&self, id: &str) -> CloudResult<AppServiceResource> {
        let parsed: ResourceId = id.parse()?;
        let resource_group = parsed
            .resource_group()
            .ok_or_else(|| CloudError::InvalidResourceId {
                id: id.to_string(),
                reason: "no resource group".into(),
            })?;
        let subscription = self.service.get(parsed.subscription_id())?;

        if parsed.resource_type().eq_ignore_ascii_case(PLANS) {
            return Ok(AppServiceResource::Plan(
                subscription.plans.get(parsed.name(), resource_group)?,
            ));
        }

        let is_function = match self.resources.generic_resource(id) {
            Ok(resource) => resource
                .kind
                .is_some_and(|kind| kind.to_lowercase().contains("function")),
            Err(e) if e.is_not_found() || e.status() == Some(200) => {
                debug!(error = %e, "Generic lookup failed, assuming web app");
                false
            }
            Err(e) => return Err(e),
        };

        Ok(if is_function {
            AppServiceResource::FunctionApp(
                subscription.function_apps.get(parsed.name(), resource_group)?,
            )
        } else {
            AppServiceResource::WebApp(subscription.web_apps.get(parsed.name(), resource_group)?)
        })
    }
}
