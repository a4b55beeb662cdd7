//! Resource façades wired to the in-memory cloud.

use std::{collections::BTreeMap, sync::Arc};

use azkit_adapters::{InMemoryCloud, InMemorySubscription, RecordingMessager};
use azkit_core::{
    cloud::{
        AppServiceResource, AzureCloud, LogAnalyticsWorkspaceConfig,
        appservice::{BindingEntity, FunctionEntity, WebSite},
    },
    resource::{
        Account, AzureConfiguration, CacheManager, OperationContext, PreloadRegistry, Region,
        ResourceStatus,
    },
};

const SUB: &str = "00000000-0000-0000-0000-0000000000aa";

fn cloud() -> (InMemoryCloud, Arc<InMemorySubscription>, AzureCloud) {
    let memory = InMemoryCloud::new();
    let subscription = memory.add_subscription(SUB, "Pay-As-You-Go");
    let cloud = AzureCloud::connect(Arc::new(memory.clone()));
    (memory, subscription, cloud)
}

fn context() -> (OperationContext, Arc<RecordingMessager>) {
    let messager = Arc::new(RecordingMessager::new());
    let ctx = OperationContext::new(messager.clone(), Arc::new(CacheManager::default()));
    (ctx, messager)
}

fn site(name: &str, kind: &str) -> WebSite {
    WebSite {
        name: name.into(),
        resource_group: "apps".into(),
        region: Region::from_name("westeurope"),
        kind: kind.into(),
        app_service_plan_id: None,
        runtime: None,
        app_settings: BTreeMap::new(),
        default_host_name: None,
        state: None,
    }
}

#[test]
fn resource_groups_round_trip_through_drafts() {
    let (_, _, cloud) = cloud();
    let (ctx, _) = context();
    let groups = cloud.resources.groups(SUB).unwrap();

    let missing = groups.get("demo-rg", "demo-rg").unwrap();
    assert_eq!(missing.status(), ResourceStatus::Deleted);

    let mut draft = groups.create("demo-rg", "demo-rg");
    draft.config_mut().region = Some(Region::from_name("West Europe"));
    let created = groups.commit(draft, &ctx).unwrap();

    // The cached entity is the one that was created.
    assert!(Arc::ptr_eq(&created, &missing));
    assert_eq!(created.status(), ResourceStatus::Active);
    assert_eq!(
        created.id().to_string(),
        format!("/subscriptions/{SUB}/resourceGroups/demo-rg")
    );
    assert!(groups.exists("DEMO-RG", "DEMO-RG").unwrap());

    groups.delete(&created).unwrap();
    assert_eq!(created.status(), ResourceStatus::Deleted);
}

#[test]
fn listing_follows_every_page() {
    let (_, subscription, cloud) = cloud();
    let (ctx, _) = context();
    let groups = cloud.resources.groups(SUB).unwrap();
    for i in 0..120 {
        let mut draft = groups.create(&format!("rg-{i:03}"), &format!("rg-{i:03}"));
        draft.config_mut().region = Some(Region::from_name("eastus"));
        groups.commit(draft, &ctx).unwrap();
    }

    let listed = groups.list().unwrap();
    assert_eq!(listed.len(), 120);
    assert_eq!(subscription.groups.len(), 120);
    assert!(listed.iter().all(|g| g.exists()));
}

#[test]
fn insights_create_cascades_to_default_workspace() {
    let (_, subscription, cloud) = cloud();
    let (ctx, messager) = context();
    let components = cloud.insights.application_insights(SUB).unwrap();

    let mut draft = components.create("demo-ai", "demo-rg");
    draft.config_mut().region = Some(Region::from_name("eastus"));
    draft.config_mut().workspace = Some(LogAnalyticsWorkspaceConfig::create_new("demo-ws"));
    let created = components.commit(draft, &ctx).unwrap();

    assert!(
        subscription
            .groups
            .snapshot("DefaultResourceGroup-EUS", "DefaultResourceGroup-EUS")
            .is_some()
    );
    assert!(
        subscription
            .workspaces
            .snapshot("DefaultResourceGroup-EUS", "demo-ws")
            .is_some()
    );

    let remote = created.remote().unwrap();
    assert_eq!(
        remote.workspace_resource_id.as_deref(),
        Some(
            format!(
                "/subscriptions/{SUB}/resourceGroups/DefaultResourceGroup-EUS/providers/Microsoft.OperationalInsights/workspaces/demo-ws"
            )
            .as_str()
        )
    );
    assert!(remote.instrumentation_key.is_some());
    assert!(messager.contains("Application Insights (demo-ai) is successfully created."));
}

#[test]
fn mysql_create_then_toggle_firewall() {
    let (_, subscription, cloud) = cloud();
    subscription.set_public_ip("203.0.113.7");
    let (ctx, messager) = context();
    let servers = cloud.mysql.servers(SUB).unwrap();

    let mut draft = servers.create("demo-db", "data");
    let config = draft.config_mut();
    config.region = Some(Region::from_name("eastus"));
    config.version = Some("8.0.21".into());
    config.admin_name = Some("dbadmin".into());
    config.admin_password = Some("P@ssw0rd-123".into());
    config.azure_service_access_allowed = Some(true);
    config.local_machine_access_allowed = Some(true);
    let server = servers.commit(draft, &ctx).unwrap();
    ctx.join_background();

    let remote = server.remote().unwrap();
    assert_eq!(remote.availability_zone.as_deref(), Some("1"));
    assert_eq!(remote.sku.as_ref().map(|s| s.tier.as_str()), Some("Burstable"));
    assert!(messager.contains("Firewall rules of MySQL server (demo-db) is successfully updated."));

    servers.refresh(&server).unwrap();
    let remote = server.remote().unwrap();
    assert!(remote.is_azure_service_access_allowed());
    assert!(remote.is_local_machine_access_allowed());

    let mut draft = servers.update(Arc::clone(&server));
    draft.config_mut().azure_service_access_allowed = Some(false);
    assert!(draft.is_modified());
    let updated = servers.commit(draft, &ctx).unwrap();

    let remote = updated.remote().unwrap();
    assert!(!remote.is_azure_service_access_allowed());
    assert!(remote.is_local_machine_access_allowed());
}

#[test]
fn mysql_rejects_unknown_versions() {
    let (_, _, cloud) = cloud();
    let (ctx, _) = context();
    let servers = cloud.mysql.servers(SUB).unwrap();

    let mut draft = servers.create("old-db", "data");
    draft.config_mut().region = Some(Region::from_name("eastus"));
    draft.config_mut().version = Some("5.6".into());
    let err = servers.commit(draft, &ctx).unwrap_err();

    assert!(err.to_string().contains("Invalid MySQL version '5.6'."));
    assert!(!servers.exists("old-db", "data").unwrap());
}

#[test]
fn app_service_ids_resolve_to_the_right_kind() {
    let (_, subscription, cloud) = cloud();
    subscription.function_apps.seed(site("orders", "functionapp,linux"));
    subscription.web_apps.seed(site("portal", "app"));
    subscription.set_functions(
        "apps",
        "orders",
        vec![FunctionEntity {
            name: "HttpExample".into(),
            bindings: vec![BindingEntity {
                binding_type: "httpTrigger".into(),
                direction: "in".into(),
                name: "req".into(),
                properties: BTreeMap::from([("type".to_string(), "httpTrigger".to_string())]),
            }],
            ..Default::default()
        }],
    );
    let id = |name: &str| {
        format!("/subscriptions/{SUB}/resourceGroups/apps/providers/Microsoft.Web/sites/{name}")
    };

    let AppServiceResource::FunctionApp(orders) = cloud.app_service.get_by_id(&id("orders")).unwrap()
    else {
        panic!("expected a function app");
    };
    let functions = cloud.app_service.functions(&orders).unwrap();
    assert_eq!(functions.len(), 1);
    assert!(functions[0].is_http_trigger());

    let portal = cloud.app_service.get_by_id(&id("portal")).unwrap();
    assert!(matches!(portal, AppServiceResource::WebApp(_)));
    assert!(portal.exists());

    // Not found by the generic lookup either: an absent web app.
    let ghost = cloud.app_service.get_by_id(&id("ghost")).unwrap();
    assert!(matches!(ghost, AppServiceResource::WebApp(_)));
    assert!(!ghost.exists());
}

#[test]
fn selecting_subscriptions_runs_preloads() {
    let (memory, _, cloud) = cloud();
    memory.add_subscription("00000000-0000-0000-0000-0000000000bb", "Dev/Test");
    let (ctx, _) = context();

    let preloads = Arc::new(PreloadRegistry::new());
    cloud.register_preloads(&preloads, &[SUB.to_string()]);
    let account = Account::new(
        Box::new(memory),
        AzureConfiguration::default(),
        Arc::clone(&preloads),
        ctx,
    );

    assert!(!account.is_signed_in());
    let subscriptions = account.reload_subscriptions().unwrap();
    assert_eq!(subscriptions[0].name, "Dev/Test");

    let handle = account
        .select_subscriptions(&[SUB.to_uppercase()])
        .unwrap()
        .expect("preloading is enabled by default");
    assert_eq!(handle.join().unwrap(), preloads.len());

    let selected = account.selected_subscriptions().unwrap();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].id, SUB);
}
