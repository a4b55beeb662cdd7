use super::webapp::{WebSite, WebSiteConfig, build_site, update_site};
use crate::resource::{Buildable, CloudResult, Draft, ResourceKind, ResourceStatus};

pub struct FunctionAppKind;

impl ResourceKind for FunctionAppKind {
    type Remote = WebSite;
    type Config = WebSiteConfig;

    const FULL_TYPE: &'static str = "Microsoft.Web/sites";
    const TYPE_NAME: &'static str = "Function app";

    fn name_of(remote: &WebSite) -> &str {
        &remote.name
    }

    fn resource_group_of(remote: &WebSite) -> &str {
        &remote.resource_group
    }

    fn status_of(remote: &WebSite) -> ResourceStatus {
        ResourceStatus::from_remote(remote.state.as_deref())
    }
}

impl Buildable for FunctionAppKind {
    fn build_create(draft: &Draft<Self>) -> CloudResult<WebSite> {
        build_site(
            draft.name(),
            draft.resource_group(),
            draft.config(),
            "functionapp",
            Self::TYPE_NAME,
        )
    }

    fn build_update(draft: &Draft<Self>, origin: &WebSite) -> CloudResult<WebSite> {
        Ok(update_site(draft.config(), origin))
    }
}
