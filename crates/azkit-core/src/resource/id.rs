//! Azure Resource Manager ids.

use std::{fmt, str::FromStr};

use super::error::CloudError;

/// A parsed ARM id:
/// `/subscriptions/{sub}/resourceGroups/{rg}/providers/{namespace}/{type}/{name}[/{childType}/{childName}]...`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    subscription_id: String,
    resource_group: Option<String>,
    namespace: Option<String>,
    /// `(type, name)` pairs below the provider namespace, outermost first.
    segments: Vec<(String, String)>,
}

impl ResourceId {
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn resource_group(&self) -> Option<&str> {
        self.resource_group.as_deref()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Type of the addressed (innermost) resource, e.g. `sites`.
    ///
    /// A bare resource group id reports `resourceGroups`.
    pub fn resource_type(&self) -> &str {
        match (self.segments.last(), &self.resource_group) {
            (Some((kind, _)), _) => kind,
            (None, Some(_)) => "resourceGroups",
            (None, None) => "subscriptions",
        }
    }

    /// Name of the addressed (innermost) resource.
    pub fn name(&self) -> &str {
        match (self.segments.last(), &self.resource_group) {
            (Some((_, name)), _) => name,
            (None, Some(group)) => group,
            (None, None) => &self.subscription_id,
        }
    }

    /// Id of the enclosing resource, if this id addresses a child.
    pub fn parent(&self) -> Option<ResourceId> {
        (self.segments.len() > 1).then(|| ResourceId {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
            ..self.clone()
        })
    }

    /// Id of a resource group itself.
    pub fn for_group(subscription_id: impl Into<String>, resource_group: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: Some(resource_group.into()),
            namespace: None,
            segments: Vec::new(),
        }
    }

    /// Build the id of a top-level resource.
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        full_type: &str,
        name: impl Into<String>,
    ) -> Self {
        let (namespace, kind) = full_type.split_once('/').unwrap_or(("", full_type));
        Self {
            subscription_id: subscription_id.into(),
            resource_group: Some(resource_group.into()),
            namespace: (!namespace.is_empty()).then(|| namespace.to_string()),
            segments: vec![(kind.to_string(), name.into())],
        }
    }
}

impl FromStr for ResourceId {
    type Err = CloudError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CloudError::InvalidResourceId {
            id: id.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = id.trim_matches('/').split('/').collect();
        let mut parts = parts.into_iter();

        match (parts.next(), parts.next()) {
            (Some(s), Some(sub)) if s.eq_ignore_ascii_case("subscriptions") && !sub.is_empty() => {
                let mut parsed = ResourceId {
                    subscription_id: sub.to_string(),
                    resource_group: None,
                    namespace: None,
                    segments: Vec::new(),
                };

                match (parts.next(), parts.next()) {
                    (None, _) => return Ok(parsed),
                    (Some(g), Some(group)) if g.eq_ignore_ascii_case("resourceGroups") => {
                        parsed.resource_group = Some(group.to_string());
                    }
                    _ => return Err(invalid("expected 'resourceGroups/<name>'")),
                }

                match (parts.next(), parts.next()) {
                    (None, _) => return Ok(parsed),
                    (Some(p), Some(namespace)) if p.eq_ignore_ascii_case("providers") => {
                        parsed.namespace = Some(namespace.to_string());
                    }
                    _ => return Err(invalid("expected 'providers/<namespace>'")),
                }

                let rest: Vec<&str> = parts.collect();
                if rest.is_empty() || rest.len() % 2 != 0 {
                    return Err(invalid("expected '<type>/<name>' pairs after the namespace"));
                }
                parsed.segments = rest
                    .chunks(2)
                    .map(|pair| (pair[0].to_string(), pair[1].to_string()))
                    .collect();
                Ok(parsed)
            }
            _ => Err(invalid("expected '/subscriptions/<id>' prefix")),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/subscriptions/{}", self.subscription_id)?;
        if let Some(group) = &self.resource_group {
            write!(f, "/resourceGroups/{group}")?;
        }
        if let Some(namespace) = &self.namespace {
            write!(f, "/providers/{namespace}")?;
        }
        for (kind, name) in &self.segments {
            write!(f, "/{kind}/{name}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: &str = "/subscriptions/0000/resourceGroups/rg-demo/providers/Microsoft.Web/sites/my-app";

    #[test]
    fn parses_top_level_resource() {
        let id: ResourceId = SITE.parse().unwrap();
        assert_eq!(id.subscription_id(), "0000");
        assert_eq!(id.resource_group(), Some("rg-demo"));
        assert_eq!(id.namespace(), Some("Microsoft.Web"));
        assert_eq!(id.resource_type(), "sites");
        assert_eq!(id.name(), "my-app");
        assert_eq!(id.to_string(), SITE);
    }

    #[test]
    fn parses_child_resource() {
        let id: ResourceId = format!("{SITE}/slots/staging").parse().unwrap();
        assert_eq!(id.resource_type(), "slots");
        assert_eq!(id.name(), "staging");
        assert_eq!(id.parent().unwrap().to_string(), SITE);
    }

    #[test]
    fn resource_group_id() {
        let id: ResourceId = "/subscriptions/0000/resourceGroups/rg-demo".parse().unwrap();
        assert_eq!(id.resource_type(), "resourceGroups");
        assert_eq!(id.name(), "rg-demo");
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!("not-an-id".parse::<ResourceId>().is_err());
        assert!("/subscriptions/0000/foo/bar".parse::<ResourceId>().is_err());
        assert!(
            "/subscriptions/0000/resourceGroups/rg/providers/Microsoft.Web/sites"
                .parse::<ResourceId>()
                .is_err()
        );
    }

    #[test]
    fn builds_ids() {
        let id = ResourceId::new("0000", "rg-demo", "Microsoft.Web/sites", "my-app");
        assert_eq!(id.to_string(), SITE);
    }
}
