use std::{fmt, sync::Arc};

use super::{entity::Resource, kind::Overlay, kind::ResourceKind};

/// Staged create or update of one resource.
///
/// Setters only touch the overlay config. Committing through
/// [`ResourceModule::commit`](super::ResourceModule::commit) consumes the
/// draft, so a draft is written at most once.
pub struct Draft<K: ResourceKind> {
    name: String,
    resource_group: String,
    subscription_id: String,
    origin: Option<Arc<Resource<K>>>,
    config: K::Config,
}

impl<K: ResourceKind> Draft<K> {
    pub(crate) fn for_create(name: &str, resource_group: &str, subscription_id: &str) -> Self {
        Self {
            name: name.to_string(),
            resource_group: resource_group.to_string(),
            subscription_id: subscription_id.to_string(),
            origin: None,
            config: K::Config::default(),
        }
    }

    pub(crate) fn for_update(origin: Arc<Resource<K>>) -> Self {
        Self {
            name: origin.name().to_string(),
            resource_group: origin.resource_group().to_string(),
            subscription_id: origin.subscription_id().to_string(),
            origin: Some(origin),
            config: K::Config::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resource_group(&self) -> &str {
        &self.resource_group
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// The entity being updated; `None` for a create.
    pub fn origin(&self) -> Option<&Arc<Resource<K>>> {
        self.origin.as_ref()
    }

    pub fn is_for_create(&self) -> bool {
        self.origin.is_none()
    }

    pub fn config(&self) -> &K::Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut K::Config {
        &mut self.config
    }

    pub fn set_config(&mut self, config: K::Config) {
        self.config = config;
    }

    /// Whether committing would change anything on the origin.
    pub fn is_modified(&self) -> bool {
        match &self.origin {
            Some(origin) => origin
                .with_remote(|remote| self.config.differs_from(Some(remote)))
                .unwrap_or_else(|| self.config.differs_from(None)),
            None => self.config.differs_from(None),
        }
    }

    /// Drop everything staged so far.
    pub fn reset(&mut self) {
        self.config = K::Config::default();
    }

    /// Read a field off the origin's snapshot.
    pub fn from_origin<T>(&self, f: impl FnOnce(&K::Remote) -> Option<T>) -> Option<T> {
        self.origin
            .as_ref()
            .and_then(|origin| origin.with_remote(f))
            .flatten()
    }
}

impl<K: ResourceKind> fmt::Debug for Draft<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Draft")
            .field("type", &K::TYPE_NAME)
            .field("name", &self.name)
            .field("resource_group", &self.resource_group)
            .field("for_create", &self.is_for_create())
            .field("config", &self.config)
            .finish()
    }
}
