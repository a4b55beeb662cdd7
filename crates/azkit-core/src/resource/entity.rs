use std::fmt;

use parking_lot::RwLock;

use super::{id::ResourceId, kind::ResourceKind, status::ResourceStatus};

struct State<R> {
    remote: Option<R>,
    status: ResourceStatus,
    /// Set by a delete; the owning module drops the entry on next access.
    evict_on_access: bool,
}

/// Local handle on one remote resource.
///
/// Entities are shared (`Arc`) between the module cache and callers, so all
/// mutable state sits behind a lock.
pub struct Resource<K: ResourceKind> {
    name: String,
    resource_group: String,
    subscription_id: String,
    state: RwLock<State<K::Remote>>,
}

impl<K: ResourceKind> Resource<K> {
    pub(crate) fn new(name: &str, resource_group: &str, subscription_id: &str) -> Self {
        Self {
            name: name.to_string(),
            resource_group: resource_group.to_string(),
            subscription_id: subscription_id.to_string(),
            state: RwLock::new(State {
                remote: None,
                status: ResourceStatus::Unknown,
                evict_on_access: false,
            }),
        }
    }

    pub(crate) fn from_remote(remote: K::Remote, subscription_id: &str) -> Self {
        let entity = Self::new(
            K::name_of(&remote),
            K::resource_group_of(&remote),
            subscription_id,
        );
        entity.set_remote(Some(remote));
        entity
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

    pub fn id(&self) -> ResourceId {
        K::resource_id(&self.subscription_id, &self.resource_group, &self.name)
    }

    /// Last fetched snapshot, if any.
    pub fn remote(&self) -> Option<K::Remote> {
        self.state.read().remote.clone()
    }

    /// Read a value off the snapshot without cloning it.
    pub fn with_remote<T>(&self, f: impl FnOnce(&K::Remote) -> T) -> Option<T> {
        self.state.read().remote.as_ref().map(f)
    }

    pub fn status(&self) -> ResourceStatus {
        self.state.read().status.clone()
    }

    pub fn exists(&self) -> bool {
        let state = self.state.read();
        state.remote.is_some() && !state.status.is_deleted()
    }

    pub(crate) fn set_remote(&self, remote: Option<K::Remote>) {
        let mut state = self.state.write();
        state.status = remote
            .as_ref()
            .map_or(ResourceStatus::Deleted, K::status_of);
        state.remote = remote;
    }

    pub(crate) fn set_status(&self, status: ResourceStatus) {
        self.state.write().status = status;
    }

    /// Recompute the status from the snapshot after a failed operation.
    pub(crate) fn reset_status(&self) {
        let mut state = self.state.write();
        state.status = match &state.remote {
            Some(remote) => K::status_of(remote),
            None => ResourceStatus::Unknown,
        };
    }

    pub(crate) fn mark_deleted(&self) {
        let mut state = self.state.write();
        state.remote = None;
        state.status = ResourceStatus::Deleted;
        state.evict_on_access = true;
    }

    pub(crate) fn is_evicted(&self) -> bool {
        self.state.read().evict_on_access
    }
}

impl<K: ResourceKind> fmt::Debug for Resource<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(K::TYPE_NAME)
            .field("name", &self.name)
            .field("resource_group", &self.resource_group)
            .field("subscription_id", &self.subscription_id)
            .field("status", &self.status())
            .finish()
    }
}
