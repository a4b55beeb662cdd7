//! Typed collection of one resource kind under a parent.

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use tracing::{debug, instrument};

use super::{
    context::OperationContext,
    draft::Draft,
    entity::Resource,
    error::{CloudError, CloudResult},
    id::ResourceId,
    kind::ResourceKind,
    status::ResourceStatus,
};

/// One page of a vendor listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    pub items: Vec<R>,
    /// Token for the next page; `None` on the last page.
    pub continuation: Option<String>,
}

impl<R> Page<R> {
    pub fn last(items: Vec<R>) -> Self {
        Self {
            items,
            continuation: None,
        }
    }
}

/// Per-kind strategy for talking to the vendor.
///
/// `create` and `update` are the only writes. They receive the draft with its
/// staged overlay and must validate what they need before calling out.
pub trait ResourceClient<K: ResourceKind>: Send + Sync {
    fn list_page(&self, continuation: Option<&str>) -> CloudResult<Page<K::Remote>>;

    /// `Ok(None)` (or a not-found error) means the resource is absent.
    fn get(&self, name: &str, resource_group: &str) -> CloudResult<Option<K::Remote>>;

    fn delete(&self, name: &str, resource_group: &str) -> CloudResult<()>;

    fn create(&self, draft: &Draft<K>, ctx: &OperationContext) -> CloudResult<K::Remote>;

    fn update(
        &self,
        draft: &Draft<K>,
        origin: &K::Remote,
        ctx: &OperationContext,
    ) -> CloudResult<K::Remote>;
}

/// Builds the client on first use. `Ok(None)` means the parent is gone.
pub type ClientProvider<K> =
    Box<dyn Fn() -> CloudResult<Option<Arc<dyn ResourceClient<K>>>> + Send + Sync>;

type CacheKey = (String, String);

fn cache_key(name: &str, resource_group: &str) -> CacheKey {
    (name.to_lowercase(), resource_group.to_lowercase())
}

pub struct ResourceModule<K: ResourceKind> {
    name: String,
    subscription_id: String,
    provider: ClientProvider<K>,
    client: RwLock<Option<Arc<dyn ResourceClient<K>>>>,
    entities: RwLock<HashMap<CacheKey, Arc<Resource<K>>>>,
}

impl<K: ResourceKind> ResourceModule<K> {
    pub fn new<F>(name: impl Into<String>, subscription_id: impl Into<String>, provider: F) -> Self
    where
        F: Fn() -> CloudResult<Option<Arc<dyn ResourceClient<K>>>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            subscription_id: subscription_id.into(),
            provider: Box::new(provider),
            client: RwLock::new(None),
            entities: RwLock::new(HashMap::new()),
        }
    }

    /// Module with a fixed client, for parents that always exist.
    pub fn with_client(
        name: impl Into<String>,
        subscription_id: impl Into<String>,
        client: Arc<dyn ResourceClient<K>>,
    ) -> Self {
        Self::new(name, subscription_id, move || Ok(Some(Arc::clone(&client))))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn resource_type_name(&self) -> &'static str {
        K::TYPE_NAME
    }

    /// The vendor client, built on first use. `None` when the parent does not
    /// exist, in which case the cache is emptied.
    pub fn client(&self) -> CloudResult<Option<Arc<dyn ResourceClient<K>>>> {
        if let Some(client) = self.client.read().as_ref() {
            return Ok(Some(Arc::clone(client)));
        }

        match (self.provider)()? {
            Some(client) => {
                *self.client.write() = Some(Arc::clone(&client));
                Ok(Some(client))
            }
            None => {
                debug!(module = %self.name, "Parent does not exist");
                self.entities.write().clear();
                Ok(None)
            }
        }
    }

    fn require_client(&self) -> CloudResult<Arc<dyn ResourceClient<K>>> {
        self.client()?.ok_or_else(|| CloudError::ParentMissing {
            module: self.name.clone(),
        })
    }

    /// Lazily page through the vendor listing.
    pub fn pages(&self) -> Pages<'_, K> {
        Pages {
            module: self,
            state: PageState::Start,
        }
    }

    /// Every entity under the parent. Empty when the parent does not exist.
    pub fn list(&self) -> CloudResult<Vec<Arc<Resource<K>>>> {
        let mut all = Vec::new();
        for page in self.pages() {
            all.extend(page?);
        }
        Ok(all)
    }

    /// The cached entity, or one fetched now. Absent resources come back as
    /// entities in [`ResourceStatus::Deleted`] and are cached too.
    #[instrument(skip(self), fields(module = %self.name))]
    pub fn get(&self, name: &str, resource_group: &str) -> CloudResult<Arc<Resource<K>>> {
        let key = cache_key(name, resource_group);
        if let Some(cached) = self.cached(&key) {
            return Ok(cached);
        }

        let entity = Arc::new(Resource::new(name, resource_group, &self.subscription_id));
        entity.set_status(ResourceStatus::Loading);
        let remote = match self.client()? {
            Some(client) => match client.get(name, resource_group) {
                Ok(remote) => remote,
                Err(e) if e.is_not_found() => None,
                Err(e) => return Err(e),
            },
            None => None,
        };
        entity.set_remote(remote);
        debug!(status = %entity.status(), "Loaded");

        Ok(Arc::clone(
            self.entities.write().entry(key).or_insert(entity),
        ))
    }

    pub fn exists(&self, name: &str, resource_group: &str) -> CloudResult<bool> {
        Ok(self.get(name, resource_group)?.exists())
    }

    pub fn get_by_id(&self, id: &str) -> CloudResult<Arc<Resource<K>>> {
        let parsed: ResourceId = id.parse()?;
        let resource_group = parsed
            .resource_group()
            .ok_or_else(|| CloudError::InvalidResourceId {
                id: id.to_string(),
                reason: "no resource group".into(),
            })?;
        self.get(parsed.name(), resource_group)
    }

    /// Delete remotely. The entity turns [`ResourceStatus::Deleted`] and is
    /// dropped from the cache on next access.
    #[instrument(skip_all, fields(module = %self.name, name = entity.name()))]
    pub fn delete(&self, entity: &Resource<K>) -> CloudResult<()> {
        let client = self.require_client()?;
        entity.set_status(ResourceStatus::Deleting);
        match client.delete(entity.name(), entity.resource_group()) {
            Ok(()) => {
                entity.mark_deleted();
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                entity.mark_deleted();
                Ok(())
            }
            Err(e) => {
                entity.reset_status();
                Err(e)
            }
        }
    }

    /// A draft for a new resource. Nothing is sent until it is committed.
    pub fn create(&self, name: &str, resource_group: &str) -> Draft<K> {
        Draft::for_create(name, resource_group, &self.subscription_id)
    }

    /// A draft updating `entity`. Nothing is sent until it is committed.
    pub fn update(&self, entity: Arc<Resource<K>>) -> Draft<K> {
        Draft::for_update(entity)
    }

    /// Send the draft with exactly one vendor write and cache the result.
    #[instrument(skip_all, fields(module = %self.name, name = draft.name()))]
    pub fn commit(&self, draft: Draft<K>, ctx: &OperationContext) -> CloudResult<Arc<Resource<K>>> {
        let client = self.require_client()?;
        let key = cache_key(draft.name(), draft.resource_group());

        if draft.is_for_create() {
            let entity = {
                let mut entities = self.entities.write();
                let slot = entities.entry(key).or_insert_with(|| {
                    Arc::new(Resource::new(
                        draft.name(),
                        draft.resource_group(),
                        &self.subscription_id,
                    ))
                });
                if slot.is_evicted() {
                    *slot = Arc::new(Resource::new(
                        draft.name(),
                        draft.resource_group(),
                        &self.subscription_id,
                    ));
                }
                Arc::clone(slot)
            };

            entity.set_status(ResourceStatus::Creating);
            return match client.create(&draft, ctx) {
                Ok(remote) => {
                    entity.set_remote(Some(remote));
                    Ok(entity)
                }
                Err(e) => {
                    entity.reset_status();
                    Err(e)
                }
            };
        }

        let entity = self.get(draft.name(), draft.resource_group())?;
        let Some(current) = entity.remote().filter(|_| entity.exists()) else {
            return Err(CloudError::NotFound(format!(
                "resource \"{}\" doesn't exist",
                draft.name()
            )));
        };

        entity.set_status(ResourceStatus::Updating);
        match client.update(&draft, &current, ctx) {
            Ok(remote) => {
                entity.set_remote(Some(remote));
                Ok(entity)
            }
            Err(e) => {
                entity.reset_status();
                Err(e)
            }
        }
    }

    /// Commit only when the resource is absent; otherwise return what exists.
    pub fn create_if_not_exist(
        &self,
        draft: Draft<K>,
        ctx: &OperationContext,
    ) -> CloudResult<Arc<Resource<K>>> {
        let existing = self.get(draft.name(), draft.resource_group())?;
        if existing.exists() {
            debug!(name = draft.name(), "Already exists, skip creating");
            return Ok(existing);
        }
        self.commit(draft, ctx)
    }

    /// The cached entity, or a draft for creating it when it does not exist.
    pub fn get_or_draft(
        &self,
        name: &str,
        resource_group: &str,
    ) -> CloudResult<Result<Arc<Resource<K>>, Draft<K>>> {
        let entity = self.get(name, resource_group)?;
        Ok(if entity.exists() {
            Ok(entity)
        } else {
            Err(self.create(name, resource_group))
        })
    }

    /// Re-fetch one entity, bypassing the cache.
    pub fn refresh(&self, entity: &Arc<Resource<K>>) -> CloudResult<()> {
        let remote = match self.client()? {
            Some(client) => match client.get(entity.name(), entity.resource_group()) {
                Ok(remote) => remote,
                Err(e) if e.is_not_found() => None,
                Err(e) => return Err(e),
            },
            None => None,
        };
        entity.set_remote(remote);
        Ok(())
    }

    /// Forget every cached entity and the client handle.
    pub fn invalidate_cache(&self) {
        debug!(module = %self.name, "Invalidating cache");
        self.entities.write().clear();
        *self.client.write() = None;
    }

    /// Entities currently cached, in no particular order.
    pub fn cached_entities(&self) -> Vec<Arc<Resource<K>>> {
        self.entities
            .read()
            .values()
            .filter(|e| !e.is_evicted())
            .cloned()
            .collect()
    }

    fn cached(&self, key: &CacheKey) -> Option<Arc<Resource<K>>> {
        let cached = self.entities.read().get(key).cloned()?;
        if cached.is_evicted() {
            self.entities.write().remove(key);
            return None;
        }
        Some(cached)
    }

    fn merge(&self, remote: K::Remote) -> Arc<Resource<K>> {
        let key = cache_key(K::name_of(&remote), K::resource_group_of(&remote));
        let mut entities = self.entities.write();
        match entities.get(&key) {
            Some(existing) if !existing.is_evicted() => {
                existing.set_remote(Some(remote));
                Arc::clone(existing)
            }
            _ => {
                let entity = Arc::new(Resource::from_remote(remote, &self.subscription_id));
                entities.insert(key, Arc::clone(&entity));
                entity
            }
        }
    }
}

enum PageState {
    Start,
    Next(String),
    Done,
}

/// Iterator over listing pages, fetched one at a time.
pub struct Pages<'m, K: ResourceKind> {
    module: &'m ResourceModule<K>,
    state: PageState,
}

impl<K: ResourceKind> Iterator for Pages<'_, K> {
    type Item = CloudResult<Vec<Arc<Resource<K>>>>;

    fn next(&mut self) -> Option<Self::Item> {
        let continuation = match std::mem::replace(&mut self.state, PageState::Done) {
            PageState::Done => return None,
            PageState::Start => None,
            PageState::Next(token) => Some(token),
        };

        let client = match self.module.client() {
            Ok(Some(client)) => client,
            Ok(None) => return None,
            Err(e) => return Some(Err(e)),
        };

        match client.list_page(continuation.as_deref()) {
            Ok(page) => {
                if let Some(next) = page.continuation {
                    self.state = PageState::Next(next);
                }
                Some(Ok(page
                    .items
                    .into_iter()
                    .map(|remote| self.module.merge(remote))
                    .collect()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
