//! Generic vendor collection port and the client built on it.
//!
//! Most resource types are plain "define, then create or update" APIs. Those
//! kinds implement [`Buildable`] to turn a draft into a request payload, and
//! [`CollectionClient`] does the rest.

use std::{marker::PhantomData, sync::Arc};

use super::{
    context::OperationContext,
    draft::Draft,
    error::CloudResult,
    kind::ResourceKind,
    module::{Page, ResourceClient},
};

/// One resource type's REST collection within a subscription (or parent).
#[cfg_attr(test, mockall::automock)]
pub trait ArmCollection<R: Send + Sync + 'static>: Send + Sync {
    fn list_page<'a>(&self, continuation: Option<&'a str>) -> CloudResult<Page<R>>;

    fn get(&self, resource_group: &str, name: &str) -> CloudResult<Option<R>>;

    /// PUT semantics: create the resource or replace it.
    fn create_or_update(&self, resource_group: &str, name: &str, resource: R) -> CloudResult<R>;

    fn delete(&self, resource_group: &str, name: &str) -> CloudResult<()>;
}

/// Turns a draft into the payload sent to an [`ArmCollection`].
pub trait Buildable: ResourceKind {
    /// Payload for a create. Fails when a required field is unset.
    fn build_create(draft: &Draft<Self>) -> CloudResult<Self::Remote>;

    /// Payload for an update of `origin`.
    fn build_update(draft: &Draft<Self>, origin: &Self::Remote) -> CloudResult<Self::Remote>;
}

pub struct CollectionClient<K: ResourceKind> {
    collection: Arc<dyn ArmCollection<K::Remote>>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ResourceKind> CollectionClient<K> {
    pub fn new(collection: Arc<dyn ArmCollection<K::Remote>>) -> Self {
        Self {
            collection,
            _kind: PhantomData,
        }
    }

    pub fn shared(collection: Arc<dyn ArmCollection<K::Remote>>) -> Arc<dyn ResourceClient<K>>
    where
        K: Buildable,
    {
        Arc::new(Self::new(collection))
    }
}

impl<K: Buildable> ResourceClient<K> for CollectionClient<K> {
    fn list_page(&self, continuation: Option<&str>) -> CloudResult<Page<K::Remote>> {
        self.collection.list_page(continuation)
    }

    fn get(&self, name: &str, resource_group: &str) -> CloudResult<Option<K::Remote>> {
        self.collection.get(resource_group, name)
    }

    fn delete(&self, name: &str, resource_group: &str) -> CloudResult<()> {
        self.collection.delete(resource_group, name)
    }

    fn create(&self, draft: &Draft<K>, ctx: &OperationContext) -> CloudResult<K::Remote> {
        let payload = K::build_create(draft)?;
        ctx.messager().info(&format!(
            "Start creating {} ({})...",
            K::TYPE_NAME,
            draft.name()
        ));
        let created =
            self.collection
                .create_or_update(draft.resource_group(), draft.name(), payload)?;
        ctx.messager().success(&format!(
            "{} ({}) is successfully created.",
            K::TYPE_NAME,
            draft.name()
        ));
        Ok(created)
    }

    fn update(
        &self,
        draft: &Draft<K>,
        origin: &K::Remote,
        ctx: &OperationContext,
    ) -> CloudResult<K::Remote> {
        if !draft.is_modified() {
            return Ok(origin.clone());
        }
        let payload = K::build_update(draft, origin)?;
        ctx.messager().info(&format!(
            "Start updating {} ({})...",
            K::TYPE_NAME,
            draft.name()
        ));
        let updated =
            self.collection
                .create_or_update(draft.resource_group(), draft.name(), payload)?;
        ctx.messager().success(&format!(
            "{} ({}) is successfully updated.",
            K::TYPE_NAME,
            draft.name()
        ));
        Ok(updated)
    }
}
