//! A process-local [`ArmCollection`] keyed the way ARM keys resources.

use std::{collections::BTreeMap, marker::PhantomData};

use azkit_core::resource::{ArmCollection, CloudError, CloudResult, Page, ResourceKind};
use parking_lot::RwLock;
use tracing::debug;

type Key = (String, String);
type Hook<R> = Box<dyn Fn(&mut R) + Send + Sync>;

/// Resources of one kind, keyed case-insensitively by (resource group, name).
///
/// Listing pages through the resources in key order, `page_size` at a time;
/// the continuation token is the offset of the next page. An optional hook
/// stamps server-assigned fields on every write.
pub struct InMemoryCollection<K: ResourceKind> {
    items: RwLock<BTreeMap<Key, K::Remote>>,
    page_size: usize,
    on_write: Option<Hook<K::Remote>>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ResourceKind> Default for InMemoryCollection<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ResourceKind> InMemoryCollection<K> {
    pub const DEFAULT_PAGE_SIZE: usize = 50;

    pub fn new() -> Self {
        Self {
            items: RwLock::default(),
            page_size: Self::DEFAULT_PAGE_SIZE,
            on_write: None,
            _kind: PhantomData,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn on_write(mut self, hook: impl Fn(&mut K::Remote) + Send + Sync + 'static) -> Self {
        self.on_write = Some(Box::new(hook));
        self
    }

    fn key(resource_group: &str, name: &str) -> Key {
        (resource_group.to_lowercase(), name.to_lowercase())
    }

    /// Store `resource` as-is, bypassing the write hook.
    pub fn seed(&self, resource: K::Remote) {
        let key = Self::key(K::resource_group_of(&resource), K::name_of(&resource));
        self.items.write().insert(key, resource);
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn snapshot(&self, resource_group: &str, name: &str) -> Option<K::Remote> {
        self.items
            .read()
            .get(&Self::key(resource_group, name))
            .cloned()
    }

    /// Apply `f` to a stored resource in place.
    pub fn modify<T>(
        &self,
        resource_group: &str,
        name: &str,
        f: impl FnOnce(&mut K::Remote) -> T,
    ) -> CloudResult<T> {
        self.items
            .write()
            .get_mut(&Self::key(resource_group, name))
            .map(f)
            .ok_or_else(|| not_found::<K>(resource_group, name))
    }
}

fn not_found<K: ResourceKind>(resource_group: &str, name: &str) -> CloudError {
    CloudError::http(
        404,
        format!(
            "{} '{name}' was not found in resource group '{resource_group}'",
            K::TYPE_NAME
        ),
    )
}

impl<K: ResourceKind> ArmCollection<K::Remote> for InMemoryCollection<K> {
    fn list_page(&self, continuation: Option<&str>) -> CloudResult<Page<K::Remote>> {
        let offset = match continuation {
            Some(token) => token.parse::<usize>().map_err(|_| {
                CloudError::InvalidArgument(format!("Invalid continuation token '{token}'"))
            })?,
            None => 0,
        };
        let items = self.items.read();
        let page: Vec<_> = items
            .values()
            .skip(offset)
            .take(self.page_size)
            .cloned()
            .collect();
        let next = offset + page.len();
        Ok(Page {
            items: page,
            continuation: (next < items.len()).then(|| next.to_string()),
        })
    }

    fn get(&self, resource_group: &str, name: &str) -> CloudResult<Option<K::Remote>> {
        Ok(self.snapshot(resource_group, name))
    }

    fn create_or_update(
        &self,
        resource_group: &str,
        name: &str,
        mut resource: K::Remote,
    ) -> CloudResult<K::Remote> {
        if let Some(hook) = &self.on_write {
            hook(&mut resource);
        }
        debug!(kind = K::TYPE_NAME, resource_group, name, "Stored resource");
        self.items
            .write()
            .insert(Self::key(resource_group, name), resource.clone());
        Ok(resource)
    }

    fn delete(&self, resource_group: &str, name: &str) -> CloudResult<()> {
        self.items
            .write()
            .remove(&Self::key(resource_group, name))
            .map(|_| ())
            .ok_or_else(|| not_found::<K>(resource_group, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azkit_core::cloud::resources::{ResourceGroup, ResourceGroupKind};
    use azkit_core::resource::Region;

    fn group(name: &str) -> ResourceGroup {
        ResourceGroup {
            name: name.into(),
            region: Region::from_name("eastus"),
            provisioning_state: None,
            tags: Default::default(),
        }
    }

    #[test]
    fn pages_follow_continuation_tokens() {
        let groups = InMemoryCollection::<ResourceGroupKind>::new().with_page_size(2);
        for name in ["a", "b", "c"] {
            groups.seed(group(name));
        }

        let first = groups.list_page(None).unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.continuation.as_deref(), Some("2"));

        let last = groups.list_page(first.continuation.as_deref()).unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(last.continuation.is_none());
    }

    #[test]
    fn keys_ignore_case_and_writes_run_the_hook() {
        let groups = InMemoryCollection::<ResourceGroupKind>::new()
            .on_write(|g| g.provisioning_state = Some("Succeeded".into()));
        groups.create_or_update("RG", "RG", group("RG")).unwrap();

        let stored = groups.get("rg", "rg").unwrap().unwrap();
        assert_eq!(stored.provisioning_state.as_deref(), Some("Succeeded"));

        groups.delete("Rg", "rG").unwrap();
        assert_eq!(groups.delete("rg", "rg").unwrap_err().status(), Some(404));
    }
}
