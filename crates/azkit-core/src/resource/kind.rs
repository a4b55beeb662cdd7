use std::fmt;

use super::{id::ResourceId, status::ResourceStatus};

/// Static description of one resource type.
///
/// Implemented by zero-sized marker types; the generic [`Resource`],
/// [`Draft`] and [`ResourceModule`] are parameterized over it.
///
/// [`Resource`]: super::Resource
/// [`Draft`]: super::Draft
/// [`ResourceModule`]: super::ResourceModule
pub trait ResourceKind: Sized + Send + Sync + 'static {
    /// Snapshot of the server-side state.
    type Remote: Clone + fmt::Debug + Send + Sync + 'static;

    /// Overlay a draft stages before committing.
    type Config: Overlay<Self::Remote>;

    /// ARM type, e.g. `Microsoft.Web/sites`.
    const FULL_TYPE: &'static str;

    /// Name used in user-facing messages, e.g. `Function app`.
    const TYPE_NAME: &'static str;

    fn name_of(remote: &Self::Remote) -> &str;

    fn resource_group_of(remote: &Self::Remote) -> &str;

    fn status_of(_remote: &Self::Remote) -> ResourceStatus {
        ResourceStatus::Active
    }

    fn resource_id(subscription_id: &str, resource_group: &str, name: &str) -> ResourceId {
        ResourceId::new(subscription_id, resource_group, Self::FULL_TYPE, name)
    }
}

/// Staged field values of a draft. `None` fields fall through to the origin.
pub trait Overlay<R>: Default + Clone + fmt::Debug + Send + Sync {
    /// Whether any field set here differs from the current value on `origin`.
    fn differs_from(&self, origin: Option<&R>) -> bool;
}

/// For resources whose drafts stage nothing.
impl<R> Overlay<R> for () {
    fn differs_from(&self, _origin: Option<&R>) -> bool {
        false
    }
}

/// `true` when `staged` is set and not equal to `current`.
pub fn overrides<T: PartialEq>(staged: &Option<T>, current: Option<&T>) -> bool {
    staged.as_ref().is_some_and(|v| Some(v) != current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_overlay_never_overrides() {
        assert!(!overrides::<u32>(&None, Some(&1)));
        assert!(!overrides(&Some(1), Some(&1)));
        assert!(overrides(&Some(2), Some(&1)));
        assert!(overrides(&Some(2), None));
    }
}
