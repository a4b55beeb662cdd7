//! Generic lifecycle for remote cloud resources.
//!
//! A [`ResourceModule`] lists and fetches [`Resource`] entities of one
//! [`ResourceKind`] through a per-kind [`ResourceClient`]. Mutations are staged
//! on a [`Draft`] and sent with exactly one vendor write on commit.

mod account;
mod cache;
mod collection;
mod context;
mod draft;
mod entity;
mod error;
mod id;
mod kind;
mod module;
mod preload;
mod region;
mod service;
mod status;

pub use account::{Account, Subscription, SubscriptionManager};
pub use cache::{ALL as ALL_KEYS, CacheManager, DEFAULT_TTL, TtlCache};
pub use collection::{ArmCollection, Buildable, CollectionClient};
pub use context::{OperationContext, TracingMessager};
pub use draft::Draft;
pub use entity::Resource;
pub use error::{CloudError, CloudResult};
pub use id::ResourceId;
pub use kind::{Overlay, ResourceKind, overrides};
pub use module::{ClientProvider, Page, Pages, ResourceClient, ResourceModule};
pub use preload::PreloadRegistry;
pub use region::Region;
pub use service::{AzureConfiguration, AzureService};
pub use status::ResourceStatus;

#[cfg(test)]
pub(crate) use collection::MockArmCollection;
