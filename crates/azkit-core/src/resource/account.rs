//! Signed-in account and subscription selection.

use std::{
    collections::HashSet,
    sync::Arc,
    thread::{self, JoinHandle},
};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{
    context::OperationContext,
    error::{CloudError, CloudResult},
    preload::PreloadRegistry,
    service::AzureConfiguration,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub name: String,
    pub tenant_id: String,
    #[serde(default)]
    pub selected: bool,
}

/// Vendor port listing the subscriptions visible to the credential.
#[cfg_attr(test, mockall::automock)]
pub trait SubscriptionManager: Send + Sync {
    fn list_subscriptions(&self) -> CloudResult<Vec<Subscription>>;
}

pub struct Account {
    manager: Box<dyn SubscriptionManager>,
    config: AzureConfiguration,
    preloads: Arc<PreloadRegistry>,
    ctx: OperationContext,
    subscriptions: RwLock<Option<Vec<Subscription>>>,
}

impl Account {
    pub fn new(
        manager: Box<dyn SubscriptionManager>,
        config: AzureConfiguration,
        preloads: Arc<PreloadRegistry>,
        ctx: OperationContext,
    ) -> Self {
        Self {
            manager,
            config,
            preloads,
            ctx,
            subscriptions: RwLock::new(None),
        }
    }

    /// Fetch subscriptions again, keeping the current selection.
    pub fn reload_subscriptions(&self) -> CloudResult<Vec<Subscription>> {
        let selected: HashSet<String> = self
            .subscriptions
            .read()
            .iter()
            .flatten()
            .filter(|s| s.selected)
            .map(|s| s.id.to_lowercase())
            .collect();

        let mut loaded = self.manager.list_subscriptions()?;
        loaded.sort_by_key(|s| s.name.to_lowercase());
        let mut seen = HashSet::new();
        loaded.retain(|s| seen.insert(s.id.to_lowercase()));
        for subscription in &mut loaded {
            subscription.selected = selected.contains(&subscription.id.to_lowercase());
        }

        debug!(count = loaded.len(), "Subscriptions loaded");
        *self.subscriptions.write() = Some(loaded.clone());
        Ok(loaded)
    }

    pub fn is_signed_in(&self) -> bool {
        self.subscriptions
            .read()
            .as_ref()
            .is_some_and(|s| !s.is_empty())
    }

    pub fn subscriptions(&self) -> CloudResult<Vec<Subscription>> {
        match self.subscriptions.read().as_ref() {
            Some(subscriptions) if !subscriptions.is_empty() => Ok(subscriptions.clone()),
            _ => Err(CloudError::InvalidArgument(
                "You are not signed-in or there are no subscriptions in your current Account."
                    .into(),
            )),
        }
    }

    pub fn subscription(&self, id: &str) -> CloudResult<Subscription> {
        self.subscriptions()?
            .into_iter()
            .find(|s| s.id.eq_ignore_ascii_case(id))
            .ok_or_else(|| {
                CloudError::InvalidArgument(format!("Cannot find subscription with id '{id}'"))
            })
    }

    pub fn selected_subscriptions(&self) -> CloudResult<Vec<Subscription>> {
        Ok(self
            .subscriptions()?
            .into_iter()
            .filter(|s| s.selected)
            .collect())
    }

    /// Select exactly `ids` (case-insensitive).
    ///
    /// When preloading is enabled the registered warm-up functions start on a
    /// background thread; its handle is returned so callers may wait for it.
    pub fn select_subscriptions(&self, ids: &[String]) -> CloudResult<Option<JoinHandle<usize>>> {
        if ids.is_empty() {
            return Err(CloudError::InvalidArgument(
                "No subscriptions are selected. You must select at least one subscription."
                    .into(),
            ));
        }
        let wanted: HashSet<String> = ids.iter().map(|id| id.to_lowercase()).collect();

        {
            let mut guard = self.subscriptions.write();
            let subscriptions = guard.as_mut().filter(|s| !s.is_empty()).ok_or_else(|| {
                CloudError::InvalidArgument(
                    "You are not signed-in or there are no subscriptions in your current Account."
                        .into(),
                )
            })?;
            for subscription in subscriptions.iter_mut() {
                subscription.selected = wanted.contains(&subscription.id.to_lowercase());
            }
        }
        info!(count = wanted.len(), "Subscriptions selected");

        if !self.config.enable_preloading || self.preloads.is_empty() {
            return Ok(None);
        }
        let preloads = Arc::clone(&self.preloads);
        let ctx = self.ctx.clone();
        Ok(Some(thread::spawn(move || preloads.run_all(&ctx))))
    }
}
