//! Explicit registry of cache warm-up functions.
//!
//! Services register a named function at startup; after subscriptions are
//! selected the account runs them all on a background thread. Preloading is
//! an optimization only, so every failure (error or panic) is logged and
//! swallowed.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::{context::OperationContext, error::CloudResult};

type PreloadFn = dyn Fn(&OperationContext) -> CloudResult<()> + Send + Sync;

#[derive(Default)]
pub struct PreloadRegistry {
    entries: RwLock<Vec<(String, Arc<PreloadFn>)>>,
}

impl PreloadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a warm-up function. Names are informational only; duplicates are
    /// allowed.
    pub fn register<F>(&self, name: impl Into<String>, preload: F)
    where
        F: Fn(&OperationContext) -> CloudResult<()> + Send + Sync + 'static,
    {
        self.entries.write().push((name.into(), Arc::new(preload)));
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.read().iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Run every registered function in registration order.
    ///
    /// Returns how many succeeded.
    pub fn run_all(&self, ctx: &OperationContext) -> usize {
        let entries: Vec<_> = self.entries.read().clone();
        debug!(count = entries.len(), "Start preloading");

        let mut succeeded = 0;
        for (name, preload) in entries {
            debug!(preload = %name, "Preloading");
            match panic::catch_unwind(AssertUnwindSafe(|| preload(ctx))) {
                Ok(Ok(())) => succeeded += 1,
                Ok(Err(e)) => debug!(preload = %name, error = %e, "Preload failed"),
                Err(_) => warn!(preload = %name, "Preload panicked"),
            }
        }

        debug!(succeeded, "End preloading");
        succeeded
    }
}
