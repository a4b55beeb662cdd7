//! Per-operation context threaded through resource calls.

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::{cache::CacheManager, error::CloudResult};
use crate::application::ports::{MessageLevel, Messager};

/// Where user-facing progress goes and which caches lookups may use.
///
/// Cheap to clone; clones share the messager, the caches and the set of
/// background tasks.
#[derive(Clone)]
pub struct OperationContext {
    messager: Arc<dyn Messager>,
    caches: Arc<CacheManager>,
    background: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new(Arc::new(TracingMessager), Arc::new(CacheManager::default()))
    }
}

impl OperationContext {
    pub fn new(messager: Arc<dyn Messager>, caches: Arc<CacheManager>) -> Self {
        Self {
            messager,
            caches,
            background: Arc::default(),
        }
    }

    /// Same caches, different message sink.
    pub fn with_messager(&self, messager: Arc<dyn Messager>) -> Self {
        Self {
            messager,
            caches: Arc::clone(&self.caches),
            background: Arc::clone(&self.background),
        }
    }

    pub fn messager(&self) -> &dyn Messager {
        self.messager.as_ref()
    }

    pub fn caches(&self) -> &CacheManager {
        &self.caches
    }

    /// Run `task` on its own thread. A failure is reported as a warning and
    /// never reaches the caller.
    pub fn spawn_background<F>(&self, title: impl Into<String>, task: F)
    where
        F: FnOnce(&OperationContext) -> CloudResult<()> + Send + 'static,
    {
        let title = title.into();
        let ctx = self.clone();
        debug!(task = %title, "Spawning background task");
        let handle = thread::spawn(move || {
            if let Err(e) = task(&ctx) {
                warn!(task = %title, error = %e, "Background task failed");
                ctx.messager()
                    .warning(&format!("{title} failed: {e}"));
            }
        });
        let mut handles = self.background.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Wait for every background task spawned so far.
    pub fn join_background(&self) {
        let handles: Vec<_> = self.background.lock().drain(..).collect();
        for handle in handles {
            if handle.join().is_err() {
                error!("Background task panicked");
            }
        }
    }
}

/// Messager that forwards to `tracing`. Used when no sink is supplied.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMessager;

impl Messager for TracingMessager {
    fn show(&self, level: MessageLevel, message: &str) {
        match level {
            MessageLevel::Info | MessageLevel::Success => info!("{message}"),
            MessageLevel::Warning => warn!("{message}"),
            MessageLevel::Error => error!("{message}"),
        }
    }
}
