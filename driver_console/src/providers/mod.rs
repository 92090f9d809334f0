use std::{
    collections::HashMap,
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use tokio::{runtime::Handle, task::JoinHandle};
use trip_broadcaster_lib::location::{LocationProvider, WatchId};

use crate::config::{Config, LocationSource};

pub mod nmea_stream;
pub mod simulated;
pub mod unavailable;

pub use nmea_stream::NmeaProvider;
pub use simulated::SimulatedProvider;
pub use unavailable::UnavailableProvider;

/// Book keeping for watches backed by a tokio task each.
pub struct WatchRegistry {
    runtime: Handle,
    next_id: AtomicU64,
    tasks: Mutex<HashMap<WatchId, JoinHandle<()>>>,
}

impl WatchRegistry {
    /// Must be called from within a tokio runtime.
    pub fn new() -> Self {
        Self {
            runtime: Handle::current(),
            next_id: AtomicU64::new(1),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    pub fn spawn<F>(&self, task: F) -> WatchId
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = WatchId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let handle = self.runtime.spawn(task);
        match self.tasks.lock() {
            Ok(mut tasks) => {
                tasks.insert(id, handle);
            },
            Err(_) => {
                tracing::error!("Watch registry poisoned, aborting {}", id);
                handle.abort();
            },
        }
        id
    }

    pub fn clear(&self, id: WatchId) {
        let handle = match self.tasks.lock() {
            Ok(mut tasks) => tasks.remove(&id),
            Err(_) => None,
        };

        match handle {
            Some(handle) => {
                handle.abort();
                tracing::debug!("Stopped {}", id);
            },
            None => tracing::warn!("Tried to clear unknown {}", id),
        }
    }

    #[cfg(test)]
    pub(crate) fn active(&self) -> usize {
        self.tasks.lock().map(|tasks| tasks.len()).unwrap_or(0)
    }
}

pub fn from_config(config: &Config) -> Arc<dyn LocationProvider> {
    match &config.source {
        LocationSource::NmeaFile(path) => Arc::new(NmeaProvider::replay(path.clone(), config.interval)),
        LocationSource::NmeaTcp(addr) => Arc::new(NmeaProvider::tcp(addr.clone())),
        LocationSource::Simulated => Arc::new(SimulatedProvider::new(config.interval)),
        LocationSource::Unavailable => Arc::new(UnavailableProvider),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn clear_aborts_task() {
        let registry = WatchRegistry::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<()>();

        let id = registry.spawn(async move {
            let _tx = tx;
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        assert_eq!(registry.active(), 1);

        registry.clear(id);

        // The sender is dropped with the aborted task.
        assert!(rx.recv().await.is_none());
        assert_eq!(registry.active(), 0);
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let registry = WatchRegistry::new();
        let a = registry.spawn(async {});
        let b = registry.spawn(async {});
        assert_ne!(a, b);
    }
}
