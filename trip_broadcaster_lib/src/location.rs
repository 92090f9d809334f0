use std::{fmt, sync::Arc, time::Duration};

use crate::coordinate::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// Only report fixes of the best quality the provider can produce.
    pub high_accuracy: bool,
    /// Max time to wait for a fix before reporting `LocationError::Timeout`.
    pub timeout: Duration,
    /// How old a cached fix may be. Zero means every report must be fresh.
    pub max_cached_age: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_millis(5000),
            max_cached_age: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watch#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationError {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationError::PermissionDenied => write!(f, "permission denied"),
            LocationError::PositionUnavailable => write!(f, "position unavailable"),
            LocationError::Timeout => write!(f, "timed out waiting for a position"),
        }
    }
}

impl std::error::Error for LocationError {}

#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    Position(Position),
    Error(LocationError),
}

pub type LocationCallback = Box<dyn Fn(LocationEvent) + Send + Sync + 'static>;

/// A continuous location capability, modelled on `watchPosition`/`clearWatch`.
///
/// The callback may be invoked from any thread until `clear_watch` returns.
pub trait LocationProvider: Send + Sync {
    fn is_supported(&self) -> bool;

    fn watch_position(&self, options: WatchOptions, callback: LocationCallback) -> WatchId;

    fn clear_watch(&self, id: WatchId);
}

/// Owns a live subscription. The watch is cleared by `release`, or on drop if
/// it was never released explicitly. Either way `clear_watch` runs once.
pub struct WatchGuard {
    provider: Arc<dyn LocationProvider>,
    id: Option<WatchId>,
    generation: u64,
}

impl WatchGuard {
    pub fn new(provider: Arc<dyn LocationProvider>, id: WatchId, generation: u64) -> Self {
        Self {
            provider,
            id: Some(id),
            generation,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns false if the watch had already been cleared.
    pub fn release(&mut self) -> bool {
        let Some(id) = self.id.take() else {
            return false;
        };
        tracing::debug!("Clearing {}", id);
        self.provider.clear_watch(id);
        true
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for WatchGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WatchGuard {{ id: {:?}, generation: {} }}", self.id, self.generation)
    }
}
