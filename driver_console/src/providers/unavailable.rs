use trip_broadcaster_lib::location::{LocationCallback, LocationError, LocationEvent, LocationProvider, WatchId, WatchOptions};

/// No location capability on this machine.
pub struct UnavailableProvider;

impl LocationProvider for UnavailableProvider {
    fn is_supported(&self) -> bool {
        false
    }

    fn watch_position(&self, _options: WatchOptions, callback: LocationCallback) -> WatchId {
        tracing::warn!("Location requested from a machine without location support");
        callback(LocationEvent::Error(LocationError::PositionUnavailable));
        WatchId(0)
    }

    fn clear_watch(&self, _id: WatchId) {}
}
