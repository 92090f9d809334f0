use std::time::Duration;

use trip_broadcaster_lib::{
    coordinate::{Coordinate, Position},
    location::{LocationCallback, LocationError, LocationEvent, LocationProvider, WatchId, WatchOptions},
};

use super::WatchRegistry;

const METERS_PER_DEGREE: f64 = 111_320.0;

const START: Coordinate = Coordinate {
    lat: 55.676098,
    lng: 12.568337,
};
const HEADING_DEG: f64 = 45.0;
const SPEED_MPS: f64 = 12.0;
const ACCURACY_M: f64 = 4.0;

/// A van driving in a straight line, for trying the console without a receiver.
pub struct SimulatedProvider {
    interval: Duration,
    watches: WatchRegistry,
}

impl SimulatedProvider {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            watches: WatchRegistry::new(),
        }
    }
}

impl LocationProvider for SimulatedProvider {
    fn is_supported(&self) -> bool {
        true
    }

    fn watch_position(&self, options: WatchOptions, callback: LocationCallback) -> WatchId {
        let id = self.watches.spawn(drive(self.interval, options, callback));
        tracing::info!("Simulating van location as {}", id);
        id
    }

    fn clear_watch(&self, id: WatchId) {
        self.watches.clear(id);
    }
}

async fn drive(interval: Duration, options: WatchOptions, callback: LocationCallback) {
    let mut coordinate = START;
    let step = SPEED_MPS * interval.as_secs_f64();

    loop {
        if interval > options.timeout {
            tokio::time::sleep(options.timeout).await;
            callback(LocationEvent::Error(LocationError::Timeout));
            tokio::time::sleep(interval - options.timeout).await;
        } else {
            tokio::time::sleep(interval).await;
        }

        coordinate = advance(coordinate, HEADING_DEG, step);
        callback(LocationEvent::Position(Position::new(coordinate, Some(ACCURACY_M), chrono::Utc::now())));
    }
}

/// Moves `distance_m` along `heading_deg` (clockwise from north). Good enough
/// for the short steps of a simulated drive.
pub fn advance(from: Coordinate, heading_deg: f64, distance_m: f64) -> Coordinate {
    let heading = heading_deg.to_radians();
    let d_lat = distance_m * heading.cos() / METERS_PER_DEGREE;
    let d_lng = distance_m * heading.sin() / (METERS_PER_DEGREE * from.lat.to_radians().cos());
    Coordinate::new(from.lat + d_lat, from.lng + d_lng)
}
