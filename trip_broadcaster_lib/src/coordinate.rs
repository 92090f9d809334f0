use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A single sample reported by a location provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub coordinate: Coordinate,
    pub accuracy_m: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl Position {
    pub fn new(coordinate: Coordinate, accuracy_m: Option<f64>, timestamp: DateTime<Utc>) -> Self {
        Self {
            coordinate,
            accuracy_m,
            timestamp,
        }
    }

    pub fn now(lat: f64, lng: f64) -> Self {
        Self::new(Coordinate::new(lat, lng), None, Utc::now())
    }
}
