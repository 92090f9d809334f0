use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;

// Single vehicle for now. Every update is reported for this van.
pub const VAN_ID: u32 = 1;

pub const DEFAULT_API_URL: &str = "http://localhost:3001";
pub const UPDATE_LOCATION_PATH: &str = "/api/update-location";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub van_id: u32,
    pub lat: f64,
    pub lng: f64,
}

impl LocationUpdate {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            van_id: VAN_ID,
            lat: coordinate.lat,
            lng: coordinate.lng,
        }
    }
}

pub fn update_location_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), UPDATE_LOCATION_PATH)
}

#[derive(Debug)]
pub enum DeliveryError {
    Transport(String),
    Encode(String),
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryError::Transport(msg) => write!(f, "transport error: {msg}"),
            DeliveryError::Encode(msg) => write!(f, "failed to encode update: {msg}"),
        }
    }
}

impl std::error::Error for DeliveryError {}

/// Where location updates are sent. One call per update, no retries.
#[async_trait::async_trait]
pub trait LocationSink: Send + Sync {
    async fn send_location(&self, update: LocationUpdate) -> Result<(), DeliveryError>;
}
