use std::fmt;

/// The only channel through which progress and failures reach the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TripStatus {
    #[default]
    Ready,
    Started,
    Stopped,
    Sending,
    SendFailed,
    PermissionDenied,
    NotSupported,
}

impl TripStatus {
    pub fn message(&self) -> &'static str {
        match self {
            TripStatus::Ready => "Ready to start trip",
            TripStatus::Started => "Trip started",
            TripStatus::Stopped => "Trip stopped",
            TripStatus::Sending => "Sending live location",
            TripStatus::SendFailed => "Failed to send location",
            TripStatus::PermissionDenied => "Location permission denied",
            TripStatus::NotSupported => "Geolocation not supported",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_text() {
        assert_eq!(TripStatus::default().to_string(), "Ready to start trip");
        assert_eq!(TripStatus::SendFailed.to_string(), "Failed to send location");
        assert_eq!(TripStatus::NotSupported.to_string(), "Geolocation not supported");
    }
}
