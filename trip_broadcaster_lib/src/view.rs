use crate::{coordinate::Coordinate, status::TripStatus};

pub const TITLE: &str = "Bus Console";
pub const SUBTITLE: &str = "Training Session";
pub const FOOTER: &str = "Keep this active so your friends can see where you are on the map.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    StartSession,
    EndSession,
}

impl PanelAction {
    pub fn label(&self) -> &'static str {
        match self {
            PanelAction::StartSession => "START SESSION",
            PanelAction::EndSession => "END SESSION",
        }
    }
}

/// Everything the console shows, already formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub live: bool,
    pub status: String,
    /// Latitude and longitude, present once a fix has been received.
    pub coordinates: Option<(String, String)>,
    pub action: PanelAction,
}

impl PanelView {
    pub fn new(active: bool, status: TripStatus, coordinate: Option<Coordinate>) -> Self {
        Self {
            live: active,
            status: status.to_string(),
            coordinates: coordinate.map(|c| (format!("{:.6}", c.lat), format!("{:.6}", c.lng))),
            action: if active {
                PanelAction::EndSession
            } else {
                PanelAction::StartSession
            },
        }
    }
}
