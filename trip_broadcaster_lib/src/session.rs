use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::{
    coordinate::Coordinate,
    location::{LocationEvent, LocationProvider, WatchGuard, WatchOptions},
    status::TripStatus,
    update::{DeliveryError, LocationUpdate},
    view::PanelView,
};

/// A location event tagged with the subscription that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchEvent {
    pub generation: u64,
    pub event: LocationEvent,
}

#[derive(Debug, Default)]
pub enum TripState {
    #[default]
    Idle,
    Watching(WatchGuard),
}

/// The driver's trip. Owns the location subscription while watching and is
/// only ever mutated from the event loop that holds it.
pub struct TripSession {
    provider: Arc<dyn LocationProvider>,
    events: UnboundedSender<WatchEvent>,
    options: WatchOptions,
    state: TripState,
    status: TripStatus,
    last_coordinate: Option<Coordinate>,
    generation: u64,
}

impl TripSession {
    pub fn new(provider: Arc<dyn LocationProvider>, events: UnboundedSender<WatchEvent>) -> Self {
        Self {
            provider,
            events,
            options: WatchOptions::default(),
            state: TripState::Idle,
            status: TripStatus::Ready,
            last_coordinate: None,
            generation: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, TripState::Watching(_))
    }

    pub fn state(&self) -> &TripState {
        &self.state
    }

    pub fn status(&self) -> TripStatus {
        self.status
    }

    pub fn last_coordinate(&self) -> Option<Coordinate> {
        self.last_coordinate
    }

    pub fn start(&mut self) {
        if self.is_active() {
            tracing::debug!("Trip already started");
            return;
        }

        if !self.provider.is_supported() {
            tracing::warn!("No location capability, cannot start trip");
            self.status = TripStatus::NotSupported;
            return;
        }

        self.status = TripStatus::Started;
        self.generation += 1;

        let generation = self.generation;
        let events = self.events.clone();
        let id = self.provider.watch_position(
            self.options,
            Box::new(move |event| {
                // The loop is gone once the page is torn down. Nothing left to notify.
                let _ = events.send(WatchEvent { generation, event });
            }),
        );

        tracing::info!("Trip started, watching location with {}", id);
        self.state = TripState::Watching(WatchGuard::new(self.provider.clone(), id, generation));
    }

    pub fn stop(&mut self) {
        let TripState::Watching(mut guard) = std::mem::take(&mut self.state) else {
            tracing::debug!("Trip not started, nothing to stop");
            return;
        };

        guard.release();
        self.status = TripStatus::Stopped;
        tracing::info!("Trip stopped");
    }

    /// Applies a location event. Returns the update to deliver, if any.
    pub fn handle_event(&mut self, event: WatchEvent) -> Option<LocationUpdate> {
        let TripState::Watching(guard) = &self.state else {
            tracing::trace!("Dropping location event, trip not active");
            return None;
        };

        if guard.generation() != event.generation {
            tracing::trace!("Dropping location event from released watch {}", event.generation);
            return None;
        }

        match event.event {
            LocationEvent::Position(position) => {
                let coordinate = position.coordinate;
                tracing::debug!(
                    "Fix {:.6}, {:.6} at {} (accuracy {})",
                    coordinate.lat,
                    coordinate.lng,
                    position.timestamp.format("%H:%M:%S%.3f"),
                    position.accuracy_m.map_or("unknown".to_string(), |m| format!("{m:.1} m")),
                );
                self.last_coordinate = Some(coordinate);
                self.status = TripStatus::Sending;
                Some(LocationUpdate::new(coordinate))
            },
            LocationEvent::Error(err) => {
                tracing::error!("Location error: {}", err);
                self.status = TripStatus::PermissionDenied;
                None
            },
        }
    }

    /// Deliveries are not cancelled on stop, so this may land after the trip ended.
    pub fn delivery_failed(&mut self, err: &DeliveryError) {
        tracing::warn!("Failed to send location: {}", err);
        self.status = TripStatus::SendFailed;
    }

    /// Releases the subscription without touching the status. Used when the
    /// console goes away.
    pub fn teardown(mut self) {
        if let TripState::Watching(mut guard) = std::mem::take(&mut self.state) {
            guard.release();
            tracing::info!("Released location watch on teardown");
        }
    }

    pub fn view(&self) -> PanelView {
        PanelView::new(self.is_active(), self.status, self.last_coordinate)
    }
}
