use std::sync::Arc;

use tokio::sync::mpsc::{self, Receiver, UnboundedReceiver, UnboundedSender};
use trip_broadcaster_lib::{
    location::LocationProvider,
    session::{TripSession, WatchEvent},
    update::{DeliveryError, LocationSink, LocationUpdate},
    view::PanelView,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    /// The console is closing. Releases the watch but leaves the status alone.
    Quit,
}

struct DeliveryOutcome {
    update: LocationUpdate,
    result: Result<(), DeliveryError>,
}

/// Runs one trip session on a single task. Location events, delivery results
/// and operator commands are all applied here, one at a time.
pub struct TripBroadcaster {
    session: TripSession,
    sink: Arc<dyn LocationSink>,
    events: UnboundedReceiver<WatchEvent>,
    outcomes_tx: UnboundedSender<DeliveryOutcome>,
    outcomes: UnboundedReceiver<DeliveryOutcome>,
}

impl TripBroadcaster {
    pub fn new(provider: Arc<dyn LocationProvider>, sink: Arc<dyn LocationSink>) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        let (outcomes_tx, outcomes) = mpsc::unbounded_channel();

        Self {
            session: TripSession::new(provider, events_tx),
            sink,
            events,
            outcomes_tx,
            outcomes,
        }
    }

    /// Runs until `Command::Quit` or until every command sender is gone.
    /// `render` is called with the initial view and whenever it changes.
    pub async fn run<R>(mut self, mut commands: Receiver<Command>, mut render: R)
    where
        R: FnMut(&PanelView),
    {
        let mut shown = self.session.view();
        render(&shown);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Start) => self.session.start(),
                    Some(Command::Stop) => self.session.stop(),
                    Some(Command::Quit) | None => break,
                },
                Some(event) = self.events.recv() => {
                    if let Some(update) = self.session.handle_event(event) {
                        self.dispatch(update);
                    }
                },
                Some(outcome) = self.outcomes.recv() => {
                    if let Err(err) = outcome.result {
                        tracing::debug!("Delivery of {:?} failed", outcome.update);
                        self.session.delivery_failed(&err);
                    }
                },
            }

            let view = self.session.view();
            if view != shown {
                render(&view);
                shown = view;
            }
        }

        // Deliveries still in flight finish on their own. Their results are dropped.
        self.session.teardown();
        tracing::info!("Trip broadcaster closed");
    }

    fn dispatch(&self, update: LocationUpdate) {
        let sink = self.sink.clone();
        let outcomes = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let result = sink.send_location(update).await;
            let _ = outcomes.send(DeliveryOutcome { update, result });
        });
    }
}
