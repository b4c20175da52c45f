//! Drives a [`PathProcessor`] from a [`LocationSource`] for one active trip.

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::{
    config::TrackingConfig,
    location::{LocationError, LocationEvent, LocationSource, SubscriptionHandle},
    models::TripMetrics,
    path_processor::{FixOutcome, Path, PathProcessor},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Tracking,
    /// The source revoked access; the recorded path is kept until the caller
    /// finishes or stops the trip.
    Halted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerUpdate {
    Fix {
        outcome: FixOutcome,
        metrics: TripMetrics,
    },
    SensorError {
        error: LocationError,
        halted: bool,
    },
}

struct Subscription {
    handle: SubscriptionHandle,
    events: mpsc::UnboundedReceiver<LocationEvent>,
}

pub struct CommuteTracker<S> {
    source: S,
    processor: PathProcessor,
    subscription: Option<Subscription>,
    state: TrackerState,
}

impl<S: LocationSource> CommuteTracker<S> {
    pub fn new(source: S, config: &TrackingConfig) -> Self {
        Self {
            source,
            processor: PathProcessor::new(config),
            subscription: None,
            state: TrackerState::Idle,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn path(&self) -> &Path {
        self.processor.path()
    }

    pub fn metrics(&self) -> TripMetrics {
        self.processor.metrics()
    }

    /// Begins a fresh trip. Calling it while already tracking keeps the
    /// current subscription.
    pub fn start(&mut self) -> SubscriptionHandle {
        if let Some(subscription) = &self.subscription {
            return subscription.handle;
        }

        self.processor.reset();
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = self.source.start(tx);
        self.subscription = Some(Subscription { handle, events: rx });
        self.state = TrackerState::Tracking;
        info!("Started tracking (subscription {})", handle.0);
        handle
    }

    /// Processes the next location event. Returns `None` once the stream has
    /// ended or no subscription is active.
    pub async fn next_update(&mut self) -> Option<TrackerUpdate> {
        let event = self.subscription.as_mut()?.events.recv().await?;

        let update = match event {
            LocationEvent::Fix(fix) => {
                let outcome = self.processor.ingest(fix);
                TrackerUpdate::Fix {
                    outcome,
                    metrics: self.processor.metrics(),
                }
            }
            LocationEvent::Error(error) => {
                let halted = error.halts_tracking();
                warn!("Location error: {error}");
                if halted {
                    self.unsubscribe();
                    self.state = TrackerState::Halted;
                }
                TrackerUpdate::SensorError { error, halted }
            }
        };
        Some(update)
    }

    /// Consumes events until the stream ends or tracking halts.
    pub async fn drain(&mut self) -> Vec<TrackerUpdate> {
        let mut updates = Vec::new();
        while let Some(update) = self.next_update().await {
            updates.push(update);
        }
        updates
    }

    /// Abandons the trip: unregisters the stream and discards the path.
    /// Nothing is persisted.
    pub fn stop(&mut self) {
        self.unsubscribe();
        self.processor.reset();
        self.state = TrackerState::Idle;
        info!("Tracking stopped, trip discarded");
    }

    /// Ends the trip and returns its final metrics. The path is discarded;
    /// persisting the trip is up to the caller.
    pub fn finish(&mut self) -> TripMetrics {
        self.unsubscribe();
        let metrics = self.processor.metrics();
        self.processor.reset();
        self.state = TrackerState::Idle;
        info!(
            "Trip finished: {:.2} km in {}s",
            metrics.distance_km, metrics.duration_seconds
        );
        metrics
    }

    fn unsubscribe(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.source.stop(subscription.handle);
        }
    }
}
