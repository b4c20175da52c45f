//! Location sampling: fixes, sensor errors, and the subscription abstraction
//! a host location service implements.

use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::mpsc;

use crate::models::Coordinate;

/// One raw location sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub coordinate: Coordinate,
    pub timestamp: OffsetDateTime,
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64, timestamp: OffsetDateTime) -> Self {
        Self {
            coordinate: Coordinate::new(latitude, longitude),
            timestamp,
        }
    }
}

/// Sensor failures reported by the location service.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationError {
    #[error("Location permission denied. Please enable location access.")]
    PermissionDenied,

    #[error("Location information unavailable. Please check your device settings.")]
    PositionUnavailable,

    #[error("Location request timed out. Please try again.")]
    Timeout,

    #[error("An unknown error occurred while accessing location.")]
    Unknown,
}

impl LocationError {
    /// User-displayable description of the condition.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Only a revoked permission stops tracking; the rest are transient.
    pub fn halts_tracking(&self) -> bool {
        matches!(self, LocationError::PermissionDenied)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationEvent {
    Fix(Fix),
    Error(LocationError),
}

impl From<Fix> for LocationEvent {
    fn from(fix: Fix) -> Self {
        LocationEvent::Fix(fix)
    }
}

impl From<LocationError> for LocationEvent {
    fn from(error: LocationError) -> Self {
        LocationEvent::Error(error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

pub type LocationSink = mpsc::UnboundedSender<LocationEvent>;

/// A location service that pushes events into a sink until stopped.
pub trait LocationSource: Send {
    fn start(&mut self, sink: LocationSink) -> SubscriptionHandle;
    fn stop(&mut self, handle: SubscriptionHandle);
}

/// Replays a prepared event sequence. Every event is delivered at `start`,
/// after which the sink is dropped and the stream ends.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    events: Vec<LocationEvent>,
    next_handle: u64,
    active: Option<SubscriptionHandle>,
}

impl ReplaySource {
    pub fn new(events: impl IntoIterator<Item = LocationEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            next_handle: 1,
            active: None,
        }
    }

    pub fn from_fixes(fixes: impl IntoIterator<Item = Fix>) -> Self {
        Self::new(fixes.into_iter().map(LocationEvent::Fix))
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

impl LocationSource for ReplaySource {
    fn start(&mut self, sink: LocationSink) -> SubscriptionHandle {
        let handle = SubscriptionHandle(self.next_handle);
        self.next_handle += 1;
        self.active = Some(handle);

        for event in &self.events {
            if sink.send(*event).is_err() {
                break;
            }
        }
        handle
    }

    fn stop(&mut self, handle: SubscriptionHandle) {
        if self.active == Some(handle) {
            self.active = None;
        }
    }
}
