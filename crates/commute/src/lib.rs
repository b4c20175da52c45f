pub mod config;
pub mod errors;
pub mod gpx_source;
pub mod impact;
pub mod ledger;
pub mod location;
pub mod models;
pub mod path_processor;
pub mod speed;
pub mod store;
pub mod tracker;

pub use crate::{
    config::TrackingConfig,
    errors::{LedgerError, StoreError},
    impact::ModeChoice,
    ledger::TripLedger,
    location::{Fix, LocationError, LocationEvent, LocationSource},
    models::{AggregateStats, Coordinate, TravelMode, Trip, TripCandidate, TripMetrics},
    path_processor::{FixOutcome, PathProcessor},
    store::{KeyValueStore, ObjectKvStore},
    tracker::{CommuteTracker, TrackerUpdate},
};
