//! Test data generation for eco-commute.
//!
//! This crate provides tools for generating realistic location streams and
//! finished trips, to exercise the path processor and the trip ledger and to
//! populate a local ledger for manual verification.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_data::prelude::*;
//!
//! let mut rng = rand::thread_rng();
//! let trip = FixStreamGenerator::default()
//!     .in_region(Region::COPENHAGEN)
//!     .generate(&CyclistProfile::default(), 900, &mut rng);
//! let mut tracker = CommuteTracker::new(
//!     ReplaySource::new(trip.events),
//!     &TrackingConfig::default(),
//! );
//! ```

pub mod config;
pub mod generators;
pub mod gpx;
pub mod profiles;
pub mod sources;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::{BoundingBox, Region, SeedConfig, SimulationConfig};
    pub use crate::generators::TripGenerator;
    pub use crate::gpx::generate_gpx;
    pub use crate::profiles::{
        CommuterProfile, CyclistProfile, DriverProfile, WalkerProfile, sample_speed_kmh,
        sample_variance,
    };
    pub use crate::sources::{FixStreamGenerator, SimulatedTrip};
    pub use commute::{CommuteTracker, TrackingConfig, location::ReplaySource};
}
