//! Synthetic location streams.
//!
//! - [`FixStreamGenerator`]: random-walk commutes with GPS jitter, injected
//!   position spikes and transient sensor errors

mod procedural;

pub use procedural::{FixStreamGenerator, SimulatedTrip};
