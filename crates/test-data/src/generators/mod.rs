//! Entity generators for test data.
//!
//! - [`TripGenerator`]: finished trips ready for the ledger, scored with the
//!   same impact formulas a real trip goes through

pub mod trip;

pub use trip::TripGenerator;
