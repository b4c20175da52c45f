//! Configuration types for test data generation.

use serde::{Deserialize, Serialize};

/// Geographic bounding box defined by southwest and northeast corners.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum latitude (south)
    pub min_lat: f64,
    /// Minimum longitude (west)
    pub min_lon: f64,
    /// Maximum latitude (north)
    pub max_lat: f64,
    /// Maximum longitude (east)
    pub max_lon: f64,
}

impl BoundingBox {
    pub const fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Returns a random point within the bounding box.
    pub fn random_point(&self, rng: &mut impl rand::Rng) -> (f64, f64) {
        let lat = rng.gen_range(self.min_lat..self.max_lat);
        let lon = rng.gen_range(self.min_lon..self.max_lon);
        (lat, lon)
    }

    /// Returns the center of the bounding box.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}

/// Pre-defined commuting areas.
#[derive(Debug, Clone, Copy)]
pub struct Region;

impl Region {
    /// Boulder, CO - compact downtown with bike paths.
    pub const BOULDER: BoundingBox = BoundingBox::new(39.98, -105.30, 40.05, -105.22);

    /// Copenhagen city centre - flat and cycle-heavy.
    pub const COPENHAGEN: BoundingBox = BoundingBox::new(55.64, 12.50, 55.72, 12.62);
}

/// Shape of a simulated location stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Seconds between consecutive fixes.
    pub fix_interval_secs: u32,
    /// GPS position jitter standard deviation in meters.
    pub gps_jitter_m: f64,
    /// Probability (0.0-1.0) that a fix is replaced by an impossible jump.
    pub spike_probability: f64,
    /// Range of spike offsets from the true position, in km.
    pub spike_distance_km: (f64, f64),
    /// Probability (0.0-1.0) of a transient sensor error between fixes.
    pub sensor_error_probability: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fix_interval_secs: 5,
            gps_jitter_m: 1.5,
            spike_probability: 0.02,
            spike_distance_km: (0.5, 3.0),
            sensor_error_probability: 0.0,
        }
    }
}

impl SimulationConfig {
    /// No jitter, spikes or errors.
    pub fn clean() -> Self {
        Self {
            gps_jitter_m: 0.0,
            spike_probability: 0.0,
            sensor_error_probability: 0.0,
            ..Default::default()
        }
    }
}

/// Configuration for seeding a ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Number of trips to generate.
    pub trip_count: usize,

    /// Days back from now the oldest trip may be dated.
    pub history_days: i64,

    /// Fraction (0.0-1.0) of trips with an explicitly selected mode.
    pub manual_mode_fraction: f64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            trip_count: 20,
            history_days: 30,
            manual_mode_fraction: 0.5,
        }
    }
}
