//! Cycling commuter profile.

use commute::TravelMode;

use super::CommuterProfile;

/// Profile for commuting by bicycle.
///
/// Based on typical urban cycling: ~15 km/h including junctions, with more
/// day-to-day spread than walking.
#[derive(Debug, Clone)]
pub struct CyclistProfile {
    /// Base speed in km/h.
    base_speed_kmh: f64,
    /// Performance variance (coefficient of variation).
    variance: f64,
}

impl Default for CyclistProfile {
    fn default() -> Self {
        Self {
            base_speed_kmh: 15.0,
            variance: 0.12,
        }
    }
}

impl CyclistProfile {
    /// Creates a cyclist profile with the given base speed in km/h.
    pub fn with_speed(speed_kmh: f64) -> Self {
        Self {
            base_speed_kmh: speed_kmh,
            ..Default::default()
        }
    }

    /// A relaxed rider (~11 km/h).
    pub fn leisurely() -> Self {
        Self::with_speed(11.0)
    }
}

impl CommuterProfile for CyclistProfile {
    fn mode(&self) -> TravelMode {
        TravelMode::Cycle
    }

    fn base_speed_kmh(&self) -> f64 {
        self.base_speed_kmh
    }

    fn variance(&self) -> f64 {
        self.variance
    }

    fn speed_range_kmh(&self) -> (f64, f64) {
        (7.0, 19.0)
    }
}
