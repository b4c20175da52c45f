//! Walking commuter profile.

use commute::TravelMode;

use super::CommuterProfile;

/// Profile for commuting on foot: ~4.8 km/h with little spread.
#[derive(Debug, Clone)]
pub struct WalkerProfile {
    base_speed_kmh: f64,
    variance: f64,
}

impl Default for WalkerProfile {
    fn default() -> Self {
        Self {
            base_speed_kmh: 4.8,
            variance: 0.08,
        }
    }
}

impl WalkerProfile {
    /// A brisk walker (~5.5 km/h).
    pub fn brisk() -> Self {
        Self {
            base_speed_kmh: 5.5,
            ..Default::default()
        }
    }
}

impl CommuterProfile for WalkerProfile {
    fn mode(&self) -> TravelMode {
        TravelMode::Walk
    }

    fn base_speed_kmh(&self) -> f64 {
        self.base_speed_kmh
    }

    fn variance(&self) -> f64 {
        self.variance
    }

    fn speed_range_kmh(&self) -> (f64, f64) {
        (2.5, 5.8)
    }
}
