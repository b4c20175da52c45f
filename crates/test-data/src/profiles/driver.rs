//! Motorised commuter profile.

use commute::TravelMode;

use super::CommuterProfile;

/// Profile for urban driving: ~35 km/h average with stop-and-go spread.
///
/// The upper bound keeps consecutive fixes within the noise threshold at the
/// default fix interval.
#[derive(Debug, Clone)]
pub struct DriverProfile {
    base_speed_kmh: f64,
    variance: f64,
}

impl Default for DriverProfile {
    fn default() -> Self {
        Self {
            base_speed_kmh: 35.0,
            variance: 0.15,
        }
    }
}

impl CommuterProfile for DriverProfile {
    fn mode(&self) -> TravelMode {
        TravelMode::Vehicle
    }

    fn base_speed_kmh(&self) -> f64 {
        self.base_speed_kmh
    }

    fn variance(&self) -> f64 {
        self.variance
    }

    fn speed_range_kmh(&self) -> (f64, f64) {
        (22.0, 45.0)
    }
}
