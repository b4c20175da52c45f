//! Speed, mode inference and the avoided-carbon estimate for inferred trips.

use crate::models::TravelMode;

/// Car-equivalent emission factor applied to auto-detected trips, kg CO2/km.
pub const INFERRED_CARBON_FACTOR_KG_PER_KM: f64 = 0.12;

const WALK_MAX_KMH: f64 = 6.0;
const CYCLE_MAX_KMH: f64 = 20.0;

/// Average speed in km/h. Zero, negative or NaN inputs yield 0.
pub fn average_speed(distance_km: f64, duration_seconds: f64) -> f64 {
    if !(duration_seconds > 0.0) || !(distance_km >= 0.0) {
        return 0.0;
    }

    let speed = distance_km / (duration_seconds / 3600.0);
    if speed.is_finite() { speed } else { 0.0 }
}

/// Classifies a speed into walk (< 6), cycle (< 20) or vehicle.
pub fn infer_mode(avg_speed_kmh: f64) -> TravelMode {
    if avg_speed_kmh.is_nan() || avg_speed_kmh < WALK_MAX_KMH {
        TravelMode::Walk
    } else if avg_speed_kmh < CYCLE_MAX_KMH {
        TravelMode::Cycle
    } else {
        TravelMode::Vehicle
    }
}

/// Emissions avoided by not driving `distance_km`.
pub fn carbon_avoided(distance_km: f64) -> f64 {
    if !(distance_km > 0.0) || !distance_km.is_finite() {
        return 0.0;
    }
    distance_km * INFERRED_CARBON_FACTOR_KG_PER_KM
}

/// Formats seconds as `MM:SS`.
pub fn format_duration(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

pub fn format_speed(speed_kmh: f64) -> String {
    format!("{speed_kmh:.1} km/h")
}
