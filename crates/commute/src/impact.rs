//! Environmental impact and reward formulas applied when a trip is finished.
//!
//! Two carbon paths exist. A mode the traveller picked explicitly is scored
//! against the per-mode emission table relative to driving alone; a mode
//! that was only inferred from speed uses the flat car-equivalent factor.

use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    models::{TravelMode, TripCandidate, TripMetrics},
    speed,
};

/// Emissions of driving alone, kg CO2/km. The baseline for manual modes.
pub const CAR_EMISSION_KG_PER_KM: f64 = 0.21;

const ACTIVE_POINTS_PER_KM: f64 = 15.0;
const OTHER_POINTS_PER_KM: f64 = 8.0;

/// Emission factor of travelling one kilometre by `mode`, kg CO2/km.
pub fn emission_factor(mode: TravelMode) -> f64 {
    match mode {
        TravelMode::Walk | TravelMode::Cycle => 0.0,
        TravelMode::Bus => 0.089,
        TravelMode::Metro => 0.041,
        TravelMode::Bike => 0.114,
        TravelMode::Carpool => 0.105,
        TravelMode::Car | TravelMode::Vehicle => CAR_EMISSION_KG_PER_KM,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChoice {
    Inferred(TravelMode),
    Manual(TravelMode),
}

impl ModeChoice {
    /// An explicit selection wins over the inferred mode. With neither, the
    /// trip counts as an inferred walk.
    pub fn resolve(manual: Option<TravelMode>, inferred: Option<TravelMode>) -> Self {
        match (manual, inferred) {
            (Some(mode), _) => ModeChoice::Manual(mode),
            (None, Some(mode)) => ModeChoice::Inferred(mode),
            (None, None) => ModeChoice::Inferred(TravelMode::Walk),
        }
    }

    pub fn mode(self) -> TravelMode {
        match self {
            ModeChoice::Inferred(mode) | ModeChoice::Manual(mode) => mode,
        }
    }

    pub fn carbon_saved_kg(self, distance_km: f64) -> f64 {
        match self {
            ModeChoice::Inferred(_) => speed::carbon_avoided(distance_km),
            ModeChoice::Manual(mode) => {
                if !(distance_km > 0.0) || !distance_km.is_finite() {
                    return 0.0;
                }
                ((CAR_EMISSION_KG_PER_KM - emission_factor(mode)) * distance_km).max(0.0)
            }
        }
    }
}

/// Reward points: 15/km on foot or bicycle, 8/km otherwise.
pub fn eco_points(distance_km: f64, mode: TravelMode) -> u64 {
    if !(distance_km > 0.0) || !distance_km.is_finite() {
        return 0;
    }
    let rate = if mode.is_active() {
        ACTIVE_POINTS_PER_KM
    } else {
        OTHER_POINTS_PER_KM
    };
    (distance_km * rate).round() as u64
}

/// Builds the ledger input for a finished trip.
pub fn trip_candidate(
    metrics: &TripMetrics,
    choice: ModeChoice,
    date: OffsetDateTime,
) -> TripCandidate {
    let mode = choice.mode();
    TripCandidate {
        date,
        distance_km: metrics.distance_km,
        duration_seconds: metrics.duration_seconds,
        mode,
        carbon_saved_kg: choice.carbon_saved_kg(metrics.distance_km),
        points: eco_points(metrics.distance_km, mode) as f64,
    }
}

/// Everyday equivalents of an amount of avoided CO2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImpactEquivalents {
    pub trees_planted: u64,
    pub car_km_avoided: u64,
    pub led_bulb_hours: u64,
    pub home_energy_hours: u64,
}

impl ImpactEquivalents {
    pub fn for_carbon(carbon_kg: f64) -> Self {
        let per = |factor: f64| {
            let value = carbon_kg / factor;
            if value.is_finite() && value > 0.0 {
                value.round() as u64
            } else {
                0
            }
        };

        Self {
            trees_planted: per(0.5),
            car_km_avoided: per(CAR_EMISSION_KG_PER_KM),
            led_bulb_hours: per(0.05),
            home_energy_hours: per(0.5),
        }
    }
}

/// What a community of `multiplier` people matching this carbon would avoid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CommunityProjection {
    pub tonnes: f64,
    pub trees: u64,
}

pub const DEFAULT_COMMUNITY_SIZE: f64 = 1000.0;

pub fn project(carbon_kg: f64, multiplier: f64) -> CommunityProjection {
    let total_kg = carbon_kg * multiplier;
    if !total_kg.is_finite() || total_kg <= 0.0 {
        return CommunityProjection {
            tonnes: 0.0,
            trees: 0,
        };
    }

    CommunityProjection {
        tonnes: (total_kg / 100.0).round() / 10.0,
        trees: (total_kg / 0.5).round() as u64,
    }
}
