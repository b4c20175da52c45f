//! Finished-trip generation.

use commute::{
    TravelMode, TripCandidate, TripMetrics,
    impact::{self, ModeChoice},
    speed,
};
use rand::Rng;
use time::{Duration, OffsetDateTime};

use crate::config::SeedConfig;

/// Typical commute distance range per mode, in km.
fn distance_range_km(mode: TravelMode) -> (f64, f64) {
    match mode {
        TravelMode::Walk => (0.4, 3.5),
        TravelMode::Cycle | TravelMode::Bike => (1.0, 12.0),
        TravelMode::Bus | TravelMode::Metro => (2.0, 18.0),
        TravelMode::Car | TravelMode::Carpool | TravelMode::Vehicle => (3.0, 30.0),
    }
}

/// Typical average speed per mode, in km/h.
fn typical_speed_kmh(mode: TravelMode) -> f64 {
    match mode {
        TravelMode::Walk => 4.8,
        TravelMode::Cycle => 15.0,
        TravelMode::Bike => 22.0,
        TravelMode::Bus => 18.0,
        TravelMode::Metro => 30.0,
        TravelMode::Car | TravelMode::Carpool | TravelMode::Vehicle => 35.0,
    }
}

const INFERABLE_MODES: [TravelMode; 3] = [TravelMode::Walk, TravelMode::Cycle, TravelMode::Vehicle];
const MANUAL_MODES: [TravelMode; 7] = [
    TravelMode::Walk,
    TravelMode::Cycle,
    TravelMode::Bus,
    TravelMode::Metro,
    TravelMode::Bike,
    TravelMode::Car,
    TravelMode::Carpool,
];

/// Generates finished trips with plausible distances, durations and scores.
#[derive(Debug, Clone, Default)]
pub struct TripGenerator {
    config: SeedConfig,
}

impl TripGenerator {
    pub fn new(config: SeedConfig) -> Self {
        Self { config }
    }

    /// Generates one trip dated within the configured history window.
    pub fn generate(&self, rng: &mut impl Rng) -> TripCandidate {
        let choice = if rng.r#gen::<f64>() < self.config.manual_mode_fraction {
            ModeChoice::Manual(MANUAL_MODES[rng.gen_range(0..MANUAL_MODES.len())])
        } else {
            ModeChoice::Inferred(INFERABLE_MODES[rng.gen_range(0..INFERABLE_MODES.len())])
        };

        let history_secs = self.config.history_days.max(0) * 86_400;
        let age = Duration::seconds(rng.gen_range(0..=history_secs));
        self.for_choice(choice, OffsetDateTime::now_utc() - age, rng)
    }

    /// Generates a trip for a specific mode choice.
    pub fn for_choice(
        &self,
        choice: ModeChoice,
        date: OffsetDateTime,
        rng: &mut impl Rng,
    ) -> TripCandidate {
        let mode = choice.mode();
        let (min, max) = distance_range_km(mode);
        let distance_km = rng.gen_range(min..max);
        let speed_kmh = typical_speed_kmh(mode) * rng.gen_range(0.85..1.15);
        let duration_seconds = (distance_km / speed_kmh * 3600.0).round() as u64;

        let metrics = TripMetrics {
            distance_km,
            duration_seconds,
            average_speed_kmh: speed::average_speed(distance_km, duration_seconds as f64),
            inferred_mode: matches!(choice, ModeChoice::Inferred(_)).then_some(mode),
            carbon_avoided_kg: speed::carbon_avoided(distance_km),
        };
        impact::trip_candidate(&metrics, choice, date)
    }

    /// Generates the configured number of trips, oldest first.
    pub fn generate_batch(&self, rng: &mut impl Rng) -> Vec<TripCandidate> {
        let mut trips: Vec<TripCandidate> = (0..self.config.trip_count)
            .map(|_| self.generate(rng))
            .collect();
        trips.sort_by_key(|trip| trip.date);
        trips
    }
}
