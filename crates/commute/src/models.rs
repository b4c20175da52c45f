use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

impl From<geo::Point<f64>> for Coordinate {
    fn from(point: geo::Point<f64>) -> Self {
        Self::new(point.y(), point.x())
    }
}

impl From<Coordinate> for geo::Point<f64> {
    fn from(coord: Coordinate) -> Self {
        geo::Point::new(coord.longitude, coord.latitude)
    }
}

impl From<Coordinate> for geo::Coord<f64> {
    fn from(coord: Coordinate) -> Self {
        geo::coord! { x: coord.longitude, y: coord.latitude }
    }
}

/// How a trip was travelled.
///
/// `Walk`, `Cycle` and `Vehicle` are the speed-inferred modes; the rest can
/// only come from an explicit selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Walk,
    Cycle,
    Bus,
    Metro,
    Bike,
    Car,
    Carpool,
    Vehicle,
}

impl TravelMode {
    pub const ALL: [TravelMode; 8] = [
        TravelMode::Walk,
        TravelMode::Cycle,
        TravelMode::Bus,
        TravelMode::Metro,
        TravelMode::Bike,
        TravelMode::Car,
        TravelMode::Carpool,
        TravelMode::Vehicle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TravelMode::Walk => "walk",
            TravelMode::Cycle => "cycle",
            TravelMode::Bus => "bus",
            TravelMode::Metro => "metro",
            TravelMode::Bike => "bike",
            TravelMode::Car => "car",
            TravelMode::Carpool => "carpool",
            TravelMode::Vehicle => "vehicle",
        }
    }

    /// Human-powered modes earn the higher point rate.
    pub fn is_active(self) -> bool {
        matches!(self, TravelMode::Walk | TravelMode::Cycle)
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown travel mode: {0}")]
pub struct UnknownTravelMode(pub String);

impl FromStr for TravelMode {
    type Err = UnknownTravelMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TravelMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownTravelMode(s.to_string()))
    }
}

/// Metrics derived from the path of an in-progress or finished trip.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TripMetrics {
    pub distance_km: f64,
    pub duration_seconds: u64,
    pub average_speed_kmh: f64,
    /// `None` until enough trip time has elapsed for the speed to mean anything.
    pub inferred_mode: Option<TravelMode>,
    pub carbon_avoided_kg: f64,
}

/// Input to [`crate::ledger::TripLedger::save_trip`]; the ledger assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripCandidate {
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub distance_km: f64,
    pub duration_seconds: u64,
    pub mode: TravelMode,
    pub carbon_saved_kg: f64,
    pub points: f64,
}

/// A persisted trip. Immutable once saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub distance_km: f64,
    pub duration_seconds: u64,
    pub mode: TravelMode,
    pub carbon_saved_kg: f64,
    pub points: u64,
}

impl Trip {
    /// Builds a trip from a candidate, normalizing numeric fields to their
    /// stored precision.
    pub fn from_candidate(id: String, candidate: TripCandidate) -> Self {
        Self {
            id,
            date: candidate.date,
            distance_km: round2(candidate.distance_km),
            duration_seconds: candidate.duration_seconds,
            mode: candidate.mode,
            carbon_saved_kg: round2(candidate.carbon_saved_kg),
            points: round_points(candidate.points),
        }
    }

    pub(crate) fn normalized(mut self) -> Self {
        self.distance_km = round2(self.distance_km);
        self.carbon_saved_kg = round2(self.carbon_saved_kg);
        self
    }
}

/// Lifetime totals rolled up from every stored trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total_distance_km: f64,
    pub total_carbon_kg: f64,
    pub total_points: u64,
    pub trip_count: u64,
    #[serde(with = "time::serde::rfc3339", default = "unix_epoch")]
    pub last_updated: OffsetDateTime,
}

impl Default for AggregateStats {
    fn default() -> Self {
        Self {
            total_distance_km: 0.0,
            total_carbon_kg: 0.0,
            total_points: 0,
            trip_count: 0,
            last_updated: unix_epoch(),
        }
    }
}

impl AggregateStats {
    /// Sums every trip from scratch rather than adding to a running total.
    pub fn from_trips(trips: &[Trip], last_updated: OffsetDateTime) -> Self {
        let (distance, carbon, points) =
            trips
                .iter()
                .fold((0.0, 0.0, 0u64), |(distance, carbon, points), trip| {
                    (
                        distance + trip.distance_km,
                        carbon + trip.carbon_saved_kg,
                        points.saturating_add(trip.points),
                    )
                });

        Self {
            total_distance_km: round2(distance),
            total_carbon_kg: round2(carbon),
            total_points: points,
            trip_count: trips.len() as u64,
            last_updated,
        }
    }

    /// Compares totals, ignoring `last_updated`.
    pub fn matches(&self, other: &AggregateStats, tolerance: f64) -> bool {
        (self.total_distance_km - other.total_distance_km).abs() < tolerance
            && (self.total_carbon_kg - other.total_carbon_kg).abs() < tolerance
            && self.total_points == other.total_points
            && self.trip_count == other.trip_count
    }
}

fn unix_epoch() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH
}

/// Rounds to two decimal places; non-finite and negative values become 0.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    (value * 100.0).round() / 100.0
}

pub(crate) fn round_points(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.round() as u64
}
