//! Incremental path processing: distance accumulation with noise rejection,
//! elapsed time, and the derived trip metrics.

use geo::LineString;
use time::OffsetDateTime;
use tracing::debug;

use crate::{
    config::{NOISE_THRESHOLD_KM, TrackingConfig},
    location::Fix,
    models::{Coordinate, TripMetrics},
    speed,
};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres on a spherical Earth.
///
/// Returns 0 for non-finite input.
pub fn distance_between(a: Coordinate, b: Coordinate) -> f64 {
    let lat1_rad = a.latitude.to_radians();
    let lat2_rad = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    let distance = EARTH_RADIUS_KM * c;
    if distance.is_finite() { distance } else { 0.0 }
}

/// Sum of consecutive distances along `path`.
pub fn accumulate(path: &[Coordinate]) -> f64 {
    path.windows(2)
        .map(|pair| distance_between(pair[0], pair[1]))
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixOutcome {
    Accepted,
    /// The fix implied an impossible jump from the last accepted fix.
    Rejected { jump_km: f64 },
}

impl FixOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, FixOutcome::Accepted)
    }
}

/// Decides whether `fix` should extend the path, using the default threshold.
pub fn ingest_fix(fix: Coordinate, last_accepted: Option<Coordinate>) -> FixOutcome {
    ingest_fix_with_threshold(fix, last_accepted, NOISE_THRESHOLD_KM)
}

/// A fix exactly `threshold_km` away is accepted; only strictly larger jumps
/// are rejected. The first fix of a trip is always accepted.
pub fn ingest_fix_with_threshold(
    fix: Coordinate,
    last_accepted: Option<Coordinate>,
    threshold_km: f64,
) -> FixOutcome {
    if !fix.is_finite() {
        return FixOutcome::Rejected {
            jump_km: f64::INFINITY,
        };
    }

    match last_accepted {
        None => FixOutcome::Accepted,
        Some(last) => {
            let jump_km = distance_between(last, fix);
            if jump_km > threshold_km {
                FixOutcome::Rejected { jump_km }
            } else {
                FixOutcome::Accepted
            }
        }
    }
}

/// The accepted fixes of one trip, in arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    coordinates: Vec<Coordinate>,
}

impl Path {
    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    pub fn last(&self) -> Option<Coordinate> {
        self.coordinates.last().copied()
    }

    pub fn distance_km(&self) -> f64 {
        accumulate(&self.coordinates)
    }

    /// The path as a line string (x = longitude, y = latitude) for map layers.
    pub fn to_line_string(&self) -> LineString<f64> {
        self.coordinates
            .iter()
            .map(|&coord| geo::Coord::from(coord))
            .collect()
    }

    fn push(&mut self, coord: Coordinate) {
        self.coordinates.push(coord);
    }
}

pub trait TrackMetric {
    type Score;
    fn next_point(&mut self, fix: &Fix);
    fn score(&self) -> Self::Score;
}

#[derive(Debug, Clone, Default)]
struct DistanceMetric {
    total_km: f64,
    last_point: Option<Coordinate>,
}

impl TrackMetric for DistanceMetric {
    type Score = f64;
    fn next_point(&mut self, fix: &Fix) {
        self.total_km += self
            .last_point
            .map_or(0.0, |prev| distance_between(prev, fix.coordinate));
        self.last_point = Some(fix.coordinate);
    }

    fn score(&self) -> f64 {
        self.total_km
    }
}

#[derive(Debug, Clone, Default)]
struct DurationMetric {
    start_time: Option<OffsetDateTime>,
    end_time: Option<OffsetDateTime>,
}

impl TrackMetric for DurationMetric {
    type Score = u64;
    fn next_point(&mut self, fix: &Fix) {
        if self.start_time.is_none() {
            self.start_time = Some(fix.timestamp);
        }
        if self.end_time.is_none_or(|end| fix.timestamp > end) {
            self.end_time = Some(fix.timestamp);
        }
    }

    fn score(&self) -> u64 {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => (end - start).whole_seconds().max(0) as u64,
            _ => 0,
        }
    }
}

/// Turns a live stream of fixes into trip metrics, one fix at a time.
///
/// Elapsed time counts every fix received, rejected ones included; distance
/// only counts accepted fixes.
#[derive(Debug, Clone)]
pub struct PathProcessor {
    path: Path,
    distance: DistanceMetric,
    duration: DurationMetric,
    noise_threshold_km: f64,
    mode_inference_min_secs: u64,
    rejected: usize,
}

impl Default for PathProcessor {
    fn default() -> Self {
        Self::new(&TrackingConfig::default())
    }
}

impl PathProcessor {
    pub fn new(config: &TrackingConfig) -> Self {
        Self {
            path: Path::default(),
            distance: DistanceMetric::default(),
            duration: DurationMetric::default(),
            noise_threshold_km: config.noise_threshold_km,
            mode_inference_min_secs: config.mode_inference_min_secs,
            rejected: 0,
        }
    }

    pub fn ingest(&mut self, fix: Fix) -> FixOutcome {
        self.duration.next_point(&fix);

        let outcome =
            ingest_fix_with_threshold(fix.coordinate, self.path.last(), self.noise_threshold_km);
        match outcome {
            FixOutcome::Accepted => {
                self.distance.next_point(&fix);
                self.path.push(fix.coordinate);
            }
            FixOutcome::Rejected { jump_km } => {
                self.rejected += 1;
                debug!(
                    "Rejected fix ({:.6}, {:.6}): {:.3} km jump exceeds {:.3} km",
                    fix.coordinate.latitude,
                    fix.coordinate.longitude,
                    jump_km,
                    self.noise_threshold_km
                );
            }
        }
        outcome
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_accepted(&self) -> Option<Coordinate> {
        self.path.last()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected
    }

    pub fn distance_km(&self) -> f64 {
        self.distance.score()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.duration.score()
    }

    pub fn metrics(&self) -> TripMetrics {
        let distance_km = self.distance_km();
        let duration_seconds = self.elapsed_seconds();
        let average_speed_kmh = speed::average_speed(distance_km, duration_seconds as f64);
        let inferred_mode = (duration_seconds >= self.mode_inference_min_secs)
            .then(|| speed::infer_mode(average_speed_kmh));

        TripMetrics {
            distance_km,
            duration_seconds,
            average_speed_kmh,
            inferred_mode,
            carbon_avoided_kg: speed::carbon_avoided(distance_km),
        }
    }

    /// Discards the in-progress path.
    pub fn reset(&mut self) {
        self.path = Path::default();
        self.distance = DistanceMetric::default();
        self.duration = DurationMetric::default();
        self.rejected = 0;
    }
}
