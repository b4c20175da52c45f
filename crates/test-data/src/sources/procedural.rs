//! Procedural commute generation.

use commute::{
    Fix, LocationError, LocationEvent, models::Coordinate, path_processor::distance_between,
};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use time::{Duration, OffsetDateTime};

use crate::config::{BoundingBox, Region, SimulationConfig};
use crate::profiles::{self, CommuterProfile};

const METERS_PER_DEGREE_LAT: f64 = 111_000.0;

/// A generated stream plus the ground truth it was derived from.
#[derive(Debug, Clone)]
pub struct SimulatedTrip {
    /// Every event in delivery order, spikes and sensor errors included.
    pub events: Vec<LocationEvent>,
    /// Distance along the true (unjittered) route in km.
    pub true_distance_km: f64,
    /// Speed the trip was generated at, km/h.
    pub speed_kmh: f64,
    /// Number of fixes replaced by impossible jumps.
    pub spike_count: usize,
    pub started_at: OffsetDateTime,
    pub ended_at: OffsetDateTime,
}

impl SimulatedTrip {
    pub fn fixes(&self) -> Vec<Fix> {
        self.events
            .iter()
            .filter_map(|event| match event {
                LocationEvent::Fix(fix) => Some(*fix),
                LocationEvent::Error(_) => None,
            })
            .collect()
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.ended_at - self.started_at).whole_seconds()
    }
}

/// Generates synthetic commutes as location event streams.
pub struct FixStreamGenerator {
    config: SimulationConfig,
    bounds: BoundingBox,
    start_point: Option<(f64, f64)>,
    start_time: OffsetDateTime,
}

impl Default for FixStreamGenerator {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl FixStreamGenerator {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            bounds: Region::BOULDER,
            start_point: None,
            start_time: OffsetDateTime::now_utc(),
        }
    }

    /// Restricts the route to `bounds`.
    pub fn in_region(mut self, bounds: BoundingBox) -> Self {
        self.bounds = bounds;
        self
    }

    /// Sets the starting point.
    pub fn with_start(mut self, lat: f64, lon: f64) -> Self {
        self.start_point = Some((lat, lon));
        self
    }

    /// Sets the timestamp of the first fix.
    pub fn starting_at(mut self, time: OffsetDateTime) -> Self {
        self.start_time = time;
        self
    }

    /// Sets GPS jitter amount.
    pub fn with_gps_jitter(mut self, meters: f64) -> Self {
        self.config.gps_jitter_m = meters;
        self
    }

    /// Sets the spike probability.
    pub fn with_spikes(mut self, probability: f64) -> Self {
        self.config.spike_probability = probability;
        self
    }

    /// Sets the transient sensor error probability.
    pub fn with_sensor_errors(mut self, probability: f64) -> Self {
        self.config.sensor_error_probability = probability;
        self
    }

    /// Generates a commute of roughly `duration_secs` at a speed drawn from
    /// `profile`.
    pub fn generate(
        &self,
        profile: &dyn CommuterProfile,
        duration_secs: u32,
        rng: &mut impl Rng,
    ) -> SimulatedTrip {
        let speed_kmh = profiles::sample_speed_kmh(profile, rng);
        let interval = self.config.fix_interval_secs.max(1);
        let step_m = speed_kmh / 3.6 * f64::from(interval);
        let steps = duration_secs / interval;

        let jitter_std = self.config.gps_jitter_m.max(0.0) / METERS_PER_DEGREE_LAT;
        let jitter_deg = Normal::new(0.0, jitter_std).expect("jitter is non-negative");

        let mut current = self
            .start_point
            .unwrap_or_else(|| self.bounds.random_point(rng));
        let mut heading = rng.gen_range(0.0..std::f64::consts::TAU);
        let mut timestamp = self.start_time;
        let mut true_distance_km = 0.0;
        let mut spike_count = 0;
        let mut events = Vec::with_capacity(steps as usize + 1);

        events.push(LocationEvent::Fix(self.observe(current, timestamp, &jitter_deg, rng)));

        for _ in 0..steps {
            heading += rng.gen_range(-0.3..0.3);
            let next = self.advance(current, heading, step_m);
            let (next, bounced_heading) = self.apply_bounds(next, heading);
            heading = bounced_heading;

            true_distance_km += distance_between(to_coordinate(current), to_coordinate(next));
            current = next;
            timestamp += Duration::seconds(i64::from(interval));

            if rng.r#gen::<f64>() < self.config.sensor_error_probability {
                let error = if rng.gen_bool(0.5) {
                    LocationError::Timeout
                } else {
                    LocationError::PositionUnavailable
                };
                events.push(LocationEvent::Error(error));
            }

            let fix = if rng.r#gen::<f64>() < self.config.spike_probability {
                spike_count += 1;
                let (min, max) = self.config.spike_distance_km;
                let offset_m = rng.gen_range(min..max) * 1000.0;
                let direction = rng.gen_range(0.0..std::f64::consts::TAU);
                let spike = self.advance(current, direction, offset_m);
                Fix::new(spike.0, spike.1, timestamp)
            } else {
                self.observe(current, timestamp, &jitter_deg, rng)
            };
            events.push(LocationEvent::Fix(fix));
        }

        SimulatedTrip {
            events,
            true_distance_km,
            speed_kmh,
            spike_count,
            started_at: self.start_time,
            ended_at: timestamp,
        }
    }

    fn observe(
        &self,
        (lat, lon): (f64, f64),
        timestamp: OffsetDateTime,
        jitter: &Normal<f64>,
        rng: &mut impl Rng,
    ) -> Fix {
        Fix::new(lat + jitter.sample(rng), lon + jitter.sample(rng), timestamp)
    }

    /// Moves `meters` from `from` along `heading` (radians from north).
    fn advance(&self, (lat, lon): (f64, f64), heading: f64, meters: f64) -> (f64, f64) {
        // Rough approximation: 1 degree lat is 111km, lon shrinks with latitude
        let lat_delta = (meters * heading.cos()) / METERS_PER_DEGREE_LAT;
        let lon_delta =
            (meters * heading.sin()) / (METERS_PER_DEGREE_LAT * lat.to_radians().cos());
        (lat + lat_delta, lon + lon_delta)
    }

    /// Applies bounds checking with heading reversal.
    fn apply_bounds(&self, (lat, lon): (f64, f64), heading: f64) -> ((f64, f64), f64) {
        let b = &self.bounds;
        let mut new_heading = heading;

        let lat = if lat < b.min_lat || lat > b.max_lat {
            new_heading = std::f64::consts::PI - heading;
            lat.clamp(b.min_lat, b.max_lat)
        } else {
            lat
        };

        let lon = if lon < b.min_lon || lon > b.max_lon {
            new_heading = -new_heading;
            lon.clamp(b.min_lon, b.max_lon)
        } else {
            lon
        };

        ((lat, lon), new_heading)
    }
}

fn to_coordinate((lat, lon): (f64, f64)) -> Coordinate {
    Coordinate::new(lat, lon)
}
