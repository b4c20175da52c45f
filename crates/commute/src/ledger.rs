//! The trip ledger: persists finished trips and keeps the aggregate record
//! consistent with them.
//!
//! Two records live in the store: the trip list (newest first) under
//! [`TRIPS_KEY`] and the aggregate under [`STATS_KEY`], both JSON. Public
//! reads never fail; missing or corrupt records read as the zero-valued
//! default. Writes refuse to proceed when the stored trip list cannot be read,
//! and trip entries this version cannot parse are carried over untouched.

use std::collections::BTreeMap;

use bytes::Bytes;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::{
    errors::{LedgerError, StoreError},
    models::{AggregateStats, TravelMode, Trip, TripCandidate, round2, round_points},
    store::KeyValueStore,
};

pub const TRIPS_KEY: &str = "commute/trips";
pub const STATS_KEY: &str = "commute/stats";

pub const RECENT_TRIPS_LIMIT: usize = 5;
pub const SNAPSHOT_VERSION: u32 = 1;

const INTEGRITY_TOLERANCE: f64 = 0.01;
const AGGREGATE_FIELDS: [&str; 4] = ["totalDistanceKm", "totalCarbonKg", "totalPoints", "tripCount"];

/// Portable form of the whole ledger, produced by [`TripLedger::export_all`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: u32,
    pub stats: AggregateStats,
    pub trips: Vec<Trip>,
}

/// The trip list as stored: every raw entry in order, and the ones that parse.
#[derive(Debug, Default)]
struct StoredTrips {
    entries: Vec<Value>,
    trips: Vec<Trip>,
}

impl StoredTrips {
    fn parse(bytes: &[u8]) -> Self {
        let entries: Vec<Value> = match serde_json::from_slice(bytes) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Corrupt trip list, using empty list: {e}");
                return Self::default();
            }
        };

        let mut trips = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            match Trip::deserialize(entry) {
                Ok(trip) => trips.push(trip),
                Err(e) => warn!("Skipping unreadable trip at index {index}: {e}"),
            }
        }
        Self { entries, trips }
    }

    fn prepend(&mut self, trip: Trip) -> Result<(), LedgerError> {
        self.entries.insert(0, serde_json::to_value(&trip)?);
        self.trips.insert(0, trip);
        Ok(())
    }
}

pub struct TripLedger<S> {
    store: S,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> TripLedger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stores a finished trip at the head of the list and recomputes the
    /// aggregate from every stored trip.
    pub async fn save_trip(&self, candidate: TripCandidate) -> Result<Trip, LedgerError> {
        let _guard = self.write_lock.lock().await;

        let mut stored = self.read_trips().await?;
        let trip = Trip::from_candidate(generate_trip_id(), candidate);
        stored.prepend(trip.clone())?;

        let stats = AggregateStats::from_trips(&stored.trips, OffsetDateTime::now_utc());
        self.persist(&stored.entries, &stats).await?;

        info!(
            "Saved trip {} ({}, {:.2} km, {} pts); {} trips total",
            trip.id, trip.mode, trip.distance_km, trip.points, stats.trip_count
        );
        Ok(trip)
    }

    pub async fn aggregate_stats(&self) -> AggregateStats {
        self.load_stats().await.unwrap_or_default()
    }

    /// Stored trips, newest first, capped to `limit` when given.
    pub async fn trips(&self, limit: Option<usize>) -> Vec<Trip> {
        let mut trips = self.load_trips().await;
        if let Some(limit) = limit {
            trips.truncate(limit);
        }
        trips
    }

    pub async fn recent_trips(&self) -> Vec<Trip> {
        self.trips(Some(RECENT_TRIPS_LIMIT)).await
    }

    pub async fn trip_count(&self) -> usize {
        self.load_trips().await.len()
    }

    pub async fn trips_grouped_by_mode(&self) -> BTreeMap<TravelMode, u32> {
        let mut counts = BTreeMap::new();
        for trip in self.load_trips().await {
            *counts.entry(trip.mode).or_insert(0) += 1;
        }
        counts
    }

    /// Percentage of `goal_km` covered by the lifetime distance, capped at 100.
    pub async fn monthly_progress(&self, goal_km: f64) -> f64 {
        if !(goal_km > 0.0) {
            return 0.0;
        }
        let stats = self.aggregate_stats().await;
        (stats.total_distance_km / goal_km * 100.0).min(100.0)
    }

    /// Checks the aggregate against the stored trips. On mismatch the
    /// aggregate is rewritten from the trips and `false` is returned. An
    /// unreadable trip list also returns `false`, without writing anything.
    pub async fn verify_integrity(&self) -> bool {
        let _guard = self.write_lock.lock().await;

        let trips = match self.read_trips().await {
            Ok(stored) => stored.trips,
            Err(e) => {
                error!("Cannot verify aggregate, trip list unreadable: {e}");
                return false;
            }
        };
        let stored = self.load_stats().await.unwrap_or_default();
        let computed = AggregateStats::from_trips(&trips, OffsetDateTime::now_utc());

        if stored.matches(&computed, INTEGRITY_TOLERANCE) {
            return true;
        }

        warn!(
            "Aggregate mismatch (stored {:.2} km / {:.2} kg / {} pts / {} trips, \
             computed {:.2} km / {:.2} kg / {} pts / {} trips); repairing",
            stored.total_distance_km,
            stored.total_carbon_kg,
            stored.total_points,
            stored.trip_count,
            computed.total_distance_km,
            computed.total_carbon_kg,
            computed.total_points,
            computed.trip_count,
        );

        if let Err(e) = self.write_stats(&computed).await {
            error!("Failed to repair aggregate: {e}");
        }
        false
    }

    pub async fn export_all(&self) -> Result<String, LedgerError> {
        let snapshot = LedgerSnapshot {
            version: SNAPSHOT_VERSION,
            stats: self.aggregate_stats().await,
            trips: self.load_trips().await,
        };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Replaces the ledger with `snapshot`. Returns `false`, leaving state
    /// untouched, when the snapshot is malformed or cannot be written.
    pub async fn import_all(&self, snapshot: &str) -> bool {
        let (trips, stats) = match parse_snapshot(snapshot) {
            Ok(parsed) => parsed,
            Err(reason) => {
                warn!("Rejected import: {reason}");
                return false;
            }
        };

        let _guard = self.write_lock.lock().await;
        match self.persist(&trips, &stats).await {
            Ok(()) => {
                info!("Imported {} trips", trips.len());
                true
            }
            Err(e) => {
                error!("Failed to import snapshot: {e}");
                false
            }
        }
    }

    /// Resets both records to the zero-valued default.
    pub async fn clear_all(&self) -> Result<(), LedgerError> {
        let _guard = self.write_lock.lock().await;
        self.persist::<[Trip]>(&[], &AggregateStats::default()).await?;
        info!("Cleared all trip data");
        Ok(())
    }

    /// Store failures propagate; a missing or corrupt list reads as empty.
    async fn read_trips(&self) -> Result<StoredTrips, StoreError> {
        Ok(match self.store.get(TRIPS_KEY).await? {
            Some(bytes) => StoredTrips::parse(&bytes),
            None => StoredTrips::default(),
        })
    }

    async fn load_trips(&self) -> Vec<Trip> {
        match self.read_trips().await {
            Ok(stored) => stored.trips,
            Err(e) => {
                warn!("Failed to read trip list, using empty list: {e}");
                Vec::new()
            }
        }
    }

    async fn load_stats(&self) -> Option<AggregateStats> {
        let bytes = match self.store.get(STATS_KEY).await {
            Ok(bytes) => bytes?,
            Err(e) => {
                warn!("Failed to read aggregate, using defaults: {e}");
                return None;
            }
        };

        serde_json::from_slice(&bytes)
            .inspect_err(|e| warn!("Corrupt aggregate, using defaults: {e}"))
            .ok()
    }

    async fn write_stats(&self, stats: &AggregateStats) -> Result<(), LedgerError> {
        let bytes = Bytes::from(serde_json::to_vec(stats)?);
        self.store.set(STATS_KEY, bytes).await?;
        Ok(())
    }

    /// Writes the trip list then the aggregate. If the aggregate write fails
    /// the previous trip list is put back so the pair never diverges.
    async fn persist<T>(&self, trips: &T, stats: &AggregateStats) -> Result<(), LedgerError>
    where
        T: Serialize + ?Sized + Sync,
    {
        let trips_bytes = Bytes::from(serde_json::to_vec(trips)?);
        let stats_bytes = Bytes::from(serde_json::to_vec(stats)?);

        let previous = self.store.get(TRIPS_KEY).await?;
        self.store.set(TRIPS_KEY, trips_bytes).await?;

        if let Err(e) = self.store.set(STATS_KEY, stats_bytes).await {
            error!("Aggregate write failed, restoring trip list: {e}");
            let restored = match previous {
                Some(bytes) => self.store.set(TRIPS_KEY, bytes).await,
                None => self.store.remove(TRIPS_KEY).await,
            };
            restored.map_err(LedgerError::Rollback)?;
            return Err(e.into());
        }

        Ok(())
    }
}

/// `trip_<unix millis>_<9 base-36 chars>`
fn generate_trip_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("trip_{millis}_{suffix}")
}

fn parse_snapshot(raw: &str) -> Result<(Vec<Trip>, AggregateStats), String> {
    let value: Value = serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))?;

    let stats = value
        .get("stats")
        .and_then(Value::as_object)
        .ok_or("missing stats object")?;
    let mut numbers = [0.0; 4];
    for (slot, field) in numbers.iter_mut().zip(AGGREGATE_FIELDS) {
        *slot = stats
            .get(field)
            .and_then(Value::as_f64)
            .ok_or_else(|| format!("stats.{field} is not a number"))?;
    }
    let [distance, carbon, points, count] = numbers;

    let trips = value
        .get("trips")
        .filter(|trips| trips.is_array())
        .ok_or("trips is not an array")?;
    let trips: Vec<Trip> =
        serde_json::from_value(trips.clone()).map_err(|e| format!("malformed trip: {e}"))?;

    let last_updated = stats
        .get("lastUpdated")
        .and_then(Value::as_str)
        .and_then(|raw| {
            OffsetDateTime::parse(raw, &time::format_description::well_known::Rfc3339).ok()
        })
        .unwrap_or_else(OffsetDateTime::now_utc);

    let stats = AggregateStats {
        total_distance_km: round2(distance),
        total_carbon_kg: round2(carbon),
        total_points: round_points(points),
        trip_count: round_points(count),
        last_updated,
    };
    Ok((trips.into_iter().map(Trip::normalized).collect(), stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ObjectKvStore;
    use time::macros::datetime;

    fn candidate(distance_km: f64, mode: TravelMode, carbon: f64, points: f64) -> TripCandidate {
        TripCandidate {
            date: datetime!(2026-03-02 08:00 UTC),
            distance_km,
            duration_seconds: 900,
            mode,
            carbon_saved_kg: carbon,
            points,
        }
    }

    fn ledger() -> TripLedger<ObjectKvStore> {
        TripLedger::new(ObjectKvStore::in_memory())
    }

    #[test]
    fn test_trip_id_format() {
        let id = generate_trip_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "trip");
        assert!(parts[1].parse::<i128>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert_ne!(generate_trip_id(), id);
    }

    #[tokio::test]
    async fn test_empty_ledger_defaults() {
        let ledger = ledger();
        assert_eq!(ledger.aggregate_stats().await, AggregateStats::default());
        assert!(ledger.trips(None).await.is_empty());
        assert!(ledger.trips_grouped_by_mode().await.is_empty());
        assert!(ledger.verify_integrity().await);
    }

    #[tokio::test]
    async fn test_save_trip_rounds_and_prepends() {
        let ledger = ledger();
        let first = ledger
            .save_trip(candidate(1.234_5, TravelMode::Walk, 0.148_14, 18.5))
            .await
            .unwrap();
        assert_eq!(first.distance_km, 1.23);
        assert_eq!(first.carbon_saved_kg, 0.15);
        assert_eq!(first.points, 19);

        let second = ledger
            .save_trip(candidate(3.0, TravelMode::Bus, 0.36, 24.0))
            .await
            .unwrap();
        assert_ne!(first.id, second.id);

        let trips = ledger.trips(None).await;
        assert_eq!(trips, vec![second.clone(), first]);
        assert_eq!(ledger.trips(Some(1)).await, vec![second]);
    }

    #[tokio::test]
    async fn test_trips_grouped_by_mode() {
        let ledger = ledger();
        for mode in [TravelMode::Walk, TravelMode::Cycle, TravelMode::Walk] {
            ledger.save_trip(candidate(1.0, mode, 0.12, 15.0)).await.unwrap();
        }
        let grouped = ledger.trips_grouped_by_mode().await;
        assert_eq!(grouped.get(&TravelMode::Walk), Some(&2));
        assert_eq!(grouped.get(&TravelMode::Cycle), Some(&1));
        assert_eq!(grouped.len(), 2);
    }

    #[tokio::test]
    async fn test_monthly_progress() {
        let ledger = ledger();
        ledger
            .save_trip(candidate(10.0, TravelMode::Cycle, 1.2, 150.0))
            .await
            .unwrap();
        assert!((ledger.monthly_progress(50.0).await - 20.0).abs() < 1e-9);
        assert_eq!(ledger.monthly_progress(5.0).await, 100.0);
        assert_eq!(ledger.monthly_progress(0.0).await, 0.0);
    }

    #[tokio::test]
    async fn test_corrupt_records_read_as_defaults() {
        let ledger = ledger();
        let store = ledger.store();
        store
            .set(STATS_KEY, Bytes::from_static(b"{not json"))
            .await
            .unwrap();
        store
            .set(TRIPS_KEY, Bytes::from_static(br#"{"trips": 3}"#))
            .await
            .unwrap();
        assert_eq!(ledger.aggregate_stats().await, AggregateStats::default());
        assert!(ledger.trips(None).await.is_empty());

        store
            .set(STATS_KEY, Bytes::from_static(br#"{"totalDistanceKm": "far"}"#))
            .await
            .unwrap();
        assert_eq!(ledger.aggregate_stats().await, AggregateStats::default());
    }

    #[tokio::test]
    async fn test_clear_all() {
        let ledger = ledger();
        ledger
            .save_trip(candidate(2.0, TravelMode::Walk, 0.24, 30.0))
            .await
            .unwrap();
        ledger.clear_all().await.unwrap();
        assert!(ledger.trips(None).await.is_empty());
        assert_eq!(ledger.aggregate_stats().await, AggregateStats::default());
    }

    #[tokio::test]
    async fn test_import_rejects_invalid_shapes() {
        let ledger = ledger();
        ledger
            .save_trip(candidate(2.0, TravelMode::Walk, 0.24, 30.0))
            .await
            .unwrap();
        let before = ledger.export_all().await.unwrap();

        let rejected = [
            "not json",
            r#"{"trips": []}"#,
            r#"{"stats": {"totalDistanceKm": 1, "totalCarbonKg": 1, "totalPoints": 1}, "trips": []}"#,
            r#"{"stats": {"totalDistanceKm": "1", "totalCarbonKg": 1, "totalPoints": 1, "tripCount": 0}, "trips": []}"#,
            r#"{"stats": {"totalDistanceKm": 1, "totalCarbonKg": 1, "totalPoints": 1, "tripCount": 0}, "trips": {}}"#,
            r#"{"stats": {"totalDistanceKm": 1, "totalCarbonKg": 1, "totalPoints": 1, "tripCount": 1}, "trips": [{"id": 4}]}"#,
        ];
        for snapshot in rejected {
            assert!(!ledger.import_all(snapshot).await, "accepted {snapshot}");
        }
        assert_eq!(ledger.export_all().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_import_accepts_minimal_snapshot() {
        let ledger = ledger();
        let snapshot = r#"{
            "stats": {"totalDistanceKm": 2.004, "totalCarbonKg": 0.24, "totalPoints": 30, "tripCount": 1},
            "trips": [{
                "id": "trip_1_abc",
                "date": "2026-03-02T08:00:00Z",
                "distanceKm": 2.0,
                "durationSeconds": 900,
                "mode": "walk",
                "carbonSavedKg": 0.24,
                "points": 30
            }]
        }"#;
        assert!(ledger.import_all(snapshot).await);

        let stats = ledger.aggregate_stats().await;
        assert_eq!(stats.total_distance_km, 2.0);
        assert_eq!(stats.total_points, 30);
        assert_eq!(ledger.trips(None).await[0].id, "trip_1_abc");
        assert!(ledger.verify_integrity().await);
    }
}
