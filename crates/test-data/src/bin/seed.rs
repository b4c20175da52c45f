//! Seeds a local ledger with one simulated commute and a batch of generated trips.
//!
//! Run with:
//! ```
//! COMMUTE_DATA_DIR=./commute-data cargo run -p test-data --bin seed
//! ```

use commute::{ModeChoice, ObjectKvStore, TripLedger, impact};
use rand::{SeedableRng, rngs::StdRng};
use test_data::prelude::*;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let data_dir =
        std::env::var("COMMUTE_DATA_DIR").unwrap_or_else(|_| "./commute-data".to_string());
    let trip_count = std::env::var("SEED_TRIPS")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(20);
    let config = TrackingConfig::from_env();

    tracing::info!("Seeding ledger at {}", data_dir);
    let ledger = TripLedger::new(ObjectKvStore::local(&data_dir)?);

    let mut rng = StdRng::seed_from_u64(12345); // Reproducible data

    // One commute through the full tracking pipeline
    let simulated = FixStreamGenerator::default()
        .with_sensor_errors(0.01)
        .generate(&CyclistProfile::default(), 900, &mut rng);
    let mut tracker = CommuteTracker::new(ReplaySource::new(simulated.events), &config);
    tracker.start();
    let updates = tracker.drain().await;
    let metrics = tracker.finish();
    tracing::info!(
        "Simulated commute: {} updates, {:.2} km, {:.1} km/h, inferred {:?}",
        updates.len(),
        metrics.distance_km,
        metrics.average_speed_kmh,
        metrics.inferred_mode
    );
    let choice = ModeChoice::resolve(None, metrics.inferred_mode);
    ledger
        .save_trip(impact::trip_candidate(&metrics, choice, OffsetDateTime::now_utc()))
        .await?;

    // Historical trips
    let trip_gen = TripGenerator::new(SeedConfig {
        trip_count,
        ..Default::default()
    });
    for candidate in trip_gen.generate_batch(&mut rng) {
        ledger.save_trip(candidate).await?;
    }

    if !ledger.verify_integrity().await {
        tracing::warn!("Aggregate was repaired after seeding");
    }

    let stats = ledger.aggregate_stats().await;
    let equivalents = impact::ImpactEquivalents::for_carbon(stats.total_carbon_kg);

    // Summary output
    tracing::info!("Seed completed!");
    tracing::info!("  Trips: {}", stats.trip_count);
    tracing::info!("  Distance: {:.2} km", stats.total_distance_km);
    tracing::info!("  Carbon avoided: {:.2} kg", stats.total_carbon_kg);
    tracing::info!("  Points: {}", stats.total_points);
    tracing::info!(
        "  Monthly progress: {:.0}%",
        ledger.monthly_progress(config.monthly_goal_km).await
    );
    tracing::info!("  Trees equivalent: {}", equivalents.trees_planted);
    tracing::info!("  By mode: {:?}", ledger.trips_grouped_by_mode().await);

    Ok(())
}
