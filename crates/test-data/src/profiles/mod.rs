//! Commuter speed profiles.
//!
//! Profiles define realistic travel speeds for each way of getting around.
//! They are used by the stream generator to space fixes in time.

mod cyclist;
mod driver;
mod walker;

pub use cyclist::CyclistProfile;
pub use driver::DriverProfile;
pub use walker::WalkerProfile;

use commute::TravelMode;

/// Trait for commuter speed profiles.
pub trait CommuterProfile: Send + Sync {
    /// The mode a trip at this profile's speed should be classified as.
    fn mode(&self) -> TravelMode;

    /// Typical cruising speed in km/h.
    fn base_speed_kmh(&self) -> f64;

    /// Day-to-day variance as a coefficient of variation (0.0 - 1.0).
    fn variance(&self) -> f64;

    /// Speeds outside this range would be classified as a different mode.
    fn speed_range_kmh(&self) -> (f64, f64);
}

/// Samples a variance factor from normal distribution.
/// Returns a multiplier around 1.0.
pub fn sample_variance(profile: &dyn CommuterProfile, rng: &mut impl rand::Rng) -> f64 {
    use rand_distr::{Distribution, Normal};

    let std_dev = profile.variance();
    if std_dev > 0.0 {
        let normal = Normal::new(1.0, std_dev).expect("std_dev checked positive");
        let sample: f64 = normal.sample(rng);
        sample.clamp(0.7, 1.4)
    } else {
        1.0
    }
}

/// Picks a trip speed for `profile`, kept inside its classification range.
pub fn sample_speed_kmh(profile: &dyn CommuterProfile, rng: &mut impl rand::Rng) -> f64 {
    let (min, max) = profile.speed_range_kmh();
    (profile.base_speed_kmh() * sample_variance(profile, rng)).clamp(min, max)
}

/// Profile matching a speed-inferable mode, if any.
pub fn for_mode(mode: TravelMode) -> Option<Box<dyn CommuterProfile>> {
    match mode {
        TravelMode::Walk => Some(Box::new(WalkerProfile::default())),
        TravelMode::Cycle => Some(Box::new(CyclistProfile::default())),
        TravelMode::Vehicle => Some(Box::new(DriverProfile::default())),
        _ => None,
    }
}
