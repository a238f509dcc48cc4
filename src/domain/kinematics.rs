// Kinematic analysis - speed and acceleration between consecutive pings
use super::ping::{Ping, VehicleId};
use chrono::{DateTime, Utc};

pub const EARTH_RADIUS_KM: f64 = 6371.0;
const KMH_PER_MS: f64 = 3.6;

/// Great-circle distance in kilometres on a spherical Earth.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1, lat2, lon2) = (
        lat1.to_radians(),
        lon1.to_radians(),
        lat2.to_radians(),
        lon2.to_radians(),
    );
    let d_lat = lat2 - lat1;
    let d_lon = lon2 - lon1;

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair above 1 for antipodal points
    2.0 * EARTH_RADIUS_KM * a.clamp(0.0, 1.0).sqrt().asin()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicRules {
    /// Decelerations strictly below this (m/s²) are harsh braking.
    pub harsh_braking_mss: f64,
}

impl Default for KinematicRules {
    fn default() -> Self {
        Self {
            harsh_braking_mss: -3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KinematicSample {
    pub vehicle_id: VehicleId,
    /// Timestamp of the later ping of the pair.
    pub timestamp: DateTime<Utc>,
    pub distance_km: f64,
    pub time_gap_seconds: f64,
    pub speed_kmh: f64,
    /// `None` when there is no adjacent preceding speed sample.
    pub acceleration_mss: Option<f64>,
}

pub type HarshEvent = KinematicSample;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KinematicAnalysis {
    pub samples: Vec<KinematicSample>,
    /// Pairs dropped for a zero or negative time gap.
    pub skipped_pairs: usize,
}

impl KinematicAnalysis {
    pub fn max_speed_kmh(&self) -> Option<f64> {
        self.samples.iter().map(|s| s.speed_kmh).reduce(f64::max)
    }

    pub fn harsh_events(&self, rules: &KinematicRules) -> Vec<HarshEvent> {
        self.samples
            .iter()
            .filter(|s| {
                s.acceleration_mss
                    .is_some_and(|accel| accel < rules.harsh_braking_mss)
            })
            .cloned()
            .collect()
    }
}

/// Derive speed and acceleration for every consecutive pair. A pair with a
/// non-positive time gap is skipped and breaks the acceleration chain, so the
/// next valid sample starts without an acceleration value.
pub fn analyze(pings: &[Ping]) -> KinematicAnalysis {
    let mut analysis = KinematicAnalysis::default();
    let mut previous_speed: Option<f64> = None;

    for pair in pings.windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        let time_gap_seconds = from.seconds_until(to);

        if time_gap_seconds <= 0.0 {
            analysis.skipped_pairs += 1;
            previous_speed = None;
            continue;
        }

        let distance_km = haversine_km(from.latitude, from.longitude, to.latitude, to.longitude);
        let speed_kmh = distance_km / (time_gap_seconds / 3600.0);
        let acceleration_mss =
            previous_speed.map(|prev| ((speed_kmh - prev) / KMH_PER_MS) / time_gap_seconds);

        analysis.samples.push(KinematicSample {
            vehicle_id: to.vehicle_id.clone(),
            timestamp: to.timestamp,
            distance_km,
            time_gap_seconds,
            speed_kmh,
            acceleration_mss,
        });
        previous_speed = Some(speed_kmh);
    }

    if analysis.skipped_pairs > 0 {
        tracing::debug!(
            "Skipped {} ping pairs with non-positive time gap",
            analysis.skipped_pairs
        );
    }

    analysis
}
