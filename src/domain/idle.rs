// Idle event detection - consecutive pings that report the same position
use super::kinematics::haversine_km;
use super::ping::{Ping, VehicleId};
use chrono::{DateTime, Utc};

/// Idling burns roughly 0.6 gallons per hour.
pub const FUEL_RATE_GAL_PER_MINUTE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdleRules {
    /// Exclusive lower bound; shorter stops are GPS noise.
    pub min_minutes: f64,
    /// Exclusive upper bound; longer gaps are shift ends or data gaps.
    pub max_minutes: f64,
    /// Zero means exact coordinate equality.
    pub position_tolerance_m: f64,
    pub fuel_rate_gal_per_minute: f64,
}

impl Default for IdleRules {
    fn default() -> Self {
        Self {
            min_minutes: 2.0,
            max_minutes: 120.0,
            position_tolerance_m: 0.0,
            fuel_rate_gal_per_minute: FUEL_RATE_GAL_PER_MINUTE,
        }
    }
}

impl IdleRules {
    fn same_position(&self, a: &Ping, b: &Ping) -> bool {
        if self.position_tolerance_m <= 0.0 {
            return a.longitude == b.longitude && a.latitude == b.latitude;
        }
        haversine_km(a.latitude, a.longitude, b.latitude, b.longitude) * 1000.0
            <= self.position_tolerance_m
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdleEvent {
    pub vehicle_id: VehicleId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: f64,
    pub estimated_fuel_waste_gallons: f64,
    pub latitude: f64,
    pub longitude: f64,
}

/// Scan a time-ordered ping sequence and emit one event per qualifying
/// adjacent pair. Adjacent idle pairs are never merged.
pub fn detect_idle_events(pings: &[Ping], rules: &IdleRules) -> Vec<IdleEvent> {
    pings
        .windows(2)
        .filter_map(|pair| idle_event_between(&pair[0], &pair[1], rules))
        .collect()
}

fn idle_event_between(current: &Ping, next: &Ping, rules: &IdleRules) -> Option<IdleEvent> {
    if !rules.same_position(current, next) {
        return None;
    }

    let duration_minutes = current.minutes_until(next);
    if duration_minutes <= rules.min_minutes || duration_minutes >= rules.max_minutes {
        return None;
    }

    Some(IdleEvent {
        vehicle_id: current.vehicle_id.clone(),
        start_time: current.timestamp,
        end_time: next.timestamp,
        duration_minutes,
        estimated_fuel_waste_gallons: duration_minutes * rules.fuel_rate_gal_per_minute,
        latitude: current.latitude,
        longitude: current.longitude,
    })
}

/// Events long enough to be worth pinning on an incident map.
pub fn significant_incidents(events: &[IdleEvent], min_minutes: f64) -> Vec<IdleEvent> {
    events
        .iter()
        .filter(|e| e.duration_minutes > min_minutes)
        .cloned()
        .collect()
}
