// Ping domain model - a single GPS fix reported by a vehicle
use chrono::{DateTime, Utc};

pub type VehicleId = String;

#[derive(Debug, Clone, PartialEq)]
pub struct Ping {
    pub vehicle_id: VehicleId,
    pub timestamp: DateTime<Utc>,
    pub longitude: f64,
    pub latitude: f64,
}

impl Ping {
    pub fn new(vehicle_id: VehicleId, timestamp: DateTime<Utc>, longitude: f64, latitude: f64) -> Self {
        Self {
            vehicle_id,
            timestamp,
            longitude,
            latitude,
        }
    }

    /// Signed gap to a later ping, in seconds (fractional).
    pub fn seconds_until(&self, later: &Ping) -> f64 {
        (later.timestamp - self.timestamp).num_milliseconds() as f64 / 1000.0
    }

    pub fn minutes_until(&self, later: &Ping) -> f64 {
        self.seconds_until(later) / 60.0
    }
}
