// Eco-score - bounded penalty score over a vehicle's idle history
use super::idle::IdleEvent;
use super::ping::VehicleId;

pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRules {
    /// Idle events strictly longer than this count as violations.
    pub critical_idle_minutes: f64,
    pub idle_minute_penalty: f64,
    pub violation_penalty: f64,
}

impl Default for ScoreRules {
    fn default() -> Self {
        Self {
            critical_idle_minutes: 18.0,
            idle_minute_penalty: 0.3,
            violation_penalty: 10.0,
        }
    }
}

impl ScoreRules {
    pub fn value_for(&self, total_idle_minutes: f64, violation_count: usize) -> f64 {
        let penalty = total_idle_minutes * self.idle_minute_penalty
            + violation_count as f64 * self.violation_penalty;
        (MAX_SCORE - penalty).clamp(0.0, MAX_SCORE)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EcoScore {
    pub vehicle_id: VehicleId,
    pub value: f64,
    pub violation_count: usize,
    pub total_idle_minutes: f64,
}

impl EcoScore {
    /// Heuristic risk implied by the score alone, in [0, 1].
    pub fn implied_risk(&self) -> f64 {
        (MAX_SCORE - self.value) / MAX_SCORE
    }
}

pub fn compute_eco_score(vehicle_id: &str, events: &[IdleEvent], rules: &ScoreRules) -> EcoScore {
    let total_idle_minutes: f64 = events.iter().map(|e| e.duration_minutes).sum();
    let violation_count = events
        .iter()
        .filter(|e| e.duration_minutes > rules.critical_idle_minutes)
        .count();

    EcoScore {
        vehicle_id: vehicle_id.to_string(),
        value: rules.value_for(total_idle_minutes, violation_count),
        violation_count,
        total_idle_minutes,
    }
}
