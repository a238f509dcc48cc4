// Vehicle report domain model
use super::idle::IdleEvent;
use super::kinematics::HarshEvent;
use super::ping::VehicleId;
use super::risk::RiskVerdict;
use super::score::EcoScore;

#[derive(Debug, Clone, PartialEq)]
pub struct FuelSummary {
    pub total_idle_minutes: f64,
    pub fuel_waste_gallons: f64,
    pub estimated_cost: f64,
}

impl FuelSummary {
    pub fn from_idle_events(events: &[IdleEvent], price_per_gallon: f64) -> Self {
        let total_idle_minutes = events.iter().map(|e| e.duration_minutes).sum();
        let fuel_waste_gallons: f64 = events.iter().map(|e| e.estimated_fuel_waste_gallons).sum();
        Self {
            total_idle_minutes,
            fuel_waste_gallons,
            estimated_cost: fuel_waste_gallons * price_per_gallon,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SafetySummary {
    pub max_speed_kmh: Option<f64>,
    pub harsh_braking_count: usize,
    pub skipped_pairs: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleReport {
    pub vehicle_id: VehicleId,
    pub ping_count: usize,
    pub idle_events: Vec<IdleEvent>,
    pub incidents: Vec<IdleEvent>,
    pub harsh_events: Vec<HarshEvent>,
    pub eco_score: EcoScore,
    pub verdict: RiskVerdict,
    pub fuel: FuelSummary,
    pub safety: SafetySummary,
}
