// Risk fusion - combine the eco-score with trained model outputs
use super::idle::IdleEvent;
use super::ping::VehicleId;
use super::score::EcoScore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Persona {
    Efficient,
    Moderate,
    HighWasteOutlier,
    /// No clustering model was available.
    Unknown,
}

impl Persona {
    pub fn from_cluster(cluster_id: u8) -> Self {
        match cluster_id {
            0 => Persona::Efficient,
            1 => Persona::Moderate,
            2 => Persona::HighWasteOutlier,
            _ => Persona::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Advisory {
    Normal,
    Warning,
}

/// Per-vehicle features fed to the trained models.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskFeatures {
    pub average_idle_minutes: f64,
    pub idle_event_count: usize,
    pub total_fuel_waste: f64,
}

impl RiskFeatures {
    /// `None` without at least one idle event, since there is no average.
    pub fn from_idle_events(events: &[IdleEvent]) -> Option<Self> {
        if events.is_empty() {
            return None;
        }
        let total_minutes: f64 = events.iter().map(|e| e.duration_minutes).sum();
        Some(Self {
            average_idle_minutes: total_minutes / events.len() as f64,
            idle_event_count: events.len(),
            total_fuel_waste: events.iter().map(|e| e.estimated_fuel_waste_gallons).sum(),
        })
    }

    /// Inputs of the risk classifier.
    pub fn classifier_vector(&self) -> [f64; 2] {
        [self.average_idle_minutes, self.idle_event_count as f64]
    }

    /// Inputs of the scaler feeding the anomaly and clustering models.
    pub fn profile_vector(&self) -> [f64; 3] {
        [
            self.average_idle_minutes,
            self.idle_event_count as f64,
            self.total_fuel_waste,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelOutputs {
    pub risk_probability: f64,
    pub anomaly: bool,
    pub cluster_id: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionRules {
    /// Scores strictly below this force anomaly, outlier persona and a warning.
    pub override_score_threshold: f64,
    /// Displayed probabilities strictly above this raise a warning.
    pub advisory_probability_threshold: f64,
}

impl Default for FusionRules {
    fn default() -> Self {
        Self {
            override_score_threshold: 40.0,
            advisory_probability_threshold: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskVerdict {
    pub vehicle_id: VehicleId,
    pub displayed_risk_probability: f64,
    pub anomaly_flag: bool,
    pub persona: Persona,
    pub advisory: Advisory,
    /// False when the verdict was derived from the eco-score alone.
    pub predictive_insight_available: bool,
}

/// The eco-score acts as a floor on displayed risk and overrides the
/// models whenever it falls below the override threshold.
pub fn fuse(score: &EcoScore, outputs: Option<&ModelOutputs>, rules: &FusionRules) -> RiskVerdict {
    let score_floor = score.implied_risk();
    let score_override = score.value < rules.override_score_threshold;

    let (displayed_risk_probability, model_anomaly, persona) = match outputs {
        Some(model) => (
            // NaN from a broken model falls through to the floor
            model.risk_probability.clamp(0.0, 1.0).max(score_floor),
            model.anomaly,
            Persona::from_cluster(model.cluster_id),
        ),
        None => (score_floor, false, Persona::Unknown),
    };

    let persona = if score_override {
        Persona::HighWasteOutlier
    } else {
        persona
    };

    let advisory =
        if displayed_risk_probability > rules.advisory_probability_threshold || score_override {
            Advisory::Warning
        } else {
            Advisory::Normal
        };

    RiskVerdict {
        vehicle_id: score.vehicle_id.clone(),
        displayed_risk_probability,
        anomaly_flag: model_anomaly || score_override,
        persona,
        advisory,
        predictive_insight_available: outputs.is_some(),
    }
}
