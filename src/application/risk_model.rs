// Inference capability over externally trained models
use crate::domain::risk::{ModelOutputs, RiskFeatures};

/// Trained classifier, anomaly detector and persona clustering behind one
/// seam. Every method returns `None` when the backing asset is absent.
pub trait RiskModel: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    /// Probability of high risk from `[average_idle_minutes, idle_event_count]`
    fn predict_proba(&self, features: &[f64; 2]) -> Option<f64>;

    /// Standardize `[average_idle_minutes, idle_event_count, total_fuel_waste]`
    fn scale(&self, features: &[f64; 3]) -> Option<[f64; 3]>;

    fn predict_anomaly(&self, scaled: &[f64; 3]) -> Option<bool>;

    fn predict_cluster(&self, scaled: &[f64; 3]) -> Option<u8>;

    fn infer(&self, features: &RiskFeatures) -> Option<ModelOutputs> {
        let risk_probability = self.predict_proba(&features.classifier_vector())?;
        let scaled = self.scale(&features.profile_vector())?;
        Some(ModelOutputs {
            risk_probability,
            anomaly: self.predict_anomaly(&scaled)?,
            cluster_id: self.predict_cluster(&scaled)?,
        })
    }
}

/// Stand-in used when no trained assets are loaded
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableModel;

impl RiskModel for UnavailableModel {
    fn is_available(&self) -> bool {
        false
    }

    fn predict_proba(&self, _features: &[f64; 2]) -> Option<f64> {
        None
    }

    fn scale(&self, _features: &[f64; 3]) -> Option<[f64; 3]> {
        None
    }

    fn predict_anomaly(&self, _scaled: &[f64; 3]) -> Option<bool> {
        None
    }

    fn predict_cluster(&self, _scaled: &[f64; 3]) -> Option<u8> {
        None
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Model returning canned outputs regardless of input
    #[derive(Debug, Clone, Copy)]
    pub struct FixedModel {
        pub risk_probability: f64,
        pub anomaly: bool,
        pub cluster_id: u8,
    }

    impl RiskModel for FixedModel {
        fn predict_proba(&self, _features: &[f64; 2]) -> Option<f64> {
            Some(self.risk_probability)
        }

        fn scale(&self, features: &[f64; 3]) -> Option<[f64; 3]> {
            Some(*features)
        }

        fn predict_anomaly(&self, _scaled: &[f64; 3]) -> Option<bool> {
            Some(self.anomaly)
        }

        fn predict_cluster(&self, _scaled: &[f64; 3]) -> Option<u8> {
            Some(self.cluster_id)
        }
    }
}
