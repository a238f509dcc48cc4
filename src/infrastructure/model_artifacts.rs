// Trained model artifacts exported as JSON
use crate::application::risk_model::{RiskModel, UnavailableModel};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

const CLASSIFIER_FEATURES: usize = 2;
const PROFILE_FEATURES: usize = 3;
const PERSONA_CLUSTERS: usize = 3;

#[derive(Debug, Error)]
pub enum ModelArtifactError {
    #[error("failed to read model artifacts from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed model artifacts: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{component} expects {expected} features, artifact has {found}")]
    Dimension {
        component: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("persona clustering needs 3 centroids, artifact has {0}")]
    ClusterCount(usize),

    #[error("scaler has a zero scale at feature {0}")]
    ZeroScale(usize),
}

/// Per-feature standardization learned at training time
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogisticClassifier {
    pub weights: Vec<f64>,
    pub intercept: f64,
}

/// Flags vehicles whose standardized profile lies far from the fleet mean
#[derive(Debug, Clone, Deserialize)]
pub struct AnomalyBoundary {
    pub max_scaled_distance: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonaClusters {
    pub centroids: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainedRiskModel {
    pub scaler: StandardScaler,
    pub classifier: LogisticClassifier,
    pub anomaly: AnomalyBoundary,
    pub clusters: PersonaClusters,
}

fn check_len(component: &'static str, expected: usize, found: usize) -> Result<(), ModelArtifactError> {
    if expected != found {
        return Err(ModelArtifactError::Dimension {
            component,
            expected,
            found,
        });
    }
    Ok(())
}

impl TrainedRiskModel {
    pub fn from_json(json: &str) -> Result<Self, ModelArtifactError> {
        let model: TrainedRiskModel = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelArtifactError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ModelArtifactError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), ModelArtifactError> {
        check_len("scaler mean", PROFILE_FEATURES, self.scaler.mean.len())?;
        check_len("scaler scale", PROFILE_FEATURES, self.scaler.scale.len())?;
        if let Some(idx) = self.scaler.scale.iter().position(|s| *s == 0.0) {
            return Err(ModelArtifactError::ZeroScale(idx));
        }
        check_len("classifier", CLASSIFIER_FEATURES, self.classifier.weights.len())?;

        if self.clusters.centroids.len() != PERSONA_CLUSTERS {
            return Err(ModelArtifactError::ClusterCount(self.clusters.centroids.len()));
        }
        for centroid in &self.clusters.centroids {
            check_len("cluster centroid", PROFILE_FEATURES, centroid.len())?;
        }
        Ok(())
    }
}

impl RiskModel for TrainedRiskModel {
    fn predict_proba(&self, features: &[f64; 2]) -> Option<f64> {
        let logit = self.classifier.intercept
            + self
                .classifier
                .weights
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>();
        Some(1.0 / (1.0 + (-logit).exp()))
    }

    fn scale(&self, features: &[f64; 3]) -> Option<[f64; 3]> {
        let mut scaled = [0.0; 3];
        for (i, value) in features.iter().enumerate() {
            scaled[i] = (value - self.scaler.mean[i]) / self.scaler.scale[i];
        }
        Some(scaled)
    }

    fn predict_anomaly(&self, scaled: &[f64; 3]) -> Option<bool> {
        let distance = scaled.iter().map(|x| x * x).sum::<f64>().sqrt();
        Some(distance > self.anomaly.max_scaled_distance)
    }

    fn predict_cluster(&self, scaled: &[f64; 3]) -> Option<u8> {
        self.clusters
            .centroids
            .iter()
            .enumerate()
            .map(|(id, centroid)| {
                let d2: f64 = centroid.iter().zip(scaled).map(|(c, x)| (c - x).powi(2)).sum();
                (id, d2)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id as u8)
    }
}

/// Load the trained assets if configured, otherwise run score-only.
pub fn load_risk_model(path: Option<&str>) -> Arc<dyn RiskModel> {
    let Some(path) = path else {
        tracing::info!("No model artifacts configured, predictive insight unavailable");
        return Arc::new(UnavailableModel);
    };

    match TrainedRiskModel::load(path) {
        Ok(model) => {
            tracing::info!("Loaded risk model artifacts from {}", path);
            Arc::new(model)
        }
        Err(e) => {
            tracing::warn!("{}; predictive insight unavailable", e);
            Arc::new(UnavailableModel)
        }
    }
}
