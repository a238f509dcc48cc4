// Analysis service - Use case for evaluating a single vehicle
use crate::application::ping_repository::PingRepository;
use crate::application::risk_model::RiskModel;
use crate::domain::idle::{detect_idle_events, significant_incidents, IdleEvent};
use crate::domain::kinematics::{self, KinematicAnalysis};
use crate::domain::ping::Ping;
use crate::domain::report::{FuelSummary, SafetySummary, VehicleReport};
use crate::domain::risk::{fuse, RiskFeatures, RiskVerdict};
use crate::domain::rules::EngineRules;
use crate::domain::score::{compute_eco_score, EcoScore};
use anyhow::Context;
use std::sync::Arc;

#[derive(Clone)]
pub struct AnalysisService {
    repository: Arc<dyn PingRepository>,
    model: Arc<dyn RiskModel>,
    rules: EngineRules,
}

impl AnalysisService {
    pub fn new(
        repository: Arc<dyn PingRepository>,
        model: Arc<dyn RiskModel>,
        rules: EngineRules,
    ) -> Self {
        Self {
            repository,
            model,
            rules,
        }
    }

    pub fn predictive_insight_available(&self) -> bool {
        self.model.is_available()
    }

    pub async fn evaluate_vehicle(&self, vehicle_id: &str) -> anyhow::Result<VehicleReport> {
        let pings = self
            .repository
            .get_pings(vehicle_id)
            .await
            .with_context(|| format!("Failed to load pings for vehicle {}", vehicle_id))?;

        self.evaluate_pings(vehicle_id, pings).await
    }

    /// Idle detection and kinematic analysis run as independent passes
    /// over the same shared history.
    pub async fn evaluate_pings(
        &self,
        vehicle_id: &str,
        pings: Vec<Ping>,
    ) -> anyhow::Result<VehicleReport> {
        let pings: Arc<[Ping]> = pings.into();
        let idle_rules = self.rules.idle;

        let idle_task = {
            let pings = Arc::clone(&pings);
            tokio::task::spawn_blocking(move || detect_idle_events(&pings, &idle_rules))
        };
        let kinematics_task = {
            let pings = Arc::clone(&pings);
            tokio::task::spawn_blocking(move || kinematics::analyze(&pings))
        };

        let (idle_events, kinematics) = tokio::try_join!(idle_task, kinematics_task)
            .context("Vehicle analysis task failed")?;

        tracing::debug!(
            "Evaluated vehicle {}: {} pings, {} idle events, {} kinematic samples",
            vehicle_id,
            pings.len(),
            idle_events.len(),
            kinematics.samples.len()
        );

        Ok(self.assemble_report(vehicle_id, pings.len(), idle_events, kinematics))
    }

    /// Score and verdict from pre-materialized idle events
    pub async fn assess_vehicle(&self, vehicle_id: &str) -> anyhow::Result<(EcoScore, RiskVerdict)> {
        let events = self
            .repository
            .get_idle_events(vehicle_id, &self.rules.idle)
            .await
            .with_context(|| format!("Failed to load idle events for vehicle {}", vehicle_id))?;

        Ok(self.assess_idle_events(vehicle_id, &events))
    }

    pub fn assess_idle_events(&self, vehicle_id: &str, events: &[IdleEvent]) -> (EcoScore, RiskVerdict) {
        let score = compute_eco_score(vehicle_id, events, &self.rules.score);
        let outputs = RiskFeatures::from_idle_events(events).and_then(|f| self.model.infer(&f));
        let verdict = fuse(&score, outputs.as_ref(), &self.rules.fusion);
        (score, verdict)
    }

    fn assemble_report(
        &self,
        vehicle_id: &str,
        ping_count: usize,
        idle_events: Vec<IdleEvent>,
        kinematics: KinematicAnalysis,
    ) -> VehicleReport {
        let (eco_score, verdict) = self.assess_idle_events(vehicle_id, &idle_events);
        let harsh_events = kinematics.harsh_events(&self.rules.kinematics);

        VehicleReport {
            vehicle_id: vehicle_id.to_string(),
            ping_count,
            incidents: significant_incidents(&idle_events, self.rules.significant_idle_minutes),
            fuel: FuelSummary::from_idle_events(&idle_events, self.rules.fuel_price_per_gallon),
            safety: SafetySummary {
                max_speed_kmh: kinematics.max_speed_kmh(),
                harsh_braking_count: harsh_events.len(),
                skipped_pairs: kinematics.skipped_pairs,
            },
            idle_events,
            harsh_events,
            eco_score,
            verdict,
        }
    }
}
