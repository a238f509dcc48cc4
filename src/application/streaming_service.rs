// Fleet streaming service - Progressive batch evaluation, one task per vehicle
use crate::application::analysis_service::AnalysisService;
use crate::application::ping_repository::PingRepository;
use crate::domain::ping::VehicleId;
use crate::domain::report::VehicleReport;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

const CHANNEL_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub enum FleetMessage {
    /// Sent first, lists every vehicle that will be evaluated
    Roster(Vec<VehicleId>),
    Report(Box<VehicleReport>),
    Failed { vehicle_id: VehicleId, reason: String },
    /// The vehicle roster could not be read; no roster follows
    StoreUnavailable { reason: String },
    /// Sent last, after every vehicle task has finished
    Complete { vehicles: usize, duration_ms: i64 },
}

#[derive(Clone)]
pub struct FleetStreamingService {
    repository: Arc<dyn PingRepository>,
    analysis: AnalysisService,
}

impl FleetStreamingService {
    pub fn new(repository: Arc<dyn PingRepository>, analysis: AnalysisService) -> Self {
        Self {
            repository,
            analysis,
        }
    }

    pub async fn stream_fleet(&self) -> mpsc::Receiver<FleetMessage> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let start_time = Instant::now();

        let vehicle_ids = match self.repository.list_vehicle_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!("Error listing vehicles: {:#}", e);
                let _ = tx
                    .send(FleetMessage::StoreUnavailable {
                        reason: format!("{:#}", e),
                    })
                    .await;
                let _ = tx
                    .send(FleetMessage::Complete {
                        vehicles: 0,
                        duration_ms: start_time.elapsed().as_millis() as i64,
                    })
                    .await;
                return rx;
            }
        };

        tracing::debug!("Streaming fleet evaluation for {} vehicles", vehicle_ids.len());
        let _ = tx.send(FleetMessage::Roster(vehicle_ids.clone())).await;

        let handles: Vec<_> = vehicle_ids
            .into_iter()
            .map(|vehicle_id| {
                let tx = tx.clone();
                let analysis = self.analysis.clone();

                tokio::spawn(async move {
                    let msg = match analysis.evaluate_vehicle(&vehicle_id).await {
                        Ok(report) => FleetMessage::Report(Box::new(report)),
                        Err(e) => {
                            tracing::warn!("Skipping vehicle {}: {:#}", vehicle_id, e);
                            FleetMessage::Failed {
                                vehicle_id,
                                reason: format!("{:#}", e),
                            }
                        }
                    };
                    let _ = tx.send(msg).await;
                })
            })
            .collect();

        let total = handles.len();
        tokio::spawn(async move {
            join_all(handles).await;

            let duration_ms = start_time.elapsed().as_millis() as i64;
            let _ = tx
                .send(FleetMessage::Complete {
                    vehicles: total,
                    duration_ms,
                })
                .await;
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ping_repository::testing::{track, InMemoryPingRepository};
    use crate::application::risk_model::UnavailableModel;
    use crate::domain::rules::EngineRules;

    async fn drain(mut rx: mpsc::Receiver<FleetMessage>) -> Vec<FleetMessage> {
        let mut messages = Vec::new();
        while let Some(msg) = rx.recv().await {
            messages.push(msg);
        }
        messages
    }

    fn streaming_service(repo: InMemoryPingRepository) -> FleetStreamingService {
        let repo: Arc<dyn PingRepository> = Arc::new(repo);
        let analysis = AnalysisService::new(
            repo.clone(),
            Arc::new(UnavailableModel),
            EngineRules::default(),
        );
        FleetStreamingService::new(repo, analysis)
    }

    #[tokio::test]
    async fn test_streams_roster_reports_and_completion() {
        let repo = InMemoryPingRepository::default()
            .with_vehicle("1", track("1", &[(0, 116.3, 39.9), (600, 116.3, 39.9)]))
            .with_vehicle("2", track("2", &[(0, 116.3, 39.9), (60, 116.31, 39.9)]))
            .with_broken_vehicle("3");

        let messages = drain(streaming_service(repo).stream_fleet().await).await;

        assert_eq!(messages.len(), 5);
        match &messages[0] {
            FleetMessage::Roster(ids) => assert_eq!(ids, &vec!["1", "2", "3"]),
            other => panic!("expected roster, got {:?}", other),
        }
        match messages.last().unwrap() {
            FleetMessage::Complete { vehicles, .. } => assert_eq!(*vehicles, 3),
            other => panic!("expected completion, got {:?}", other),
        }

        let mut reported: Vec<&str> = messages
            .iter()
            .filter_map(|m| match m {
                FleetMessage::Report(report) => Some(report.vehicle_id.as_str()),
                _ => None,
            })
            .collect();
        reported.sort();
        assert_eq!(reported, vec!["1", "2"]);

        assert!(messages.iter().any(|m| matches!(
            m,
            FleetMessage::Failed { vehicle_id, .. } if vehicle_id == "3"
        )));
    }

    #[tokio::test]
    async fn test_store_outage_is_distinct_from_empty_fleet() {
        let repo = InMemoryPingRepository::default()
            .with_vehicle("1", Vec::new())
            .with_unreadable_roster();

        let messages = drain(streaming_service(repo).stream_fleet().await).await;

        assert_eq!(messages.len(), 2);
        assert!(matches!(
            &messages[0],
            FleetMessage::StoreUnavailable { reason } if reason.contains("roster")
        ));
        assert!(!messages.iter().any(|m| matches!(m, FleetMessage::Roster(_))));
        assert!(matches!(messages[1], FleetMessage::Complete { vehicles: 0, .. }));
    }

    #[tokio::test]
    async fn test_empty_fleet_completes_immediately() {
        let messages = drain(streaming_service(InMemoryPingRepository::default()).stream_fleet().await).await;

        assert_eq!(messages.len(), 2);
        assert!(matches!(&messages[0], FleetMessage::Roster(ids) if ids.is_empty()));
        assert!(matches!(messages[1], FleetMessage::Complete { vehicles: 0, .. }));
    }
}
