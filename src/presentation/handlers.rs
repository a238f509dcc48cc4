// HTTP request handlers
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::infrastructure::json_mapper::{assessment_to_record, report_to_record};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List all vehicles in the store
pub async fn list_vehicles(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let compress = accepts_brotli(&headers);

    let vehicle_ids = match state.fleet_service.list_vehicles().await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!("Error fetching vehicles: {:#}", e);
            return (StatusCode::SERVICE_UNAVAILABLE, "vehicle store unavailable").into_response();
        }
    };

    match json_response(&vehicle_ids, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Unknown vehicles are the caller's mistake, not a degenerate history
async fn ensure_known_vehicle(state: &AppState, id: &str) -> Result<(), Response> {
    match state.fleet_service.has_vehicle(id).await {
        Ok(true) => Ok(()),
        Ok(false) => Err((StatusCode::NOT_FOUND, format!("unknown vehicle {}", id)).into_response()),
        Err(e) => {
            tracing::error!("Error checking vehicle {}: {:#}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}

/// Full analytics report for one vehicle
pub async fn vehicle_report(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);

    if let Err(response) = ensure_known_vehicle(&state, &id).await {
        return response;
    }

    match state.analysis_service.evaluate_vehicle(&id).await {
        Ok(report) => match json_response(&report_to_record(report), compress).await {
            Ok(response) => response,
            Err(status) => status.into_response(),
        },
        Err(e) => {
            tracing::error!("Error evaluating vehicle {}: {:#}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Eco-score and risk verdict only, from the store's idle events
pub async fn vehicle_score(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);

    if let Err(response) = ensure_known_vehicle(&state, &id).await {
        return response;
    }

    match state.analysis_service.assess_vehicle(&id).await {
        Ok((score, verdict)) => {
            match json_response(&assessment_to_record(score, verdict), compress).await {
                Ok(response) => response,
                Err(status) => status.into_response(),
            }
        }
        Err(e) => {
            tracing::error!("Error scoring vehicle {}: {:#}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Stream reports for the whole fleet (progressive loading)
pub async fn stream_fleet(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let compress = accepts_brotli(&headers);

    let rx = state.streaming_service.stream_fleet().await;
    stream_from_receiver(rx, compress).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::analysis_service::AnalysisService;
    use crate::application::fleet_service::FleetService;
    use crate::application::ping_repository::testing::InMemoryPingRepository;
    use crate::application::ping_repository::PingRepository;
    use crate::application::risk_model::UnavailableModel;
    use crate::application::streaming_service::FleetStreamingService;
    use crate::domain::rules::EngineRules;

    fn state(repo: InMemoryPingRepository) -> Arc<AppState> {
        let repo: Arc<dyn PingRepository> = Arc::new(repo);
        let analysis_service =
            AnalysisService::new(repo.clone(), Arc::new(UnavailableModel), EngineRules::default());
        Arc::new(AppState {
            fleet_service: FleetService::new(repo.clone()),
            streaming_service: FleetStreamingService::new(repo, analysis_service.clone()),
            analysis_service,
        })
    }

    #[tokio::test]
    async fn test_list_vehicles_reports_store_outage() {
        let repo = InMemoryPingRepository::default().with_unreadable_roster();

        let response = list_vehicles(HeaderMap::new(), State(state(repo))).await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_list_vehicles_empty_fleet_is_ok() {
        let response =
            list_vehicles(HeaderMap::new(), State(state(InMemoryPingRepository::default()))).await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_vehicle_is_not_found() {
        let repo = InMemoryPingRepository::default().with_vehicle("366", Vec::new());

        let response = vehicle_report(
            Path("1".to_string()),
            HeaderMap::new(),
            State(state(repo)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
