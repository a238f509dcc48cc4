// Application state for HTTP handlers
use crate::application::analysis_service::AnalysisService;
use crate::application::fleet_service::FleetService;
use crate::application::streaming_service::FleetStreamingService;

#[derive(Clone)]
pub struct AppState {
    pub fleet_service: FleetService,
    pub analysis_service: AnalysisService,
    pub streaming_service: FleetStreamingService,
}
