// Fleet service - Use case for listing vehicles
use crate::application::ping_repository::PingRepository;
use crate::domain::ping::VehicleId;
use std::sync::Arc;

#[derive(Clone)]
pub struct FleetService {
    repository: Arc<dyn PingRepository>,
}

impl FleetService {
    pub fn new(repository: Arc<dyn PingRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_vehicles(&self) -> anyhow::Result<Vec<VehicleId>> {
        let mut ids = self.repository.list_vehicle_ids().await?;
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    pub async fn has_vehicle(&self, vehicle_id: &str) -> anyhow::Result<bool> {
        let ids = self.repository.list_vehicle_ids().await?;
        Ok(ids.iter().any(|id| id == vehicle_id))
    }
}
