// Repository trait for vehicle ping history
use crate::domain::idle::{detect_idle_events, IdleEvent, IdleRules};
use crate::domain::ping::{Ping, VehicleId};
use async_trait::async_trait;

#[async_trait]
pub trait PingRepository: Send + Sync {
    /// List all vehicle IDs present in the store
    async fn list_vehicle_ids(&self) -> anyhow::Result<Vec<VehicleId>>;

    /// Full ping history for one vehicle, ascending by timestamp
    async fn get_pings(&self, vehicle_id: &str) -> anyhow::Result<Vec<Ping>>;

    /// Idle events for one vehicle. Stores with a materialized view may
    /// override this, but must apply the same detection rules.
    async fn get_idle_events(
        &self,
        vehicle_id: &str,
        rules: &IdleRules,
    ) -> anyhow::Result<Vec<IdleEvent>> {
        let pings = self.get_pings(vehicle_id).await?;
        Ok(detect_idle_events(&pings, rules))
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::collections::BTreeMap;

    /// In-memory store keyed by vehicle ID
    #[derive(Debug, Clone, Default)]
    pub struct InMemoryPingRepository {
        pings: BTreeMap<VehicleId, Vec<Ping>>,
        failing: Vec<VehicleId>,
        roster_unreadable: bool,
    }

    impl InMemoryPingRepository {
        pub fn with_vehicle(mut self, vehicle_id: &str, pings: Vec<Ping>) -> Self {
            self.pings.insert(vehicle_id.to_string(), pings);
            self
        }

        /// Store whose vehicle listing fails
        pub fn with_unreadable_roster(mut self) -> Self {
            self.roster_unreadable = true;
            self
        }

        /// Vehicle that is listed but whose history cannot be read
        pub fn with_broken_vehicle(mut self, vehicle_id: &str) -> Self {
            self.pings.insert(vehicle_id.to_string(), Vec::new());
            self.failing.push(vehicle_id.to_string());
            self
        }
    }

    #[async_trait]
    impl PingRepository for InMemoryPingRepository {
        async fn list_vehicle_ids(&self) -> anyhow::Result<Vec<VehicleId>> {
            if self.roster_unreadable {
                anyhow::bail!("vehicle roster unavailable");
            }
            Ok(self.pings.keys().cloned().collect())
        }

        async fn get_pings(&self, vehicle_id: &str) -> anyhow::Result<Vec<Ping>> {
            if self.failing.iter().any(|id| id == vehicle_id) {
                anyhow::bail!("store unavailable for vehicle {}", vehicle_id);
            }
            Ok(self.pings.get(vehicle_id).cloned().unwrap_or_default())
        }
    }

    pub fn shift_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2008, 2, 6, 6, 0, 0).unwrap()
    }

    /// Build pings from (seconds after shift start, lon, lat) tuples
    pub fn track(vehicle_id: &str, points: &[(i64, f64, f64)]) -> Vec<Ping> {
        points
            .iter()
            .map(|&(secs, lon, lat)| {
                Ping::new(
                    vehicle_id.to_string(),
                    shift_start() + Duration::seconds(secs),
                    lon,
                    lat,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{track, InMemoryPingRepository};
    use super::*;

    #[tokio::test]
    async fn test_default_idle_events_match_detector() {
        let pings = track(
            "10078",
            &[
                (0, 116.40, 39.90),
                (600, 116.40, 39.90),
                (900, 116.41, 39.90),
                (2400, 116.41, 39.90),
            ],
        );
        let repo = InMemoryPingRepository::default().with_vehicle("10078", pings.clone());
        let rules = IdleRules::default();

        let from_store = repo.get_idle_events("10078", &rules).await.unwrap();

        assert_eq!(from_store, detect_idle_events(&pings, &rules));
        assert_eq!(from_store.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_vehicle_has_no_history() {
        let repo = InMemoryPingRepository::default();
        assert!(repo.get_pings("404").await.unwrap().is_empty());
        assert!(repo.list_vehicle_ids().await.unwrap().is_empty());
    }
}
