// InfluxDB repository implementation for vehicle trajectories
use crate::application::ping_repository::PingRepository;
use crate::domain::ping::{Ping, VehicleId};
use crate::infrastructure::config::{prepare_query, InfluxSettings};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct InfluxPingRepository {
    client: reqwest::Client,
    host: String,
    token: String,
    database: String,
    retention_policy: String,
    pings_query: String,
    vehicles_query: String,
}

#[derive(Debug, Deserialize)]
struct InfluxQLResponse {
    results: Vec<InfluxQLResult>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLResult {
    #[serde(default)]
    series: Option<Vec<InfluxQLSeries>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLSeries {
    #[allow(dead_code)]
    name: String,
    columns: Vec<String>,
    values: Vec<Vec<serde_json::Value>>,
}

impl InfluxPingRepository {
    pub fn new(settings: InfluxSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: settings.host.trim_end_matches('/').to_string(),
            token: settings.token,
            database: settings.database,
            retention_policy: settings.retention_policy,
            pings_query: settings.pings_query,
            vehicles_query: settings.vehicles_query,
        }
    }

    fn build_query_url(&self, query: &str) -> String {
        let encoded_query = urlencoding::encode(query);
        format!(
            "{}/query?db={}&rp={}&q={}",
            self.host, self.database, self.retention_policy, encoded_query
        )
    }

    async fn execute_query(&self, query: &str) -> Result<InfluxQLResponse> {
        let url = self.build_query_url(query);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to InfluxDB")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("InfluxDB query failed with status {}: {}", status, body);
        }

        let data = response
            .json::<InfluxQLResponse>()
            .await
            .context("Failed to parse InfluxDB response")?;

        if let Some(error) = data.results.first().and_then(|r| r.error.as_ref()) {
            anyhow::bail!("InfluxDB query error: {}", error);
        }

        Ok(data)
    }
}

/// Escape a value for a single-quoted InfluxQL literal; backslashes first
fn escape_string_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Tag values come back as `[key, value]` rows
fn tag_values(response: &InfluxQLResponse) -> Vec<VehicleId> {
    response
        .results
        .iter()
        .flat_map(|r| r.series.iter().flatten())
        .flat_map(|s| s.values.iter())
        .filter_map(|row| match row.get(1)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

/// Rows lacking a parseable time or coordinate are dropped
fn rows_to_pings(vehicle_id: &str, response: &InfluxQLResponse) -> Vec<Ping> {
    let mut pings = Vec::new();
    let mut dropped = 0usize;

    for series in response.results.iter().flat_map(|r| r.series.iter().flatten()) {
        let time_idx = series.columns.iter().position(|c| c == "time").unwrap_or(0);
        let lon_idx = series.columns.iter().position(|c| c == "longitude");
        let lat_idx = series.columns.iter().position(|c| c == "latitude");
        let (Some(lon_idx), Some(lat_idx)) = (lon_idx, lat_idx) else {
            tracing::warn!("Trajectory series is missing coordinate columns: {:?}", series.columns);
            continue;
        };

        for row in &series.values {
            let timestamp = row
                .get(time_idx)
                .and_then(|v| v.as_str())
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                .map(|t| t.with_timezone(&Utc));
            let longitude = row.get(lon_idx).and_then(|v| v.as_f64());
            let latitude = row.get(lat_idx).and_then(|v| v.as_f64());

            match (timestamp, longitude, latitude) {
                (Some(timestamp), Some(longitude), Some(latitude)) => pings.push(Ping::new(
                    vehicle_id.to_string(),
                    timestamp,
                    longitude,
                    latitude,
                )),
                _ => dropped += 1,
            }
        }
    }

    if dropped > 0 {
        tracing::debug!("Dropped {} malformed rows for vehicle {}", dropped, vehicle_id);
    }
    pings
}

#[async_trait]
impl PingRepository for InfluxPingRepository {
    async fn list_vehicle_ids(&self) -> Result<Vec<VehicleId>> {
        let response = self.execute_query(&self.vehicles_query).await?;
        Ok(tag_values(&response))
    }

    async fn get_pings(&self, vehicle_id: &str) -> Result<Vec<Ping>> {
        let mut vars = HashMap::new();
        vars.insert("vehicle_id".to_string(), escape_string_literal(vehicle_id));
        let query = prepare_query(&self.pings_query, &vars);

        tracing::debug!("Executing trajectory query: {}", query);
        let response = self.execute_query(&query).await?;
        Ok(rows_to_pings(vehicle_id, &response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse(body: &str) -> InfluxQLResponse {
        serde_json::from_str(body).unwrap()
    }

    fn settings() -> InfluxSettings {
        InfluxSettings {
            host: "http://localhost:8086/".to_string(),
            token: "secret".to_string(),
            database: "ecodrive".to_string(),
            retention_policy: "autogen".to_string(),
            pings_query: "SELECT * FROM trajectories WHERE tid = '${vehicle_id}'".to_string(),
            vehicles_query: "SHOW TAG VALUES FROM trajectories WITH KEY = tid".to_string(),
        }
    }

    #[test]
    fn test_query_url_is_encoded() {
        let repo = InfluxPingRepository::new(settings());
        let url = repo.build_query_url("SELECT * FROM trajectories");
        assert_eq!(
            url,
            "http://localhost:8086/query?db=ecodrive&rp=autogen&q=SELECT%20%2A%20FROM%20trajectories"
        );
    }

    #[test]
    fn test_rows_to_pings() {
        let response = parse(
            r#"{"results":[{"series":[{
                "name":"trajectories",
                "columns":["time","longitude","latitude"],
                "values":[
                    ["2008-02-02T15:36:08Z",116.51172,39.92123],
                    ["2008-02-02T15:46:08Z",116.51135,39.93883],
                    ["not a time",116.5,39.9],
                    ["2008-02-02T15:56:08Z",null,39.9]
                ]}]}]}"#,
        );

        let pings = rows_to_pings("1", &response);

        assert_eq!(pings.len(), 2);
        assert_eq!(pings[0].vehicle_id, "1");
        assert_eq!(
            pings[0].timestamp,
            Utc.with_ymd_and_hms(2008, 2, 2, 15, 36, 8).unwrap()
        );
        assert_eq!(pings[1].longitude, 116.51135);
        assert_eq!(pings[1].latitude, 39.93883);
    }

    #[test]
    fn test_empty_result_has_no_pings() {
        let response = parse(r#"{"results":[{}]}"#);
        assert!(rows_to_pings("1", &response).is_empty());
    }

    #[test]
    fn test_vehicle_id_cannot_escape_literal() {
        assert_eq!(escape_string_literal("10078"), "10078");
        assert_eq!(escape_string_literal("o'brien"), r"o\'brien");
        assert_eq!(escape_string_literal(r"taxi\"), r"taxi\\");

        let mut vars = HashMap::new();
        vars.insert("vehicle_id".to_string(), escape_string_literal(r"x\' OR tid =~ /.*/ --"));
        let query = prepare_query("SELECT * FROM trajectories WHERE tid = '${vehicle_id}'", &vars);
        assert_eq!(
            query,
            r"SELECT * FROM trajectories WHERE tid = 'x\\\' OR tid =~ /.*/ --'"
        );
    }

    #[test]
    fn test_tag_values() {
        let response = parse(
            r#"{"results":[{"series":[{
                "name":"trajectories",
                "columns":["key","value"],
                "values":[["tid","1"],["tid","10078"],["tid",366]]
            }]}]}"#,
        );

        assert_eq!(tag_values(&response), vec!["1", "10078", "366"]);
    }
}
