// Mapper to convert domain models to JSON wire records
use crate::application::streaming_service::FleetMessage;
use crate::domain::idle::IdleEvent;
use crate::domain::kinematics::KinematicSample;
use crate::domain::report::VehicleReport;
use crate::domain::risk::{Advisory, Persona, RiskVerdict};
use crate::domain::score::EcoScore;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct IdleEventRecord {
    pub vehicle_id: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: f64,
    pub estimated_fuel_waste_gallons: f64,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize)]
pub struct HarshEventRecord {
    pub vehicle_id: String,
    pub timestamp: String,
    pub distance_km: f64,
    pub time_gap_seconds: f64,
    pub speed_kmh: f64,
    pub acceleration_mss: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct EcoScoreRecord {
    pub value: f64,
    pub violation_count: usize,
    pub total_idle_minutes: f64,
}

#[derive(Debug, Serialize)]
pub struct VerdictRecord {
    pub displayed_risk_probability: f64,
    pub anomaly_flag: bool,
    pub persona: &'static str,
    pub advisory: &'static str,
    pub predictive_insight_available: bool,
}

#[derive(Debug, Serialize)]
pub struct FuelRecord {
    pub total_idle_minutes: f64,
    pub fuel_waste_gallons: f64,
    pub estimated_cost: f64,
}

#[derive(Debug, Serialize)]
pub struct SafetyRecord {
    pub max_speed_kmh: Option<f64>,
    pub harsh_braking_count: usize,
    pub skipped_pairs: usize,
}

#[derive(Debug, Serialize)]
pub struct VehicleReportRecord {
    pub vehicle_id: String,
    pub ping_count: usize,
    pub eco_score: EcoScoreRecord,
    pub verdict: VerdictRecord,
    pub fuel: FuelRecord,
    pub safety: SafetyRecord,
    pub idle_events: Vec<IdleEventRecord>,
    pub incidents: Vec<IdleEventRecord>,
    pub harsh_events: Vec<HarshEventRecord>,
}

#[derive(Debug, Serialize)]
pub struct AssessmentRecord {
    pub vehicle_id: String,
    pub eco_score: EcoScoreRecord,
    pub verdict: VerdictRecord,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FleetMessageRecord {
    Roster { vehicle_ids: Vec<String> },
    Report { report: Box<VehicleReportRecord> },
    Failed { vehicle_id: String, reason: String },
    StoreUnavailable { reason: String },
    Complete { vehicles: usize, duration_ms: i64 },
}

fn timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn persona_label(persona: Persona) -> &'static str {
    match persona {
        Persona::Efficient => "efficient",
        Persona::Moderate => "moderate",
        Persona::HighWasteOutlier => "high_waste_outlier",
        Persona::Unknown => "unknown",
    }
}

fn advisory_label(advisory: Advisory) -> &'static str {
    match advisory {
        Advisory::Normal => "normal",
        Advisory::Warning => "warning",
    }
}

fn idle_event_to_record(event: IdleEvent) -> IdleEventRecord {
    IdleEventRecord {
        vehicle_id: event.vehicle_id,
        start_time: timestamp(event.start_time),
        end_time: timestamp(event.end_time),
        duration_minutes: event.duration_minutes,
        estimated_fuel_waste_gallons: event.estimated_fuel_waste_gallons,
        latitude: event.latitude,
        longitude: event.longitude,
    }
}

fn harsh_event_to_record(sample: KinematicSample) -> HarshEventRecord {
    HarshEventRecord {
        vehicle_id: sample.vehicle_id,
        timestamp: timestamp(sample.timestamp),
        distance_km: sample.distance_km,
        time_gap_seconds: sample.time_gap_seconds,
        speed_kmh: sample.speed_kmh,
        acceleration_mss: sample.acceleration_mss,
    }
}

fn score_to_record(score: EcoScore) -> EcoScoreRecord {
    EcoScoreRecord {
        value: score.value,
        violation_count: score.violation_count,
        total_idle_minutes: score.total_idle_minutes,
    }
}

fn verdict_to_record(verdict: RiskVerdict) -> VerdictRecord {
    VerdictRecord {
        displayed_risk_probability: verdict.displayed_risk_probability,
        anomaly_flag: verdict.anomaly_flag,
        persona: persona_label(verdict.persona),
        advisory: advisory_label(verdict.advisory),
        predictive_insight_available: verdict.predictive_insight_available,
    }
}

pub fn report_to_record(report: VehicleReport) -> VehicleReportRecord {
    VehicleReportRecord {
        vehicle_id: report.vehicle_id,
        ping_count: report.ping_count,
        eco_score: score_to_record(report.eco_score),
        verdict: verdict_to_record(report.verdict),
        fuel: FuelRecord {
            total_idle_minutes: report.fuel.total_idle_minutes,
            fuel_waste_gallons: report.fuel.fuel_waste_gallons,
            estimated_cost: report.fuel.estimated_cost,
        },
        safety: SafetyRecord {
            max_speed_kmh: report.safety.max_speed_kmh,
            harsh_braking_count: report.safety.harsh_braking_count,
            skipped_pairs: report.safety.skipped_pairs,
        },
        idle_events: report.idle_events.into_iter().map(idle_event_to_record).collect(),
        incidents: report.incidents.into_iter().map(idle_event_to_record).collect(),
        harsh_events: report.harsh_events.into_iter().map(harsh_event_to_record).collect(),
    }
}

pub fn assessment_to_record(score: EcoScore, verdict: RiskVerdict) -> AssessmentRecord {
    AssessmentRecord {
        vehicle_id: score.vehicle_id.clone(),
        eco_score: score_to_record(score),
        verdict: verdict_to_record(verdict),
    }
}

pub fn fleet_message_to_record(msg: FleetMessage) -> FleetMessageRecord {
    match msg {
        FleetMessage::Roster(vehicle_ids) => FleetMessageRecord::Roster { vehicle_ids },
        FleetMessage::Report(report) => FleetMessageRecord::Report {
            report: Box::new(report_to_record(*report)),
        },
        FleetMessage::Failed { vehicle_id, reason } => {
            FleetMessageRecord::Failed { vehicle_id, reason }
        }
        FleetMessage::StoreUnavailable { reason } => {
            FleetMessageRecord::StoreUnavailable { reason }
        }
        FleetMessage::Complete {
            vehicles,
            duration_ms,
        } => FleetMessageRecord::Complete {
            vehicles,
            duration_ms,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::report::{FuelSummary, SafetySummary};
    use chrono::TimeZone;
    use serde_json::json;

    fn report() -> VehicleReport {
        let start = Utc.with_ymd_and_hms(2008, 2, 2, 15, 36, 8).unwrap();
        let event = IdleEvent {
            vehicle_id: "1".to_string(),
            start_time: start,
            end_time: start + chrono::Duration::minutes(10),
            duration_minutes: 10.0,
            estimated_fuel_waste_gallons: 0.1,
            latitude: 39.92123,
            longitude: 116.51172,
        };

        VehicleReport {
            vehicle_id: "1".to_string(),
            ping_count: 2,
            idle_events: vec![event.clone()],
            incidents: vec![event],
            harsh_events: Vec::new(),
            eco_score: EcoScore {
                vehicle_id: "1".to_string(),
                value: 97.0,
                violation_count: 0,
                total_idle_minutes: 10.0,
            },
            verdict: RiskVerdict {
                vehicle_id: "1".to_string(),
                displayed_risk_probability: 0.03,
                anomaly_flag: false,
                persona: Persona::HighWasteOutlier,
                advisory: Advisory::Normal,
                predictive_insight_available: true,
            },
            fuel: FuelSummary {
                total_idle_minutes: 10.0,
                fuel_waste_gallons: 0.1,
                estimated_cost: 0.38,
            },
            safety: SafetySummary {
                max_speed_kmh: None,
                harsh_braking_count: 0,
                skipped_pairs: 0,
            },
        }
    }

    #[test]
    fn test_report_record_shape() {
        let value = serde_json::to_value(report_to_record(report())).unwrap();

        assert_eq!(value["idle_events"][0]["start_time"], "2008-02-02T15:36:08Z");
        assert_eq!(value["idle_events"][0]["end_time"], "2008-02-02T15:46:08Z");
        assert_eq!(value["verdict"]["persona"], "high_waste_outlier");
        assert_eq!(value["verdict"]["advisory"], "normal");
        assert_eq!(value["safety"]["max_speed_kmh"], serde_json::Value::Null);
        assert_eq!(value["eco_score"]["value"], 97.0);
    }

    #[test]
    fn test_fleet_messages_are_tagged() {
        let complete = fleet_message_to_record(FleetMessage::Complete {
            vehicles: 3,
            duration_ms: 42,
        });
        assert_eq!(
            serde_json::to_value(complete).unwrap(),
            json!({ "type": "complete", "vehicles": 3, "duration_ms": 42 })
        );

        let outage = fleet_message_to_record(FleetMessage::StoreUnavailable {
            reason: "timeout".to_string(),
        });
        assert_eq!(
            serde_json::to_value(outage).unwrap(),
            json!({ "type": "store_unavailable", "reason": "timeout" })
        );

        let roster = fleet_message_to_record(FleetMessage::Roster(vec!["1".to_string()]));
        assert_eq!(
            serde_json::to_value(roster).unwrap(),
            json!({ "type": "roster", "vehicle_ids": ["1"] })
        );
    }
}
