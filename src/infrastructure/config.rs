use crate::domain::idle::{IdleRules, FUEL_RATE_GAL_PER_MINUTE};
use crate::domain::kinematics::KinematicRules;
use crate::domain::risk::FusionRules;
use crate::domain::rules::EngineRules;
use crate::domain::score::ScoreRules;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

const ENV_PREFIX: &str = "ECODRIVE";

#[derive(Debug, Deserialize, Clone)]
pub struct InfluxConfig {
    pub influx: InfluxSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InfluxSettings {
    pub host: String,
    pub token: String,
    pub database: String,
    pub retention_policy: String,
    #[serde(default = "default_pings_query")]
    pub pings_query: String,
    #[serde(default = "default_vehicles_query")]
    pub vehicles_query: String,
}

fn default_pings_query() -> String {
    "SELECT longitude, latitude FROM trajectories WHERE tid = '${vehicle_id}' ORDER BY time ASC"
        .to_string()
}

fn default_vehicles_query() -> String {
    "SHOW TAG VALUES FROM trajectories WITH KEY = tid".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct EngineFile {
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Every threshold of the analytics engine. Missing keys keep defaults.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub idle_min_minutes: f64,
    pub idle_max_minutes: f64,
    pub idle_position_tolerance_m: f64,
    pub critical_idle_minutes: f64,
    pub harsh_braking_mss: f64,
    pub fuel_rate_gal_per_minute: f64,
    pub idle_minute_penalty: f64,
    pub violation_penalty: f64,
    pub override_score_threshold: f64,
    pub advisory_probability_threshold: f64,
    pub fuel_price_per_gallon: f64,
    pub significant_idle_minutes: f64,
    pub model_path: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let rules = EngineRules::default();
        Self {
            idle_min_minutes: rules.idle.min_minutes,
            idle_max_minutes: rules.idle.max_minutes,
            idle_position_tolerance_m: rules.idle.position_tolerance_m,
            critical_idle_minutes: rules.score.critical_idle_minutes,
            harsh_braking_mss: rules.kinematics.harsh_braking_mss,
            fuel_rate_gal_per_minute: FUEL_RATE_GAL_PER_MINUTE,
            idle_minute_penalty: rules.score.idle_minute_penalty,
            violation_penalty: rules.score.violation_penalty,
            override_score_threshold: rules.fusion.override_score_threshold,
            advisory_probability_threshold: rules.fusion.advisory_probability_threshold,
            fuel_price_per_gallon: rules.fuel_price_per_gallon,
            significant_idle_minutes: rules.significant_idle_minutes,
            model_path: None,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum EngineConfigError {
    #[error("idle bounds are inverted: min {min} must be below max {max}")]
    InvertedIdleBounds { min: f64, max: f64 },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("harsh braking threshold must be a deceleration (got {0} m/s²)")]
    NonNegativeBraking(f64),

    #[error("advisory probability threshold must lie in [0, 1] (got {0})")]
    ProbabilityOutOfRange(f64),
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineConfigError> {
        if self.idle_min_minutes >= self.idle_max_minutes {
            return Err(EngineConfigError::InvertedIdleBounds {
                min: self.idle_min_minutes,
                max: self.idle_max_minutes,
            });
        }

        let non_negative = [
            ("idle_min_minutes", self.idle_min_minutes),
            ("idle_position_tolerance_m", self.idle_position_tolerance_m),
            ("critical_idle_minutes", self.critical_idle_minutes),
            ("fuel_rate_gal_per_minute", self.fuel_rate_gal_per_minute),
            ("idle_minute_penalty", self.idle_minute_penalty),
            ("violation_penalty", self.violation_penalty),
            ("fuel_price_per_gallon", self.fuel_price_per_gallon),
            ("significant_idle_minutes", self.significant_idle_minutes),
        ];
        if let Some((field, value)) = non_negative.into_iter().find(|(_, v)| *v < 0.0) {
            return Err(EngineConfigError::Negative { field, value });
        }

        if self.harsh_braking_mss >= 0.0 {
            return Err(EngineConfigError::NonNegativeBraking(self.harsh_braking_mss));
        }

        if !(0.0..=1.0).contains(&self.advisory_probability_threshold) {
            return Err(EngineConfigError::ProbabilityOutOfRange(
                self.advisory_probability_threshold,
            ));
        }

        Ok(())
    }

    pub fn to_rules(&self) -> EngineRules {
        EngineRules {
            idle: IdleRules {
                min_minutes: self.idle_min_minutes,
                max_minutes: self.idle_max_minutes,
                position_tolerance_m: self.idle_position_tolerance_m,
                fuel_rate_gal_per_minute: self.fuel_rate_gal_per_minute,
            },
            kinematics: KinematicRules {
                harsh_braking_mss: self.harsh_braking_mss,
            },
            score: ScoreRules {
                critical_idle_minutes: self.critical_idle_minutes,
                idle_minute_penalty: self.idle_minute_penalty,
                violation_penalty: self.violation_penalty,
            },
            fusion: FusionRules {
                override_score_threshold: self.override_score_threshold,
                advisory_probability_threshold: self.advisory_probability_threshold,
            },
            fuel_price_per_gallon: self.fuel_price_per_gallon,
            significant_idle_minutes: self.significant_idle_minutes,
        }
    }
}

fn env_overrides() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX).separator("__")
}

pub fn load_influx_config() -> anyhow::Result<InfluxConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/influx"))
        .add_source(env_overrides())
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_server_config() -> anyhow::Result<ServerConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/server").required(false))
        .add_source(env_overrides())
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_engine_config() -> anyhow::Result<EngineConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/engine").required(false))
        .add_source(env_overrides())
        .build()?;

    let file: EngineFile = settings.try_deserialize()?;
    file.engine.validate()?;
    Ok(file.engine)
}

/// Replace template variables in a query string
pub fn prepare_query(query: &str, vars: &HashMap<String, String>) -> String {
    let mut result = query.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}
