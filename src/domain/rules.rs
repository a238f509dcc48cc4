// Tunable thresholds for a full vehicle evaluation
use super::idle::IdleRules;
use super::kinematics::KinematicRules;
use super::risk::FusionRules;
use super::score::ScoreRules;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineRules {
    pub idle: IdleRules,
    pub kinematics: KinematicRules,
    pub score: ScoreRules,
    pub fusion: FusionRules,
    pub fuel_price_per_gallon: f64,
    pub significant_idle_minutes: f64,
}

impl Default for EngineRules {
    fn default() -> Self {
        Self {
            idle: IdleRules::default(),
            kinematics: KinematicRules::default(),
            score: ScoreRules::default(),
            fusion: FusionRules::default(),
            fuel_price_per_gallon: 3.80,
            significant_idle_minutes: 5.0,
        }
    }
}
