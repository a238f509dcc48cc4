// Domain layer - fleet value objects and the pure analytics
pub mod idle;
pub mod kinematics;
pub mod ping;
pub mod report;
pub mod risk;
pub mod rules;
pub mod score;
