// Application layer - ports and use cases
pub mod analysis_service;
pub mod fleet_service;
pub mod ping_repository;
pub mod risk_model;
pub mod streaming_service;
