pub mod adapters;
pub mod demo_service;
pub mod fixture_service;
