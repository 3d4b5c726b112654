// Common library shared by the taskboard binary and integration tests

pub mod config;
pub mod document;
pub mod errors;
pub mod models;
pub mod reconcile;
pub mod rules;
pub mod schedule;
pub mod sync;
pub mod telemetry;
