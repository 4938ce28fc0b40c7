//! Core library for the policyscope service: configuration, telemetry, the
//! shared application error type, and the policy tracking/analysis modules.

pub mod config;
pub mod error;
pub mod policies;
pub mod telemetry;
