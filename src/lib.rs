//! Carbon capture dMRV engine.
//!
//! Simulated (or recorded) sensor readings from a facility graph are
//! gap-filled under a jurisdiction's substitution rules and propagated as
//! CO2 mass flows from capture through transport to storage and utilization.

pub mod api;
pub mod config;
pub mod domain;
pub mod flow;
pub mod gap_filling;
pub mod graph;
pub mod report;
pub mod simulation;
pub mod telemetry;
