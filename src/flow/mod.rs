//! # CO2 Flow Propagation
//!
//! Turns gap-filled sensor data into mass flows along the facility graph
//! and reduces them to the captured, stored/utilized and net CO2 ledger.
//!
//! All flows are kg/min. Totals are tonnes over the simulated window.

pub mod output;
pub mod propagator;
pub mod transform;

pub use output::{finite_or_null, finite_or_zero, NodeResult, SimulationResult, TimeseriesRow};
pub use propagator::{FlowPropagator, SimulationError, SimulationSettings};
