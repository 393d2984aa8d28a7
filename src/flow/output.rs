use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::NodeType;
use crate::gap_filling::AuditRecord;

/// `None` for NaN and ±infinity so the value serializes as JSON `null`
pub fn finite_or_null(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// Non-finite scalar totals are reported as 0.0
pub fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// One timestamp of a node's output: computed flow plus its filled tag values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesRow {
    pub timestamp: NaiveDateTime,
    pub flow_kg_min: Option<f64>,
    #[serde(flatten)]
    pub tags: BTreeMap<String, Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeResult {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub name: String,
    pub timeseries: Vec<TimeseriesRow>,
    pub total_flow_tonnes: f64,
    /// Absent when the node produced no readings
    pub audit: Option<AuditRecord>,
    /// Share of GOOD raw readings, percent
    pub completeness_percent: f64,
}

/// Verified CO2 ledger for one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub run_id: Uuid,
    pub nodes: BTreeMap<String, NodeResult>,
    /// Order in which nodes were processed
    pub processing_order: Vec<String>,
    /// The graph was cyclic and processed in insertion order; flows of nodes
    /// on a cycle are best-effort
    pub degraded: bool,
    pub total_captured_co2_tonnes: f64,
    pub total_stored_or_utilized_co2_tonnes: f64,
    pub total_net_co2_tonnes: f64,
    pub simulation_timestep_seconds: u32,
    pub simulation_readings: usize,
    pub simulation_duration_minutes: f64,
    /// Jurisdiction as requested, even when it fell back to another strategy
    pub jurisdiction_used: String,
    pub strategy_applied: String,
}

impl SimulationResult {
    /// Whether any node's audit demands a formal regulatory deviation
    pub fn requires_deviation(&self) -> bool {
        self.nodes
            .values()
            .filter_map(|n| n.audit.as_ref())
            .any(AuditRecord::requires_deviation)
    }
}
