//! # Carbon Ledger Report
//!
//! Condenses a [`SimulationResult`] into the two views an auditor reads
//! first: value-chain accounting (gross, lost, net delivered) and per-node
//! data completeness.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use strum::{AsRefStr, Display};

use crate::domain::OperationsGraph;
use crate::flow::SimulationResult;

/// Completeness band of a node's raw data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityStatus {
    #[strum(serialize = "EXCELLENT")]
    Excellent,
    #[strum(serialize = "ACCEPTABLE")]
    Acceptable,
    #[strum(serialize = "REVIEW REQUIRED")]
    ReviewRequired,
}

impl QualityStatus {
    pub fn from_completeness(percent: f64) -> Self {
        if percent >= 99.0 {
            QualityStatus::Excellent
        } else if percent >= 95.0 {
            QualityStatus::Acceptable
        } else {
            QualityStatus::ReviewRequired
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueChain {
    pub gross_captured_tonnes: f64,
    /// Everything captured but not delivered to a sink node
    pub transport_loss_tonnes: f64,
    pub net_delivered_tonnes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityRow {
    pub node_id: String,
    pub name: String,
    pub completeness_percent: f64,
    pub status: QualityStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerReport {
    pub generated_at: DateTime<Utc>,
    pub jurisdiction: String,
    pub strategy: String,
    pub value_chain: ValueChain,
    pub quality: Vec<QualityRow>,
    pub modelled_minutes: f64,
    pub requires_deviation: bool,
}

impl LedgerReport {
    /// Build the report for a run of `ops`. Sink nodes are those without
    /// outgoing edges; quality rows follow the graph's node order.
    pub fn new(ops: &OperationsGraph, result: &SimulationResult) -> Self {
        let sources: HashSet<&str> = ops.edges.iter().map(|e| e.source.as_str()).collect();
        let delivered: f64 = result
            .nodes
            .iter()
            .filter(|(id, _)| !sources.contains(id.as_str()))
            .map(|(_, node)| node.total_flow_tonnes)
            .sum();
        let gross = result.total_captured_co2_tonnes;

        let quality = ops
            .nodes
            .iter()
            .filter_map(|n| result.nodes.get(&n.id).map(|r| (n, r)))
            .map(|(n, r)| QualityRow {
                node_id: n.id.clone(),
                name: r.name.clone(),
                completeness_percent: r.completeness_percent,
                status: QualityStatus::from_completeness(r.completeness_percent),
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            jurisdiction: result.jurisdiction_used.clone(),
            strategy: result.strategy_applied.clone(),
            value_chain: ValueChain {
                gross_captured_tonnes: gross,
                transport_loss_tonnes: (gross - delivered).max(0.0),
                net_delivered_tonnes: delivered,
            },
            quality,
            modelled_minutes: result.simulation_duration_minutes,
            requires_deviation: result.requires_deviation(),
        }
    }
}

impl fmt::Display for LedgerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CARBON LEDGER")?;
        writeln!(f, "Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "Jurisdiction: {} ({})", self.jurisdiction, self.strategy)?;
        writeln!(f)?;

        writeln!(f, "Value Chain Accounting")?;
        writeln!(f, "{:<14} {:<40} {:>14}", "Stage", "Description", "CO2 (tonnes)")?;
        let vc = &self.value_chain;
        writeln!(
            f,
            "{:<14} {:<40} {:>14}",
            "Capture",
            "Gross CO2 captured (flow x efficiency)",
            format!("+{:.4}", vc.gross_captured_tonnes)
        )?;
        writeln!(
            f,
            "{:<14} {:<40} {:>14}",
            "Transport",
            "Compression & transport leakage",
            format!("-{:.4}", vc.transport_loss_tonnes)
        )?;
        writeln!(
            f,
            "{:<14} {:<40} {:>14}",
            "NET VERIFIED",
            "Eligible for credit issuance",
            format!("{:.4}", vc.net_delivered_tonnes)
        )?;
        writeln!(f)?;

        writeln!(f, "Data Quality & Completeness")?;
        writeln!(f, "{:<36} {:>12} {:>16}", "Node", "Completeness", "Status")?;
        for row in &self.quality {
            writeln!(
                f,
                "{:<36} {:>12} {:>16}",
                row.name,
                format!("{:.1}%", row.completeness_percent),
                row.status.as_ref()
            )?;
        }
        writeln!(f)?;

        write!(f, "Modelling window: {} minutes", self.modelled_minutes)?;
        if self.requires_deviation {
            write!(f, " | formal deviation required")?;
        }
        writeln!(f)
    }
}
