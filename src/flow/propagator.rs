use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::output::{finite_or_null, finite_or_zero, NodeResult, SimulationResult, TimeseriesRow};
use super::transform::{
    capture_outflow, clip_percent, fan_out_share, sum_shares, total_tonnes, transport_outflow,
    utilization_outflow,
};
use crate::domain::{
    completeness_percent, merge_metadata, pivot_by_tag, tags, Metadata, Node, NodeType,
    OperationsGraph,
};
use crate::gap_filling::{AuditRecord, GapFillingStrategy, Jurisdiction};
use crate::graph::{GraphError, GraphModel};
use crate::simulation::{timeline, SensorError, SensorSource};

/// Structural failures that abort a run
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("sensor data for node {node_id}: {source}")]
    Sensor {
        node_id: String,
        source: SensorError,
    },
}

/// Simulation timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    pub readings: usize,
    pub timestep_seconds: u32,
    pub start_time: NaiveDateTime,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            readings: 720,
            timestep_seconds: 5,
            start_time: NaiveDate::from_ymd_opt(2024, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or_default(),
        }
    }
}

impl SimulationSettings {
    pub fn with_readings(mut self, readings: usize) -> Self {
        self.readings = readings;
        self
    }

    pub fn timestep_minutes(&self) -> f64 {
        self.timestep_seconds as f64 / 60.0
    }

    pub fn duration_minutes(&self) -> f64 {
        self.readings as f64 * self.timestep_minutes()
    }
}

/// Gap-filled tag series of one node, NaN where a value stayed missing
#[derive(Debug, Default)]
struct NodeFrame {
    series: BTreeMap<String, Vec<f64>>,
    audit: Option<AuditRecord>,
    completeness_percent: f64,
}

impl NodeFrame {
    fn tag(&self, tag: &str) -> Option<&[f64]> {
        self.series.get(tag).map(Vec::as_slice)
    }
}

/// Mass-conserving CO2 flow propagation over a facility graph.
///
/// Algorithm steps:
/// 1. Read raw samples for every node from the sensor source
/// 2. Treat BAD readings as missing and gap-fill each tag with the
///    jurisdiction's strategy; clip percentage tags to [0, 100]
/// 3. Walk nodes in topological order: capture roots produce flow, other
///    nodes receive an equal share of each predecessor's outflow
/// 4. Apply transport leakage and utilization conversion
/// 5. Accumulate captured and stored/utilized totals; net = max(0, difference)
pub struct FlowPropagator {
    settings: SimulationSettings,
}

impl FlowPropagator {
    pub fn new(settings: SimulationSettings) -> Self {
        Self { settings }
    }

    pub fn propagate(
        &self,
        ops: &OperationsGraph,
        source: &mut dyn SensorSource,
    ) -> Result<SimulationResult, SimulationError> {
        let model = GraphModel::build(ops)?;
        let jurisdiction = Jurisdiction::resolve(&ops.jurisdiction);
        let strategy = jurisdiction.strategy();
        let timestamps = timeline(
            self.settings.start_time,
            self.settings.readings,
            self.settings.timestep_seconds,
        );

        let mut frames = HashMap::with_capacity(model.node_count());
        for node in model.nodes() {
            let frame = self.prepare_node(
                node,
                &ops.metadata,
                &timestamps,
                strategy.as_ref(),
                source,
            )?;
            frames.insert(node.id.clone(), frame);
        }

        let order = model.topological_order();
        if order.cyclic {
            warn!(
                nodes = model.node_count(),
                "facility graph is cyclic, results for nodes on a cycle are best-effort"
            );
        }

        let timestep_minutes = self.settings.timestep_minutes();
        let mut flows: HashMap<&str, Vec<f64>> = HashMap::with_capacity(model.node_count());
        let mut nodes = BTreeMap::new();
        let mut captured = 0.0;
        let mut stored_or_utilized = 0.0;

        for id in &order.node_ids {
            let Some(node) = model.node(id) else { continue };
            let empty = NodeFrame::default();
            let frame = frames.get(id.as_str()).unwrap_or(&empty);

            let predecessors = model.predecessors(id);
            let inflow = if predecessors.is_empty() {
                self.root_outflow(node, frame)
            } else {
                let shares: Vec<Vec<f64>> = predecessors
                    .iter()
                    .filter_map(|p| flows.get(p).map(|f| fan_out_share(f, model.out_degree(p))))
                    .collect();
                sum_shares(&shares).unwrap_or_else(|| self.zeros())
            };

            let outflow = match node.node_type {
                NodeType::Transport => match frame.tag(tags::LEAKAGE) {
                    Some(leakage) => transport_outflow(&inflow, leakage),
                    None => inflow,
                },
                NodeType::Utilization => match frame.tag(tags::CONVERSION_RATE) {
                    Some(rate) => utilization_outflow(&inflow, rate),
                    None => inflow,
                },
                NodeType::Capture | NodeType::Storage | NodeType::Other => inflow,
            };

            let node_tonnes = total_tonnes(&outflow, timestep_minutes);
            if node.node_type == NodeType::Capture {
                captured += node_tonnes;
            }
            if node.node_type.is_sink_role() {
                stored_or_utilized += node_tonnes;
            }
            debug!(
                node = %id,
                node_type = %node.node_type,
                tonnes = node_tonnes,
                "node flow computed"
            );

            nodes.insert(
                id.clone(),
                NodeResult {
                    node_type: node.node_type,
                    name: node.display_name().to_string(),
                    timeseries: rows(&timestamps, &outflow, frame),
                    total_flow_tonnes: finite_or_zero(node_tonnes),
                    audit: frame.audit.clone(),
                    completeness_percent: frame.completeness_percent,
                },
            );
            flows.insert(id.as_str(), outflow);
        }

        let net = finite_or_zero((captured - stored_or_utilized).max(0.0));
        let result = SimulationResult {
            run_id: Uuid::new_v4(),
            nodes,
            processing_order: order.node_ids.clone(),
            degraded: order.cyclic,
            total_captured_co2_tonnes: finite_or_zero(captured),
            total_stored_or_utilized_co2_tonnes: finite_or_zero(stored_or_utilized),
            total_net_co2_tonnes: net,
            simulation_timestep_seconds: self.settings.timestep_seconds,
            simulation_readings: self.settings.readings,
            simulation_duration_minutes: self.settings.duration_minutes(),
            jurisdiction_used: ops.jurisdiction.clone(),
            strategy_applied: strategy.name().to_string(),
        };

        info!(
            run_id = %result.run_id,
            nodes = model.node_count(),
            edges = model.edge_count(),
            jurisdiction = %ops.jurisdiction,
            strategy = %result.strategy_applied,
            captured_t = result.total_captured_co2_tonnes,
            stored_or_utilized_t = result.total_stored_or_utilized_co2_tonnes,
            net_t = result.total_net_co2_tonnes,
            degraded = result.degraded,
            "simulation complete"
        );

        Ok(result)
    }

    /// Simulate, gap-fill and bound the tag series of one node
    fn prepare_node(
        &self,
        node: &Node,
        graph_metadata: &Metadata,
        timestamps: &[NaiveDateTime],
        strategy: &dyn GapFillingStrategy,
        source: &mut dyn SensorSource,
    ) -> Result<NodeFrame, SimulationError> {
        let raw = source
            .read(
                node.node_type,
                &node.params,
                self.settings.readings,
                self.settings.start_time,
                self.settings.timestep_seconds,
            )
            .map_err(|source| SimulationError::Sensor {
                node_id: node.id.clone(),
                source,
            })?;

        let mut frame = NodeFrame {
            completeness_percent: completeness_percent(&raw),
            ..NodeFrame::default()
        };
        if raw.is_empty() {
            return Ok(frame);
        }

        let mut metadata = merge_metadata(&node.metadata, graph_metadata);
        metadata
            .entry("interval_minutes".to_string())
            .or_insert_with(|| serde_json::json!(self.settings.timestep_minutes()));

        for (tag, series) in pivot_by_tag(&raw, timestamps) {
            let fill = strategy.fill(&series, &metadata);
            frame.audit = Some(match frame.audit.take() {
                Some(audit) => audit.merge(&fill.audit),
                None => fill.audit,
            });

            let mut values: Vec<f64> = fill.series.iter().map(|v| v.unwrap_or(f64::NAN)).collect();
            if tags::PERCENT_BOUNDED.contains(&tag.as_str()) {
                clip_percent(&mut values);
            }
            frame.series.insert(tag, values);
        }

        if frame.audit.as_ref().is_some_and(AuditRecord::requires_deviation) {
            warn!(node = %node.id, "missing tier 3 measurements, formal deviation required");
        }
        Ok(frame)
    }

    /// Outflow of a node without predecessors
    fn root_outflow(&self, node: &Node, frame: &NodeFrame) -> Vec<f64> {
        if node.node_type != NodeType::Capture {
            return self.zeros();
        }
        match (frame.tag(tags::FLOW), frame.tag(tags::EFFICIENCY)) {
            (Some(flow), Some(efficiency)) => capture_outflow(flow, efficiency),
            _ => {
                if self.settings.readings > 0 {
                    warn!(
                        node = %node.id,
                        "capture node lacks FLOW or EFFICIENCY, contributing zero flow"
                    );
                }
                self.zeros()
            }
        }
    }

    fn zeros(&self) -> Vec<f64> {
        vec![0.0; self.settings.readings]
    }
}

fn rows(timestamps: &[NaiveDateTime], outflow: &[f64], frame: &NodeFrame) -> Vec<TimeseriesRow> {
    timestamps
        .iter()
        .enumerate()
        .map(|(i, ts)| TimeseriesRow {
            timestamp: *ts,
            flow_kg_min: outflow.get(i).copied().and_then(finite_or_null),
            tags: frame
                .series
                .iter()
                .map(|(tag, values)| (tag.clone(), values.get(i).copied().and_then(finite_or_null)))
                .collect(),
        })
        .collect()
}
