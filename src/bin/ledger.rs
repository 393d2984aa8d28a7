//! Runs the reference two-node value chain (capture unit feeding a
//! compression and transport line) and prints its carbon ledger.

use anyhow::Result;
use carbon_ledger::config::Config;
use carbon_ledger::domain::{Node, NodeType, OperationsGraph};
use carbon_ledger::flow::FlowPropagator;
use carbon_ledger::report::LedgerReport;
use carbon_ledger::simulation::SimulatedSensorSource;
use carbon_ledger::telemetry::init_cli_tracing;

const READINGS: usize = 720;

fn value_chain() -> OperationsGraph {
    OperationsGraph::new("epa")
        .with_node(Node::new("capture", NodeType::Capture).with_name("Node 1 - Capture Unit"))
        .with_node(
            Node::new("transport", NodeType::Transport)
                .with_name("Node 2 - Compression & Transport"),
        )
        .with_edge("capture", "transport")
}

fn main() -> Result<()> {
    init_cli_tracing();

    let cfg = Config::load()?;
    let ops = value_chain();
    let mut source = SimulatedSensorSource::new(cfg.simulation.seed);

    let result =
        FlowPropagator::new(cfg.simulation.settings(READINGS)).propagate(&ops, &mut source)?;

    println!("{}", LedgerReport::new(&ops, &result));
    Ok(())
}
