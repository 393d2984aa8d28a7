use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::{Node, OperationsGraph};

/// Structural problems in a submitted facility graph
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("node id must not be empty")]
    EmptyNodeId,
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),
    #[error("edge {from} -> {to} references unknown node {missing}")]
    UnknownEdgeEndpoint {
        from: String,
        to: String,
        missing: String,
    },
}

/// Processing order over every node of the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologicalOrder {
    pub node_ids: Vec<String>,
    /// The graph has a cycle; `node_ids` is insertion order rather than
    /// dependency order
    pub cyclic: bool,
}

/// Validated, immutable facility graph
#[derive(Debug, Clone)]
pub struct GraphModel {
    graph: DiGraph<Node, ()>,
    index: HashMap<String, NodeIndex>,
}

impl GraphModel {
    /// Build the graph, failing fast on empty or duplicate ids and on edges
    /// with unknown endpoints. Repeated edges collapse into one.
    pub fn build(ops: &OperationsGraph) -> Result<Self, GraphError> {
        let mut graph = DiGraph::with_capacity(ops.nodes.len(), ops.edges.len());
        let mut index = HashMap::with_capacity(ops.nodes.len());

        for node in &ops.nodes {
            if node.id.is_empty() {
                return Err(GraphError::EmptyNodeId);
            }
            if index.contains_key(&node.id) {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
            let idx = graph.add_node(node.clone());
            index.insert(node.id.clone(), idx);
        }

        for edge in &ops.edges {
            let lookup = |id: &String| {
                index
                    .get(id)
                    .copied()
                    .ok_or_else(|| GraphError::UnknownEdgeEndpoint {
                        from: edge.source.clone(),
                        to: edge.target.clone(),
                        missing: id.clone(),
                    })
            };
            let source = lookup(&edge.source)?;
            let target = lookup(&edge.target)?;
            graph.update_edge(source, target, ());
        }

        Ok(Self { graph, index })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|idx| &self.graph[*idx])
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Dependency order. A cyclic graph still yields every node once, in
    /// insertion order, with `cyclic` set.
    pub fn topological_order(&self) -> TopologicalOrder {
        match toposort(&self.graph, None) {
            Ok(order) => TopologicalOrder {
                node_ids: order.into_iter().map(|idx| self.graph[idx].id.clone()).collect(),
                cyclic: false,
            },
            Err(cycle) => {
                tracing::warn!(
                    node = %self.graph[cycle.node_id()].id,
                    "cycle detected, falling back to insertion order"
                );
                TopologicalOrder {
                    node_ids: self.nodes().map(|n| n.id.clone()).collect(),
                    cyclic: true,
                }
            }
        }
    }

    /// Ids of the direct upstream nodes (empty for unknown ids)
    pub fn predecessors(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Ids of the direct downstream nodes (empty for unknown ids)
    pub fn successors(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Number of distinct downstream nodes
    pub fn out_degree(&self, id: &str) -> usize {
        self.index
            .get(id)
            .map(|idx| {
                self.graph
                    .neighbors_directed(*idx, Direction::Outgoing)
                    .count()
            })
            .unwrap_or(0)
    }

    fn neighbors(&self, id: &str, dir: Direction) -> Vec<&str> {
        let Some(idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut ids: Vec<&str> = self
            .graph
            .neighbors_directed(*idx, dir)
            .map(|n| self.graph[n].id.as_str())
            .collect();
        // petgraph walks adjacency lists newest-first
        ids.reverse();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NodeType;
    use proptest::prelude::*;

    fn chain() -> OperationsGraph {
        OperationsGraph::new("epa")
            .with_node(Node::new("store", NodeType::Storage))
            .with_node(Node::new("pipe", NodeType::Transport))
            .with_node(Node::new("dac", NodeType::Capture))
            .with_edge("dac", "pipe")
            .with_edge("pipe", "store")
    }

    #[test]
    fn test_build_and_query() {
        let model = GraphModel::build(&chain()).unwrap();
        assert_eq!(model.node_count(), 3);
        assert_eq!(model.edge_count(), 2);
        assert_eq!(model.predecessors("pipe"), vec!["dac"]);
        assert_eq!(model.successors("pipe"), vec!["store"]);
        assert_eq!(model.out_degree("dac"), 1);
        assert_eq!(model.out_degree("store"), 0);
        assert!(model.predecessors("nope").is_empty());
    }

    #[test]
    fn test_topological_order_respects_edges() {
        let model = GraphModel::build(&chain()).unwrap();
        let order = model.topological_order();
        assert!(!order.cyclic);
        assert_eq!(order.node_ids, vec!["dac", "pipe", "store"]);
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let ops = chain().with_node(Node::new("dac", NodeType::Capture));
        assert_eq!(
            GraphModel::build(&ops).unwrap_err(),
            GraphError::DuplicateNode("dac".into())
        );
    }

    #[test]
    fn test_unknown_edge_endpoint_rejected() {
        let ops = chain().with_edge("pipe", "ghost");
        let err = GraphModel::build(&ops).unwrap_err();
        assert!(matches!(
            err,
            GraphError::UnknownEdgeEndpoint { ref missing, .. } if missing == "ghost"
        ));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_repeated_edges_collapse() {
        let ops = chain().with_edge("dac", "pipe").with_edge("dac", "store");
        let model = GraphModel::build(&ops).unwrap();
        assert_eq!(model.out_degree("dac"), 2);
        assert_eq!(model.edge_count(), 3);
    }

    #[test]
    fn test_cycle_falls_back_to_insertion_order() {
        let ops = chain().with_edge("store", "dac");
        let model = GraphModel::build(&ops).unwrap();
        let order = model.topological_order();
        assert!(order.cyclic);
        assert_eq!(order.node_ids, vec!["store", "pipe", "dac"]);
    }

    #[test]
    fn test_self_loop_is_cyclic() {
        let ops = chain().with_edge("pipe", "pipe");
        let order = GraphModel::build(&ops).unwrap().topological_order();
        assert!(order.cyclic);
        assert_eq!(order.node_ids.len(), 3);
    }

    proptest! {
        // Edges only point from lower to higher index, so the graph is acyclic.
        #[test]
        fn prop_predecessors_come_first(
            n in 1usize..12,
            raw_edges in prop::collection::vec((0usize..12, 0usize..12), 0..30),
        ) {
            let mut ops = OperationsGraph::new("lcfs");
            for i in 0..n {
                ops = ops.with_node(Node::new(format!("n{i}"), NodeType::Other));
            }
            for (a, b) in raw_edges {
                let (a, b) = (a % n, b % n);
                if a < b {
                    ops = ops.with_edge(format!("n{a}"), format!("n{b}"));
                }
            }

            let model = GraphModel::build(&ops).unwrap();
            let order = model.topological_order();
            prop_assert!(!order.cyclic);
            prop_assert_eq!(order.node_ids.len(), n);

            let position: HashMap<&str, usize> = order
                .node_ids
                .iter()
                .enumerate()
                .map(|(i, id)| (id.as_str(), i))
                .collect();
            for id in &order.node_ids {
                for pred in model.predecessors(id) {
                    prop_assert!(position[pred] < position[id.as_str()]);
                }
            }
        }
    }
}
