//! Structural validation of a built topology.

use std::collections::HashMap;

use ef_core::NodeId;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;

use crate::carrier::Carrier;
use crate::edge::Edge;
use crate::error::{GraphError, GraphResult};
use crate::node::{Direction, Node};

/// Validate nodes and edges before freezing the graph.
///
/// Slot existence per edge is guaranteed at connect time; it is re-checked
/// here so a graph assembled through any future path stays honest. The
/// supply graph must be acyclic: the recursive factor engine walks input
/// edges to exhaustion, so a cycle would have no well-defined answer.
pub(crate) fn validate(
    nodes: &[Node],
    edges: &[Edge],
    carriers: &[Carrier],
) -> GraphResult<()> {
    for edge in edges {
        require_slot(nodes, carriers, edge.supplier, Direction::Output, edge)?;
        require_slot(nodes, carriers, edge.consumer, Direction::Input, edge)?;
    }
    reject_cycles(nodes, edges)
}

fn require_slot(
    nodes: &[Node],
    carriers: &[Carrier],
    node: NodeId,
    direction: Direction,
    edge: &Edge,
) -> GraphResult<()> {
    let n = &nodes[node.index() as usize];
    let found = match direction {
        Direction::Input => n.input_slot(edge.carrier).is_some(),
        Direction::Output => n.output_slot(edge.carrier).is_some(),
    };
    if found {
        Ok(())
    } else {
        Err(GraphError::MissingSlot {
            node: n.key.clone(),
            carrier: carriers[edge.carrier.index() as usize].key.clone(),
            direction: direction.as_str(),
        })
    }
}

fn reject_cycles(nodes: &[Node], edges: &[Edge]) -> GraphResult<()> {
    let mut dag = DiGraph::<NodeId, ()>::new();
    let mut indices = HashMap::new();
    for node in nodes {
        indices.insert(node.id, dag.add_node(node.id));
    }
    for edge in edges {
        dag.add_edge(indices[&edge.supplier], indices[&edge.consumer], ());
    }

    match toposort(&dag, None) {
        Ok(_) => Ok(()),
        Err(cycle) => {
            let offender = dag[cycle.node_id()];
            Err(GraphError::CycleDetected {
                node: nodes[offender.index() as usize].key.clone(),
            })
        }
    }
}
