//! Incremental graph builder.

use std::collections::HashMap;

use ef_core::{CarrierId, EdgeId, Id, NodeId, Real};

use crate::carrier::{Carrier, CarrierSpec};
use crate::dataset::{Dataset, EdgeData};
use crate::edge::{Edge, EdgeKind};
use crate::error::{GraphError, GraphResult};
use crate::graph::Graph;
use crate::node::{Direction, Group, Node, Slot};
use crate::validate;

/// Builder for constructing a graph incrementally.
///
/// Add carriers, nodes, slots and edges, then call `build()` to validate
/// and freeze the topology into a [`Graph`]. Edge endpoints are resolved to
/// slots at connect time, so a carrier mismatch is impossible by
/// construction; `build()` still re-validates and rejects cyclic supply
/// graphs.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    carriers: Vec<Carrier>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    node_index: HashMap<String, NodeId>,
    carrier_index: HashMap<String, CarrierId>,
    initial_shares: Vec<Option<Real>>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a carrier and return its ID.
    pub fn add_carrier(&mut self, spec: CarrierSpec) -> GraphResult<CarrierId> {
        if self.carrier_index.contains_key(&spec.key) {
            return Err(GraphError::DuplicateCarrier { key: spec.key });
        }
        let id = Id::from_index(self.carriers.len() as u32);
        self.carrier_index.insert(spec.key.clone(), id);
        self.carriers.push(Carrier {
            id,
            key: spec.key,
            co2_per_mj: spec.co2_per_mj,
            potential_co2_per_mj: spec.potential_co2_per_mj,
            cost_per_mj: spec.cost_per_mj,
            sustainable: spec.sustainable,
            infinite: spec.infinite,
            loss: spec.loss,
        });
        Ok(id)
    }

    /// Register a node and return its ID.
    pub fn add_node(&mut self, key: impl Into<String>) -> GraphResult<NodeId> {
        let key = key.into();
        if self.node_index.contains_key(&key) {
            return Err(GraphError::DuplicateNode { key });
        }
        let id = Id::from_index(self.nodes.len() as u32);
        self.node_index.insert(key.clone(), id);
        self.nodes.push(Node::new(id, key));
        Ok(id)
    }

    /// Tag a node with a group membership.
    pub fn tag(&mut self, node: NodeId, group: Group) {
        self.nodes[node.index() as usize].groups.insert(group);
    }

    /// Set a node's number of installed units (defaults to 1.0).
    pub fn set_units(&mut self, node: NodeId, units: Real) {
        self.nodes[node.index() as usize].units = units;
    }

    /// Attach a slot to a node.
    pub fn add_slot(
        &mut self,
        node: NodeId,
        direction: Direction,
        carrier: CarrierId,
        conversion: Real,
    ) -> GraphResult<()> {
        self.nodes[node.index() as usize].slots.push(Slot {
            carrier,
            direction,
            conversion,
        });
        Ok(())
    }

    /// Connect a supplier's output slot to a consumer's input slot.
    ///
    /// Both nodes must already carry a slot for the carrier in the right
    /// direction.
    pub fn connect(
        &mut self,
        supplier: NodeId,
        consumer: NodeId,
        carrier: CarrierId,
        kind: EdgeKind,
        share: Option<Real>,
    ) -> GraphResult<EdgeId> {
        self.require_slot(supplier, Direction::Output, carrier)?;
        self.require_slot(consumer, Direction::Input, carrier)?;

        let id = Id::from_index(self.edges.len() as u32);
        self.edges.push(Edge {
            id,
            supplier,
            consumer,
            carrier,
            kind,
        });
        self.initial_shares.push(share);
        self.nodes[consumer.index() as usize].input_edges.push(id);
        self.nodes[supplier.index() as usize].output_edges.push(id);
        Ok(id)
    }

    fn require_slot(
        &self,
        node: NodeId,
        direction: Direction,
        carrier: CarrierId,
    ) -> GraphResult<()> {
        let n = &self.nodes[node.index() as usize];
        let found = match direction {
            Direction::Input => n.input_slot(carrier).is_some(),
            Direction::Output => n.output_slot(carrier).is_some(),
        };
        if found {
            Ok(())
        } else {
            Err(GraphError::MissingSlot {
                node: n.key.clone(),
                carrier: self.carriers[carrier.index() as usize].key.clone(),
                direction: direction.as_str(),
            })
        }
    }

    /// Validate and freeze the topology.
    pub fn build(self) -> GraphResult<Graph> {
        validate::validate(&self.nodes, &self.edges, &self.carriers)?;

        let mut dataset = Dataset::default();
        for node in &self.nodes {
            dataset.register_node(node.id);
        }
        for (edge, share) in self.edges.iter().zip(self.initial_shares.iter()) {
            dataset.register_edge(
                edge.id,
                EdgeData {
                    share: *share,
                    value: None,
                },
            );
        }

        Ok(Graph::assemble(
            self.nodes,
            self.edges,
            self.carriers,
            self.node_index,
            self.carrier_index,
            dataset,
        ))
    }
}
