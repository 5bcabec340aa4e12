//! Nodes, slots and group tags.

use std::collections::BTreeSet;

use ef_core::{CarrierId, EdgeId, NodeId, Real};
use serde::{Deserialize, Serialize};

/// Direction of a slot relative to its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Energy flowing into the node (from suppliers).
    Input,
    /// Energy flowing out of the node (to consumers).
    Output,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }
}

/// Group memberships used as traversal predicates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    PrimaryEnergyDemand,
    FinalDemand,
    EnergyImport,
    EnergyExport,
    Other(String),
}

/// A node's named input or output port for one carrier.
///
/// The conversion factor is the share of the node's energy passing through
/// this slot. An output slot on the loss carrier represents energy leaving
/// the system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub carrier: CarrierId,
    pub direction: Direction,
    pub conversion: Real,
}

/// A converter or demand point in the energy graph.
///
/// Nodes carry static identity and topology only; every mutable quantity
/// (demand, injected results, curves) lives in the graph's dataset so that
/// the orchestrator can clone and restore calculation state as a whole.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub key: String,
    pub groups: BTreeSet<Group>,
    /// Number of installed units.
    pub units: Real,
    /// Ordered slots; order follows insertion.
    pub slots: Vec<Slot>,
    pub(crate) input_edges: Vec<EdgeId>,
    pub(crate) output_edges: Vec<EdgeId>,
}

impl Node {
    pub(crate) fn new(id: NodeId, key: String) -> Self {
        Self {
            id,
            key,
            groups: BTreeSet::new(),
            units: 1.0,
            slots: Vec::new(),
            input_edges: Vec::new(),
            output_edges: Vec::new(),
        }
    }

    pub fn in_group(&self, group: &Group) -> bool {
        self.groups.contains(group)
    }

    /// Find this node's input slot for a carrier.
    pub fn input_slot(&self, carrier: CarrierId) -> Option<&Slot> {
        self.slots
            .iter()
            .find(|s| s.direction == Direction::Input && s.carrier == carrier)
    }

    /// Find this node's output slot for a carrier.
    pub fn output_slot(&self, carrier: CarrierId) -> Option<&Slot> {
        self.slots
            .iter()
            .find(|s| s.direction == Direction::Output && s.carrier == carrier)
    }

    /// Conversion of the input slot for a carrier, 0.0 when absent.
    pub fn input_conversion(&self, carrier: CarrierId) -> Real {
        self.input_slot(carrier).map_or(0.0, |s| s.conversion)
    }

    /// Conversion of the output slot for a carrier, 0.0 when absent.
    pub fn output_conversion(&self, carrier: CarrierId) -> Real {
        self.output_slot(carrier).map_or(0.0, |s| s.conversion)
    }

    pub fn slots_in(&self, direction: Direction) -> impl Iterator<Item = &Slot> {
        self.slots.iter().filter(move |s| s.direction == direction)
    }

    /// IDs of edges supplying this node.
    pub fn input_edge_ids(&self) -> &[EdgeId] {
        &self.input_edges
    }

    /// IDs of edges consuming from this node.
    pub fn output_edge_ids(&self) -> &[EdgeId] {
        &self.output_edges
    }
}
