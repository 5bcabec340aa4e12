//! Edges: directed, carrier-typed flows between two nodes' slots.

use ef_core::{CarrierId, EdgeId, NodeId};
use serde::{Deserialize, Serialize};

/// How an edge's share is resolved during graph calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// The share is a fixed fraction of the consumer's demand.
    Share,
    /// The edge carries a constant absolute amount.
    Constant,
    /// The edge absorbs whatever remains after other edges are satisfied.
    Flexible,
    /// Flexible, resolved from the supplier side during time resolution.
    InverseFlexible,
}

/// A directed flow from one supplier node's output slot to one consumer
/// node's input slot, for a single carrier.
///
/// Both endpoints carry the same carrier; the builder refuses to connect
/// slots otherwise. The mutable share and absolute value live in the
/// dataset, keyed by this edge's ID.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    /// The right-hand node: the supplier.
    pub supplier: NodeId,
    /// The left-hand node: the consumer.
    pub consumer: NodeId,
    pub carrier: CarrierId,
    pub kind: EdgeKind,
}
