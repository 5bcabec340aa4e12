//! The swappable per-calculation attribute store.
//!
//! All mutable calculation state (demands, injected results, hourly curves,
//! edge shares) lives here rather than on the node and edge structs. The
//! orchestrator clones the dataset before the speculative first pass and
//! restores it before injecting final results; that swap is the system's
//! only transactional behavior.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ef_core::{CarrierId, Curve, EdgeId, NodeId, Real};
use serde::{Deserialize, Serialize};

use crate::node::Direction;

/// Closed set of scalar node attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attr {
    Demand,
    FullLoadHours,
    MarginalCosts,
    ProfitPerUnit,
    NumberOfUnits,
    /// Fraction of CO2 emitted without being counted (free allowances).
    FreeCo2Factor,
    /// Fraction of potential CO2 captured at this node.
    CaptureRate,
    StorageVolume,
}

/// Closed set of curve attributes: (carrier, direction) plus the named
/// reserves. Replaces interpolated attribute names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveKey {
    CarrierInput(CarrierId),
    CarrierOutput(CarrierId),
    Storage,
    Temperature,
}

/// A curve that may not have been materialized yet.
///
/// Calculators hand the dataset a thunk instead of a finished curve, so the
/// conversion cost is only paid when something reads the curve back.
#[derive(Clone)]
pub enum LazyCurve {
    Ready(Curve),
    Pending(Arc<dyn Fn() -> Curve + Send + Sync>),
}

impl LazyCurve {
    /// Materialize in place and return the curve.
    pub fn materialize(&mut self) -> &Curve {
        if let LazyCurve::Pending(thunk) = self {
            *self = LazyCurve::Ready(thunk());
        }
        match self {
            LazyCurve::Ready(curve) => curve,
            LazyCurve::Pending(_) => unreachable!("materialized above"),
        }
    }
}

impl fmt::Debug for LazyCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LazyCurve::Ready(_) => f.write_str("LazyCurve::Ready"),
            LazyCurve::Pending(_) => f.write_str("LazyCurve::Pending"),
        }
    }
}

/// Mutable state of one node.
#[derive(Debug, Clone, Default)]
pub struct NodeData {
    pub attrs: HashMap<Attr, Real>,
    pub curves: HashMap<CurveKey, LazyCurve>,
    /// Re-balanced slot conversions, overriding the static topology.
    /// Written by adapters whose realized split differs from the
    /// configured one (hybrid and variable-efficiency producers).
    pub slot_conversions: HashMap<(CarrierId, Direction), Real>,
}

/// Mutable state of one edge.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EdgeData {
    /// Share of the consumer's demand carried by this edge, 0.0 to 1.0.
    /// `None` until resolved.
    pub share: Option<Real>,
    /// Absolute flow carried by this edge. `None` until resolved.
    pub value: Option<Real>,
}

/// The bag of per-entity attribute values attached to a graph.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    nodes: HashMap<NodeId, NodeData>,
    edges: HashMap<EdgeId, EdgeData>,
}

impl Dataset {
    pub(crate) fn register_node(&mut self, node: NodeId) {
        self.nodes.entry(node).or_default();
    }

    pub(crate) fn register_edge(&mut self, edge: EdgeId, data: EdgeData) {
        self.edges.insert(edge, data);
    }

    pub fn attr(&self, node: NodeId, attr: Attr) -> Option<Real> {
        self.nodes.get(&node)?.attrs.get(&attr).copied()
    }

    pub fn set_attr(&mut self, node: NodeId, attr: Attr, value: Real) {
        self.nodes.entry(node).or_default().attrs.insert(attr, value);
    }

    pub fn edge_data(&self, edge: EdgeId) -> EdgeData {
        self.edges.get(&edge).copied().unwrap_or_default()
    }

    pub fn edge_data_mut(&mut self, edge: EdgeId) -> &mut EdgeData {
        self.edges.entry(edge).or_default()
    }

    /// Read a curve, materializing it if it was written lazily.
    pub fn curve(&mut self, node: NodeId, key: CurveKey) -> Option<&Curve> {
        self.nodes
            .get_mut(&node)?
            .curves
            .get_mut(&key)
            .map(|lazy| &*lazy.materialize())
    }

    pub fn set_curve(&mut self, node: NodeId, key: CurveKey, curve: Curve) {
        self.nodes
            .entry(node)
            .or_default()
            .curves
            .insert(key, LazyCurve::Ready(curve));
    }

    /// Store a curve thunk; the curve is only built when first read.
    pub fn set_curve_lazy<F>(&mut self, node: NodeId, key: CurveKey, thunk: F)
    where
        F: Fn() -> Curve + Send + Sync + 'static,
    {
        self.nodes
            .entry(node)
            .or_default()
            .curves
            .insert(key, LazyCurve::Pending(Arc::new(thunk)));
    }

    pub fn has_curve(&self, node: NodeId, key: CurveKey) -> bool {
        self.nodes
            .get(&node)
            .is_some_and(|d| d.curves.contains_key(&key))
    }

    pub fn slot_conversion(
        &self,
        node: NodeId,
        carrier: CarrierId,
        direction: Direction,
    ) -> Option<Real> {
        self.nodes
            .get(&node)?
            .slot_conversions
            .get(&(carrier, direction))
            .copied()
    }

    pub fn set_slot_conversion(
        &mut self,
        node: NodeId,
        carrier: CarrierId,
        direction: Direction,
        conversion: Real,
    ) {
        self.nodes
            .entry(node)
            .or_default()
            .slot_conversions
            .insert((carrier, direction), conversion);
    }
}
