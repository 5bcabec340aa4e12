//! The owning graph aggregate.

use std::cell::RefCell;
use std::collections::HashMap;

use ef_core::{CarrierId, Curve, EdgeId, NodeId, Real, guarded_div};

use crate::carrier::Carrier;
use crate::dataset::{Attr, CurveKey, Dataset};
use crate::edge::Edge;
use crate::error::{GraphError, GraphResult};
use crate::node::{Direction, Node};

/// Memoized derived quantities, keyed per node per dataset epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoKey {
    PrimaryDemand,
    PrimaryDemandOf(CarrierId),
    PrimaryCo2,
    CapturedEmissions,
    InheritedCapturedEmissions,
    SustainabilityShare,
    FinalDemand,
    DependentSupplyOf(CarrierId),
    WeightedCost,
    WeightedCo2,
}

/// Memoized terminal-classification predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKey {
    RightDeadEnd,
    DomesticDeadEnd,
}

/// A set of nodes, the edges between them, a set of carriers and the
/// attached mutable dataset.
///
/// The dataset is swappable as a whole: `clone_dataset` retains a snapshot
/// and `restore_dataset` swaps it back in. Each swap bumps the epoch
/// counter and drops every memoized value, which are the only two points
/// where the dataset generation changes.
#[derive(Debug)]
pub struct Graph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) carriers: Vec<Carrier>,
    pub(crate) node_index: HashMap<String, NodeId>,
    pub(crate) carrier_index: HashMap<String, CarrierId>,
    pub(crate) dataset: Dataset,
    retained: Option<Dataset>,
    epoch: u64,
    memo: RefCell<HashMap<(NodeId, MemoKey), Real>>,
    flags: RefCell<HashMap<(NodeId, FlagKey), bool>>,
}

impl Graph {
    pub(crate) fn assemble(
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        carriers: Vec<Carrier>,
        node_index: HashMap<String, NodeId>,
        carrier_index: HashMap<String, CarrierId>,
        dataset: Dataset,
    ) -> Self {
        Self {
            nodes,
            edges,
            carriers,
            node_index,
            carrier_index,
            dataset,
            retained: None,
            epoch: 0,
            memo: RefCell::new(HashMap::new()),
            flags: RefCell::new(HashMap::new()),
        }
    }

    // --- lookups ---------------------------------------------------------

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn carriers(&self) -> &[Carrier] {
        &self.carriers
    }

    pub fn node(&self, key: &str) -> GraphResult<&Node> {
        let id = self.node_id(key)?;
        Ok(self.node_by_id(id))
    }

    pub fn node_id(&self, key: &str) -> GraphResult<NodeId> {
        self.node_index
            .get(key)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode {
                key: key.to_string(),
            })
    }

    pub fn node_by_id(&self, id: NodeId) -> &Node {
        &self.nodes[id.index() as usize]
    }

    pub fn carrier(&self, key: &str) -> GraphResult<&Carrier> {
        let id = self.carrier_id(key)?;
        Ok(self.carrier_by_id(id))
    }

    pub fn carrier_id(&self, key: &str) -> GraphResult<CarrierId> {
        self.carrier_index
            .get(key)
            .copied()
            .ok_or_else(|| GraphError::UnknownCarrier {
                key: key.to_string(),
            })
    }

    pub fn carrier_by_id(&self, id: CarrierId) -> &Carrier {
        &self.carriers[id.index() as usize]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index() as usize]
    }

    /// Edges supplying a node.
    pub fn input_edges(&self, node: NodeId) -> impl Iterator<Item = &Edge> {
        self.node_by_id(node)
            .input_edge_ids()
            .iter()
            .map(|id| self.edge(*id))
    }

    /// Edges drawing from a node.
    pub fn output_edges(&self, node: NodeId) -> impl Iterator<Item = &Edge> {
        self.node_by_id(node)
            .output_edge_ids()
            .iter()
            .map(|id| self.edge(*id))
    }

    // --- demand and attributes -------------------------------------------

    /// A node's demand; `None` means "not yet computed", never zero.
    pub fn demand(&self, node: NodeId) -> Option<Real> {
        self.dataset.attr(node, Attr::Demand)
    }

    pub fn set_demand(&mut self, node: NodeId, demand: Real) {
        self.dataset.set_attr(node, Attr::Demand, demand);
    }

    pub fn attr(&self, node: NodeId, attr: Attr) -> Option<Real> {
        self.dataset.attr(node, attr)
    }

    pub fn set_attr(&mut self, node: NodeId, attr: Attr, value: Real) {
        self.dataset.set_attr(node, attr, value);
    }

    pub fn node_curve(&mut self, node: NodeId, key: CurveKey) -> Option<&Curve> {
        self.dataset.curve(node, key)
    }

    pub fn set_node_curve(&mut self, node: NodeId, key: CurveKey, curve: Curve) {
        self.dataset.set_curve(node, key, curve);
    }

    pub fn set_node_curve_lazy<F>(&mut self, node: NodeId, key: CurveKey, thunk: F)
    where
        F: Fn() -> Curve + Send + Sync + 'static,
    {
        self.dataset.set_curve_lazy(node, key, thunk);
    }

    // --- edge state ------------------------------------------------------

    pub fn edge_share(&self, edge: EdgeId) -> Option<Real> {
        self.dataset.edge_data(edge).share
    }

    pub fn set_edge_share(&mut self, edge: EdgeId, share: Real) {
        self.dataset.edge_data_mut(edge).share = Some(share);
    }

    pub fn set_edge_value(&mut self, edge: EdgeId, value: Real) {
        self.dataset.edge_data_mut(edge).value = Some(value);
    }

    /// Absolute flow on an edge.
    ///
    /// When only the share has been resolved, the value is derived as
    /// share x consumer demand x input conversion.
    pub fn edge_value(&self, edge: EdgeId) -> Option<Real> {
        let data = self.dataset.edge_data(edge);
        if let Some(value) = data.value {
            return Some(value);
        }
        let share = data.share?;
        let e = self.edge(edge);
        let demand = self.demand(e.consumer)?;
        let conversion = self.input_conversion(e.consumer, e.carrier);
        Some(share * demand * conversion)
    }

    /// The share of a consumer's demand arriving over an edge.
    ///
    /// A 0/0 or x/0 quotient reads as "no flow".
    pub fn demanding_share(&self, edge: EdgeId) -> Real {
        let e = self.edge(edge);
        let value = self.edge_value(edge).unwrap_or(0.0);
        let demand = self.demand(e.consumer).unwrap_or(0.0);
        guarded_div(value, demand)
    }

    // --- slot aggregates -------------------------------------------------

    /// Effective conversion of a slot: a dataset override written by an
    /// adapter wins over the static topology value.
    pub fn slot_conversion(&self, node: NodeId, carrier: CarrierId, direction: Direction) -> Real {
        self.dataset
            .slot_conversion(node, carrier, direction)
            .unwrap_or_else(|| match direction {
                Direction::Input => self.node_by_id(node).input_conversion(carrier),
                Direction::Output => self.node_by_id(node).output_conversion(carrier),
            })
    }

    pub fn set_slot_conversion(
        &mut self,
        node: NodeId,
        carrier: CarrierId,
        direction: Direction,
        conversion: Real,
    ) {
        self.dataset
            .set_slot_conversion(node, carrier, direction, conversion);
    }

    pub fn input_conversion(&self, node: NodeId, carrier: CarrierId) -> Real {
        self.slot_conversion(node, carrier, Direction::Input)
    }

    pub fn output_conversion(&self, node: NodeId, carrier: CarrierId) -> Real {
        self.slot_conversion(node, carrier, Direction::Output)
    }

    /// Fraction of a node's processed energy leaving as loss.
    pub fn loss_output_conversion(&self, node: NodeId) -> Real {
        self.node_by_id(node)
            .slots_in(Direction::Output)
            .filter(|s| self.carrier_by_id(s.carrier).loss)
            .map(|s| self.slot_conversion(node, s.carrier, Direction::Output))
            .sum()
    }

    /// Sum of a node's non-loss output conversions.
    pub fn output_conversion_sum(&self, node: NodeId) -> Real {
        self.node_by_id(node)
            .slots_in(Direction::Output)
            .filter(|s| !self.carrier_by_id(s.carrier).loss)
            .map(|s| self.slot_conversion(node, s.carrier, Direction::Output))
            .sum()
    }

    /// Sum of a node's input conversions.
    pub fn input_conversion_sum(&self, node: NodeId) -> Real {
        self.node_by_id(node)
            .slots_in(Direction::Input)
            .map(|s| self.slot_conversion(node, s.carrier, Direction::Input))
            .sum()
    }

    // --- dataset lifecycle -----------------------------------------------

    /// Current dataset generation. Bumped by `clone_dataset` and
    /// `restore_dataset`; memoized values never survive a bump.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Retain a snapshot of the dataset for a later restore.
    pub fn clone_dataset(&mut self) {
        self.retained = Some(self.dataset.clone());
        self.bump_epoch();
    }

    /// Swap the retained snapshot back in, discarding all mutations since
    /// `clone_dataset`.
    pub fn restore_dataset(&mut self) -> GraphResult<()> {
        let retained = self.retained.take().ok_or(GraphError::NoRetainedDataset)?;
        self.dataset = retained;
        self.bump_epoch();
        Ok(())
    }

    fn bump_epoch(&mut self) {
        self.epoch += 1;
        self.memo.borrow_mut().clear();
        self.flags.borrow_mut().clear();
    }

    // --- memoization -----------------------------------------------------

    /// Compute-and-cache a derived value once per dataset epoch.
    ///
    /// The closure must not call `fetch` for the same (node, key) pair.
    pub fn fetch<E>(
        &self,
        node: NodeId,
        key: MemoKey,
        f: impl FnOnce(&Graph) -> Result<Real, E>,
    ) -> Result<Real, E> {
        if let Some(value) = self.memo.borrow().get(&(node, key)) {
            return Ok(*value);
        }
        let value = f(self)?;
        self.memo.borrow_mut().insert((node, key), value);
        Ok(value)
    }

    /// Bypass for values that must be re-derived even within an epoch:
    /// skips the cache read but stores the fresh result.
    pub fn recompute<E>(
        &self,
        node: NodeId,
        key: MemoKey,
        f: impl FnOnce(&Graph) -> Result<Real, E>,
    ) -> Result<Real, E> {
        let value = f(self)?;
        self.memo.borrow_mut().insert((node, key), value);
        Ok(value)
    }

    /// Compute-and-cache a terminal-classification predicate.
    pub fn fetch_flag(&self, node: NodeId, key: FlagKey, f: impl FnOnce(&Graph) -> bool) -> bool {
        if let Some(value) = self.flags.borrow().get(&(node, key)) {
            return *value;
        }
        let value = f(self);
        self.flags.borrow_mut().insert((node, key), value);
        value
    }
}
