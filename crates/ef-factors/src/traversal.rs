//! Cycle-guarded recursive traversal primitives.

use ef_core::{NodeId, Real};
use ef_graph::{Edge, FlagKey, Graph, Group};

use crate::error::{FactorError, FactorResult};

/// A strategy decides where a traversal path terminates.
///
/// Called with the node under consideration and the edge the walk arrived
/// over (`None` for the start node). Returning `Some(value)` ends the path
/// with that terminal value; `None` keeps recursing towards suppliers.
pub type Strategy<'a> = dyn Fn(&Graph, NodeId, Option<&Edge>) -> Option<Real> + 'a;

/// Whether a loss-excluding traversal propagates a per-unit value or a
/// plain factor. Values receive input compensation so efficiency ratios on
/// the path do not discount them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Factor,
    Value,
}

/// Whether a node has no input edges at all.
pub fn right_dead_end(graph: &Graph, node: NodeId) -> bool {
    graph.fetch_flag(node, FlagKey::RightDeadEnd, |g| {
        g.node_by_id(node).input_edge_ids().is_empty()
    })
}

/// Whether every supplier of a node sits in the energy-import group.
///
/// Import nodes terminate domestic traversals even though foreign supply
/// continues upstream of them. True for right dead ends as well.
pub fn domestic_dead_end(graph: &Graph, node: NodeId) -> bool {
    graph.fetch_flag(node, FlagKey::DomesticDeadEnd, |g| {
        g.input_edges(node)
            .all(|e| g.node_by_id(e.supplier).in_group(&Group::EnergyImport))
    })
}

/// Correction applied when a path passes across a supplier.
///
/// A supplier consuming part of its throughput as loss must draw
/// correspondingly more from its own suppliers: factor 1/(1-loss), or 0
/// when the node is all loss. A supplier whose non-loss outputs sum above
/// 1.0 models an over-unity conversion; its upstream draw is scaled back
/// by 1/output_sum.
pub fn loss_output_compensation(graph: &Graph, node: NodeId) -> Real {
    let loss = graph.loss_output_conversion(node);
    let loss_factor = if loss >= 1.0 { 0.0 } else { 1.0 / (1.0 - loss) };

    let output_sum = graph.output_conversion_sum(node);
    let efficiency_factor = if output_sum > 1.0 {
        1.0 / output_sum
    } else {
        1.0
    };

    loss_factor * efficiency_factor
}

/// Walk backwards along input edges, weighting each traversal step for
/// extensive quantities.
///
/// Per step from a consumer across an edge to its supplier, the path weight
/// is the edge's demanding share, times the supplier's loss/output
/// compensation, times the supplier's output conversion for the edge's
/// carrier. A terminal with loss therefore contributes its compensation and
/// conversion as exact inverses: loss at a terminal never distorts the
/// consumer's result.
pub fn recursive_factor(
    graph: &Graph,
    node: NodeId,
    strategy: &Strategy<'_>,
) -> FactorResult<Real> {
    let mut path = Vec::new();
    lossy_step(graph, node, None, strategy, &mut path)
}

fn lossy_step(
    graph: &Graph,
    node: NodeId,
    edge: Option<&Edge>,
    strategy: &Strategy<'_>,
    path: &mut Vec<NodeId>,
) -> FactorResult<Real> {
    if let Some(value) = strategy(graph, node, edge) {
        return Ok(value);
    }
    guard_cycle(graph, node, path)?;

    path.push(node);
    let mut total = 0.0;
    for e in graph.input_edges(node) {
        let demanding_share = graph.demanding_share(e.id);
        if demanding_share <= 0.0 {
            continue;
        }
        let weight = demanding_share
            * loss_output_compensation(graph, e.supplier)
            * graph.output_conversion(e.supplier, e.carrier);
        if weight == 0.0 {
            continue;
        }
        total += weight * lossy_step(graph, e.supplier, Some(e), strategy, path)?;
    }
    path.pop();

    Ok(total)
}

/// Walk backwards along input edges for intensive quantities.
///
/// Per step the weight is the edge's share times the consumer's input
/// conversion for the edge's carrier. With [`Propagation::Value`] each
/// recursion level is additionally scaled by 1/sum(input conversions), so
/// a node whose inputs account for less than its full throughput still
/// passes the value through undiluted.
pub fn recursive_factor_without_losses(
    graph: &Graph,
    node: NodeId,
    strategy: &Strategy<'_>,
    propagation: Propagation,
) -> FactorResult<Real> {
    let mut path = Vec::new();
    lossless_step(graph, node, None, strategy, propagation, &mut path)
}

fn lossless_step(
    graph: &Graph,
    node: NodeId,
    edge: Option<&Edge>,
    strategy: &Strategy<'_>,
    propagation: Propagation,
    path: &mut Vec<NodeId>,
) -> FactorResult<Real> {
    if let Some(value) = strategy(graph, node, edge) {
        return Ok(value);
    }
    guard_cycle(graph, node, path)?;

    let compensation = match propagation {
        Propagation::Value => {
            let sum = graph.input_conversion_sum(node);
            if sum > 0.0 { 1.0 / sum } else { 1.0 }
        }
        Propagation::Factor => 1.0,
    };

    path.push(node);
    let mut total = 0.0;
    for e in graph.input_edges(node) {
        let share = graph.edge_share(e.id).unwrap_or(0.0);
        let conversion = graph.input_conversion(node, e.carrier);
        let weight = share * conversion;
        if weight == 0.0 {
            continue;
        }
        total += weight * lossless_step(graph, e.supplier, Some(e), strategy, propagation, path)?;
    }
    path.pop();

    Ok(compensation * total)
}

fn guard_cycle(graph: &Graph, node: NodeId, path: &[NodeId]) -> FactorResult<()> {
    if path.contains(&node) {
        tracing::error!(node = %graph.node_by_id(node).key, "traversal revisited node");
        return Err(FactorError::CycleDetected {
            node: graph.node_by_id(node).key.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ef_graph::{CarrierSpec, Direction, EdgeKind, GraphBuilder};

    #[test]
    fn compensation_for_lossy_supplier() {
        let mut builder = GraphBuilder::new();
        let gas = builder.add_carrier(CarrierSpec::new("gas")).unwrap();
        let loss = builder.add_carrier(CarrierSpec::loss()).unwrap();
        let plant = builder.add_node("plant").unwrap();
        builder.add_slot(plant, Direction::Output, gas, 0.8).unwrap();
        builder.add_slot(plant, Direction::Output, loss, 0.2).unwrap();
        let graph = builder.build().unwrap();

        let plant = graph.node_id("plant").unwrap();
        let compensation = loss_output_compensation(&graph, plant);
        assert!((compensation - 1.25).abs() < 1e-12);
    }

    #[test]
    fn compensation_for_all_loss_supplier_is_zero() {
        let mut builder = GraphBuilder::new();
        let loss = builder.add_carrier(CarrierSpec::loss()).unwrap();
        let sink = builder.add_node("sink").unwrap();
        builder.add_slot(sink, Direction::Output, loss, 1.0).unwrap();
        let graph = builder.build().unwrap();

        let sink = graph.node_id("sink").unwrap();
        assert_eq!(loss_output_compensation(&graph, sink), 0.0);
    }

    #[test]
    fn compensation_for_over_unity_outputs() {
        let mut builder = GraphBuilder::new();
        let elec = builder.add_carrier(CarrierSpec::new("electricity")).unwrap();
        let heat = builder.add_carrier(CarrierSpec::new("heat")).unwrap();
        let chp = builder.add_node("chp").unwrap();
        builder.add_slot(chp, Direction::Output, elec, 0.8).unwrap();
        builder.add_slot(chp, Direction::Output, heat, 0.7).unwrap();
        let graph = builder.build().unwrap();

        let chp = graph.node_id("chp").unwrap();
        let compensation = loss_output_compensation(&graph, chp);
        assert!((compensation - 1.0 / 1.5).abs() < 1e-12);
    }

    #[test]
    fn dead_end_predicates() {
        let mut builder = GraphBuilder::new();
        let gas = builder.add_carrier(CarrierSpec::new("gas")).unwrap();
        let import = builder.add_node("import").unwrap();
        let plant = builder.add_node("plant").unwrap();
        builder.tag(import, ef_graph::Group::EnergyImport);
        builder.add_slot(import, Direction::Output, gas, 1.0).unwrap();
        builder.add_slot(plant, Direction::Input, gas, 1.0).unwrap();
        builder.add_slot(plant, Direction::Output, gas, 1.0).unwrap();
        builder
            .connect(import, plant, gas, EdgeKind::Share, Some(1.0))
            .unwrap();
        let graph = builder.build().unwrap();

        let import = graph.node_id("import").unwrap();
        let plant = graph.node_id("plant").unwrap();

        assert!(right_dead_end(&graph, import));
        assert!(domestic_dead_end(&graph, import));
        assert!(!right_dead_end(&graph, plant));
        assert!(domestic_dead_end(&graph, plant));
    }
}
