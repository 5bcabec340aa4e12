//! Derived aggregate metrics.
//!
//! Each metric is a thin strategy function over the traversal primitives,
//! multiplied by the node's demand where the quantity is extensive, and
//! memoized per node per dataset epoch through `Graph::fetch`.

use ef_core::{CarrierId, NodeId, Real};
use ef_graph::{Attr, Direction, Edge, Graph, Group, MemoKey};

use crate::error::FactorResult;
use crate::traversal::{
    Propagation, domestic_dead_end, recursive_factor, recursive_factor_without_losses,
    right_dead_end,
};

/// Primary energy needed to deliver this node's demand, accounting for
/// upstream losses.
pub fn primary_demand(graph: &Graph, node: NodeId) -> FactorResult<Real> {
    graph.fetch(node, MemoKey::PrimaryDemand, |g| {
        let demand = g.demand(node).unwrap_or(0.0);
        let factor = recursive_factor(g, node, &|g, n, e| primary_terminal(g, n, e, None))?;
        Ok(demand * factor)
    })
}

/// Primary energy demand attributable to a single carrier.
pub fn primary_demand_of(graph: &Graph, node: NodeId, carrier: CarrierId) -> FactorResult<Real> {
    graph.fetch(node, MemoKey::PrimaryDemandOf(carrier), |g| {
        let demand = g.demand(node).unwrap_or(0.0);
        let factor =
            recursive_factor(g, node, &|g, n, e| primary_terminal(g, n, e, Some(carrier)))?;
        Ok(demand * factor)
    })
}

fn primary_terminal(
    graph: &Graph,
    node: NodeId,
    edge: Option<&Edge>,
    carrier: Option<CarrierId>,
) -> Option<Real> {
    if !domestic_dead_end(graph, node) {
        return None;
    }
    if !graph.node_by_id(node).in_group(&Group::PrimaryEnergyDemand) {
        return Some(0.0);
    }
    match carrier {
        None => Some(1.0),
        Some(wanted) => {
            let matches = match arrival_carrier(graph, node, edge) {
                Some(found) => found == wanted,
                None => false,
            };
            Some(if matches { 1.0 } else { 0.0 })
        }
    }
}

/// The carrier a path arrived over, falling back to the terminal's own
/// first non-loss output for a traversal that starts at the terminal.
fn arrival_carrier(graph: &Graph, node: NodeId, edge: Option<&Edge>) -> Option<CarrierId> {
    match edge {
        Some(e) => Some(e.carrier),
        None => graph
            .node_by_id(node)
            .slots_in(Direction::Output)
            .find(|s| !graph.carrier_by_id(s.carrier).loss)
            .map(|s| s.carrier),
    }
}

/// CO2 emitted to cover this node's demand, discounted by each terminal's
/// free-CO2 factor.
pub fn primary_co2_emission(graph: &Graph, node: NodeId) -> FactorResult<Real> {
    graph.fetch(node, MemoKey::PrimaryCo2, |g| {
        let demand = g.demand(node).unwrap_or(0.0);
        let factor = recursive_factor(g, node, &|g, n, e| {
            if !domestic_dead_end(g, n) {
                return None;
            }
            if !g.node_by_id(n).in_group(&Group::PrimaryEnergyDemand) {
                return Some(0.0);
            }
            let Some(carrier) = arrival_carrier(g, n, e) else {
                return Some(0.0);
            };
            let free = g.attr(n, Attr::FreeCo2Factor).unwrap_or(0.0);
            Some(g.carrier_by_id(carrier).co2_per_mj * (1.0 - free))
        })?;
        Ok(demand * factor)
    })
}

/// CO2 captured at this node itself: demand x capture rate x the potential
/// CO2 of its non-loss outputs.
pub fn captured_emissions(graph: &Graph, node: NodeId) -> FactorResult<Real> {
    graph.fetch(node, MemoKey::CapturedEmissions, |g| {
        let demand = g.demand(node).unwrap_or(0.0);
        Ok(demand * captured_per_unit(g, node))
    })
}

/// CO2 captured anywhere upstream on behalf of this node's demand.
pub fn inherited_captured_emissions(graph: &Graph, node: NodeId) -> FactorResult<Real> {
    graph.fetch(node, MemoKey::InheritedCapturedEmissions, |g| {
        let demand = g.demand(node).unwrap_or(0.0);
        let factor = recursive_factor(g, node, &|g, n, _e| {
            if right_dead_end(g, n) {
                Some(captured_per_unit(g, n))
            } else {
                None
            }
        })?;
        Ok(demand * factor)
    })
}

fn captured_per_unit(graph: &Graph, node: NodeId) -> Real {
    let capture = graph.attr(node, Attr::CaptureRate).unwrap_or(0.0);
    if capture == 0.0 {
        return 0.0;
    }
    let potential: Real = graph
        .node_by_id(node)
        .slots_in(Direction::Output)
        .filter(|s| !graph.carrier_by_id(s.carrier).loss)
        .map(|s| s.conversion * graph.carrier_by_id(s.carrier).potential_co2_per_mj)
        .sum();
    capture * potential
}

/// Demand-weighted share of this node's supply coming from sustainable
/// sources. Intensive: propagated without loss weighting.
pub fn sustainability_share(graph: &Graph, node: NodeId) -> FactorResult<Real> {
    graph.fetch(node, MemoKey::SustainabilityShare, |g| {
        recursive_factor_without_losses(
            g,
            node,
            &|g, n, e| {
                if !right_dead_end(g, n) {
                    return None;
                }
                let Some(carrier) = arrival_carrier(g, n, e) else {
                    return Some(0.0);
                };
                let c = g.carrier_by_id(carrier);
                Some(if c.infinite { 1.0 } else { c.sustainable })
            },
            Propagation::Factor,
        )
    })
}

/// Demand attributable to final-demand nodes downstream of the walk.
pub fn final_demand(graph: &Graph, node: NodeId) -> FactorResult<Real> {
    graph.fetch(node, MemoKey::FinalDemand, |g| {
        let demand = g.demand(node).unwrap_or(0.0);
        let factor = recursive_factor(g, node, &|g, n, _e| {
            if g.node_by_id(n).in_group(&Group::FinalDemand) {
                Some(1.0)
            } else if right_dead_end(g, n) {
                Some(0.0)
            } else {
                None
            }
        })?;
        Ok(demand * factor)
    })
}

/// How much of this node's demand is supplied, directly or indirectly,
/// over edges of the named carrier.
pub fn dependent_supply_of(graph: &Graph, node: NodeId, carrier: CarrierId) -> FactorResult<Real> {
    graph.fetch(node, MemoKey::DependentSupplyOf(carrier), |g| {
        let demand = g.demand(node).unwrap_or(0.0);
        let factor = recursive_factor(g, node, &|g, n, e| match e {
            Some(edge) if edge.carrier == carrier => Some(1.0),
            _ if right_dead_end(g, n) => Some(0.0),
            _ => None,
        })?;
        Ok(demand * factor)
    })
}

/// Cost per MJ of this node's carrier mix. A per-unit value: input
/// compensation keeps path efficiencies from diluting it.
pub fn weighted_cost(graph: &Graph, node: NodeId) -> FactorResult<Real> {
    graph.fetch(node, MemoKey::WeightedCost, |g| {
        recursive_factor_without_losses(
            g,
            node,
            &|g, n, e| {
                if !right_dead_end(g, n) {
                    return None;
                }
                arrival_carrier(g, n, e).map_or(Some(0.0), |c| Some(g.carrier_by_id(c).cost_per_mj))
            },
            Propagation::Value,
        )
    })
}

/// CO2 intensity per MJ of this node's carrier mix.
pub fn weighted_co2(graph: &Graph, node: NodeId) -> FactorResult<Real> {
    graph.fetch(node, MemoKey::WeightedCo2, |g| {
        recursive_factor_without_losses(
            g,
            node,
            &|g, n, e| {
                if !right_dead_end(g, n) {
                    return None;
                }
                arrival_carrier(g, n, e).map_or(Some(0.0), |c| Some(g.carrier_by_id(c).co2_per_mj))
            },
            Propagation::Value,
        )
    })
}
