//! ef-graph: the energy graph model.
//!
//! Provides:
//! - Core data structures (Carrier, Node, Slot, Edge, Graph)
//! - The swappable per-calculation `Dataset` attribute store, with
//!   epoch-keyed memoization and lazy curve writes
//! - Incremental graph builder with structural validation, including
//!   rejection of cyclic supply graphs
//!
//! This crate owns attribute storage and memoization only; the traversal
//! algorithms that derive aggregate quantities live in `ef-factors`, and
//! the hourly calculators in `ef-dispatch`, `ef-heat` and `ef-balance`.
//!
//! # Example
//!
//! ```
//! use ef_graph::{CarrierSpec, Direction, EdgeKind, GraphBuilder};
//!
//! let mut builder = GraphBuilder::new();
//! let gas = builder.add_carrier(CarrierSpec::new("natural_gas")).unwrap();
//! let source = builder.add_node("gas_extraction").unwrap();
//! let plant = builder.add_node("gas_plant").unwrap();
//! builder.add_slot(source, Direction::Output, gas, 1.0).unwrap();
//! builder.add_slot(plant, Direction::Input, gas, 1.0).unwrap();
//! builder
//!     .connect(source, plant, gas, EdgeKind::Share, Some(1.0))
//!     .unwrap();
//! let mut graph = builder.build().unwrap();
//!
//! graph.set_demand(plant, 100.0);
//! assert_eq!(graph.demand(plant), Some(100.0));
//! ```

pub mod builder;
pub mod carrier;
pub mod dataset;
pub mod edge;
pub mod error;
pub mod graph;
pub mod node;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::GraphBuilder;
pub use carrier::{Carrier, CarrierSpec};
pub use dataset::{Attr, CurveKey, Dataset, LazyCurve};
pub use edge::{Edge, EdgeKind};
pub use error::{GraphError, GraphResult};
pub use graph::{FlagKey, Graph, MemoKey};
pub use node::{Direction, Group, Node, Slot};
