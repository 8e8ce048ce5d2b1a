#![forbid(unsafe_code)]

//! Network topology graph for cluster dashboards.
//!
//! A switch hierarchy (leaf switches holding compute nodes, higher levels holding switches) is
//! flattened into index-linked node and link lists that a force-directed renderer can consume
//! directly.

pub mod builder;
pub mod error;
pub mod graph;
pub mod seed;

pub use builder::build_topology_graph;
pub use error::{Error, Result};
pub use graph::{GraphLink, GraphNode, LinkClass, NodeKind, TopologyGraph};
pub use seed::seed_positions;
