#![forbid(unsafe_code)]

//! Cluster data model and ingestion for the rackwright layout engine.
//!
//! Raw REST payloads (racks, nodes, jobs, topology) are decoded once here into closed, typed
//! structures; layout crates never look at raw JSON.

pub mod colors;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod geom;
pub mod ingest;
pub mod model;
pub mod nodeset;
pub mod state;

pub use colors::{Color, ColorScheme, LedStatus, NodeColors, Occupancy};
pub use config::{CanvasConfig, LayoutConfig, RoomConfig, SceneConfig, TopologyConfig};
pub use diagnostics::{Diagnostics, Warning, WarningKind};
pub use error::{Error, Result};
pub use ingest::{ClusterData, ClusterInput, ingest};
pub use model::{
    AllocatedCpus, CoreAllocation, Job, JobState, Rack, RackNode, RackRange, RackSet, SlurmNode,
    SlurmNodes, Switch, Topology,
};
pub use state::{NodeState, StateKind};

#[cfg(test)]
mod tests;
