#![forbid(unsafe_code)]

//! `rackwright` turns raw cluster-monitoring payloads (racks, nodes, jobs, switch topology) into
//! renderable geometry: a room floor plan, one canvas per rack, a 3D room scene and a layered
//! network graph.
//!
//! Every refresh rebuilds everything from the inputs; nothing is patched in place.
//!
//! ```no_run
//! use rackwright::{ClusterInput, Engine, LayoutConfig};
//!
//! let input: ClusterInput = serde_json::from_str(r#"{"racks": {}}"#)?;
//! let snapshot = Engine::new(LayoutConfig::default()).refresh(&input)?;
//! println!("{} racks", snapshot.canvases.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use rackwright_core::*;

pub mod layout {
    pub use rackwright_layout::model::*;
    pub use rackwright_layout::text::{DeterministicTextMeasurer, TextMeasurer, TextStyle};
    pub use rackwright_layout::{
        Cell, CoreGrid, FactorPadding, FrameLoop, FrameLoopState, LayoutOptions, RackCell,
        RoomGrid, SceneSession, best_factor, orient, rack_unit_y_to_canvas_y,
    };
}

pub mod topology {
    pub use rackwright_topology::{
        GraphLink, GraphNode, LinkClass, NodeKind, TopologyGraph, seed_positions,
    };
}

use rackwright_layout::model::{RackCanvas, Scene};
use rackwright_layout::{LayoutOptions, RoomGrid, SceneSession};
use rackwright_topology::TopologyGraph;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] rackwright_core::Error),
    #[error(transparent)]
    Layout(#[from] rackwright_layout::Error),
    #[error(transparent)]
    Topology(#[from] rackwright_topology::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Everything a dashboard draws after one refresh.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub grid: RoomGrid,
    pub canvases: Vec<RackCanvas>,
    pub scene: Scene,
    pub topology: Option<TopologyGraph>,
    pub warnings: Vec<Warning>,
}

/// Bundles the layout configuration and text measurement used by every projection.
///
/// The configuration is fixed at construction; build another engine to change it.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: LayoutConfig,
    options: LayoutOptions,
}

impl Engine {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            options: LayoutOptions::default(),
        }
    }

    /// Defaults with a partial JSON document deep-merged on top.
    pub fn from_overrides(overrides: &serde_json::Value) -> Result<Self> {
        Ok(Self::new(LayoutConfig::from_overrides(overrides)?))
    }

    pub fn with_layout_options(mut self, options: LayoutOptions) -> Self {
        self.options = options;
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn ingest(&self, input: &ClusterInput) -> Result<ClusterData> {
        Ok(ingest(input)?)
    }

    pub fn grid(&self, data: &ClusterData, diag: &mut Diagnostics) -> RoomGrid {
        rackwright_layout::racks_to_grid(&data.racks, &self.config.room, diag)
    }

    pub fn canvases(&self, data: &ClusterData, diag: &mut Diagnostics) -> Vec<RackCanvas> {
        rackwright_layout::project_racks(
            &data.racks,
            data.known_nodes(),
            &data.allocations,
            &self.config,
            self.options.text_measurer.as_ref(),
            diag,
        )
    }

    pub fn canvas(
        &self,
        data: &ClusterData,
        rack: &str,
        diag: &mut Diagnostics,
    ) -> Result<RackCanvas> {
        Ok(rackwright_layout::project_named_rack(
            &data.racks,
            rack,
            data.known_nodes(),
            &data.allocations,
            &self.config,
            self.options.text_measurer.as_ref(),
            diag,
        )?)
    }

    /// Builds the 3D scene into `session`, replacing whatever it held.
    pub fn scene<'s>(
        &self,
        data: &ClusterData,
        grid: &RoomGrid,
        session: &'s mut SceneSession,
        diag: &mut Diagnostics,
    ) -> &'s Scene {
        session.build(
            grid,
            &data.racks,
            data.known_nodes(),
            &data.allocations,
            &self.config,
            diag,
        )
    }

    /// Seeded topology graph, or `None` when no topology was supplied.
    pub fn topology(
        &self,
        data: &ClusterData,
        diag: &mut Diagnostics,
    ) -> Result<Option<TopologyGraph>> {
        let Some(topology) = &data.topology else {
            return Ok(None);
        };
        let mut graph = rackwright_topology::build_topology_graph(
            topology,
            data.known_nodes(),
            &self.config.topology,
            diag,
        );
        graph.validate()?;
        rackwright_topology::seed_positions(&mut graph, &self.config.topology);
        Ok(Some(graph))
    }

    /// Decodes the inputs and rebuilds every projection.
    pub fn refresh(&self, input: &ClusterInput) -> Result<Snapshot> {
        let data = self.ingest(input)?;
        self.snapshot(&data)
    }

    pub fn snapshot(&self, data: &ClusterData) -> Result<Snapshot> {
        let mut diag = data.diagnostics.clone();
        let grid = self.grid(data, &mut diag);
        let canvases = self.canvases(data, &mut diag);
        let mut session = SceneSession::new();
        let scene = self.scene(data, &grid, &mut session, &mut diag).clone();
        session.clean();
        let topology = self.topology(data, &mut diag)?;

        tracing::debug!(
            racks = canvases.len(),
            warnings = diag.len(),
            "snapshot refreshed"
        );

        Ok(Snapshot {
            grid,
            canvases,
            scene,
            topology,
            warnings: diag.into_vec(),
        })
    }
}
