#![forbid(unsafe_code)]

//! Geometry for rack dashboards: the room floor plan, per-rack 2D canvases and the 3D room scene.
//!
//! Every function here is pure over already-ingested cluster data; recoverable problems are
//! reported through [`rackwright_core::Diagnostics`].

pub mod canvas;
pub mod cores;
pub mod factor;
pub mod model;
pub mod rackmap;
pub mod scene;
pub mod text;

pub use canvas::{project_named_rack, project_rack, project_racks, rack_unit_y_to_canvas_y};
pub use factor::{CoreGrid, FactorPadding, best_factor};
pub use rackmap::{Cell, RackCell, RoomGrid, racks_to_grid};
pub use scene::{FrameLoop, FrameLoopState, SceneSession, build_scene, orient};

use crate::text::{DeterministicTextMeasurer, TextMeasurer};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown rack: {name}")]
    UnknownRack { name: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone)]
pub struct LayoutOptions {
    pub text_measurer: Arc<dyn TextMeasurer + Send + Sync>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            text_measurer: Arc::new(DeterministicTextMeasurer::default()),
        }
    }
}

impl std::fmt::Debug for LayoutOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutOptions").finish_non_exhaustive()
    }
}
