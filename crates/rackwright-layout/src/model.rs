use crate::factor::CoreGrid;
use indexmap::IndexMap;
use rackwright_core::geom::{CanvasRect, WorldBox, WorldPoint, WorldVector};
use rackwright_core::{Color, NodeColors};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutRect {
    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, other: &LayoutRect, eps: f64) -> bool {
        other.x + eps >= self.x
            && other.y + eps >= self.y
            && other.max_x() <= self.max_x() + eps
            && other.max_y() <= self.max_y() + eps
    }
}

impl From<CanvasRect> for LayoutRect {
    fn from(r: CanvasRect) -> Self {
        Self {
            x: r.origin.x,
            y: r.origin.y,
            width: r.size.width,
            height: r.size.height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelOrientation {
    Horizontal,
    /// Rotated a quarter turn counter-clockwise.
    Vertical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeLabel {
    pub text: String,
    /// Anchor point; the label is centered on it.
    pub x: f64,
    pub y: f64,
    pub orientation: LabelOrientation,
    /// Room available along the label's reading direction.
    pub max_width: f64,
    pub truncated: bool,
    /// Set on truncated labels: hovering this region shows the full node name.
    pub hover: Option<LayoutRect>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoreCell {
    pub index: u32,
    pub rect: LayoutRect,
    pub color: Color,
    pub job_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeCanvas {
    pub name: String,
    pub rect: LayoutRect,
    pub colors: NodeColors,
    pub led: LayoutRect,
    pub label: NodeLabel,
    /// `None` for nodes without scheduler data or without cores.
    pub grid: Option<CoreGrid>,
    pub cores: Vec<CoreCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RackCanvas {
    pub name: String,
    /// Size of the whole drawing surface for this rack.
    pub width: f64,
    pub height: f64,
    /// Outer rack outline, border included.
    pub frame: LayoutRect,
    /// Area inside the border where nodes live.
    pub body: LayoutRect,
    pub border_color: Color,
    pub body_color: Color,
    pub name_x: f64,
    pub name_y: f64,
    pub nodes: Vec<NodeCanvas>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenePoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<WorldPoint> for ScenePoint {
    fn from(p: WorldPoint) -> Self {
        Self {
            x: p.x,
            y: p.y,
            z: p.z,
        }
    }
}

impl From<WorldVector> for ScenePoint {
    fn from(v: WorldVector) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

/// Which footprint won for one room axis, and therefore how its texture is tiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tiling {
    /// The rack grid is larger: one tile per `cells_per_texture` cells.
    Units,
    /// The declared room is larger: one tile per `texture_size` world units.
    Declared,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoomAxis {
    pub size: f64,
    pub tiling: Tiling,
    pub texture_repeat: f64,
    /// Where the rack grid starts along this axis, so the grid is centered in a larger room.
    pub grid_offset: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Room {
    pub x: RoomAxis,
    pub z: RoomAxis,
    pub height: f64,
    pub wall_texture_repeat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RackPlacement {
    pub name: String,
    pub range_index: usize,
    /// Center of the rack base, on the floor.
    pub position: ScenePoint,
    pub size: ScenePoint,
    /// `+1` racks face `-z`, `-1` racks are turned around to face `+z`.
    pub coefficient: f64,
    pub yaw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePlacement {
    pub name: String,
    pub rack: String,
    pub position: ScenePoint,
    pub size: ScenePoint,
    pub yaw: f64,
    pub colors: NodeColors,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedPlacement {
    pub node: String,
    pub position: ScenePoint,
    pub size: f64,
    pub color: Color,
    pub yaw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuPlacement {
    pub node: String,
    pub index: u32,
    pub position: ScenePoint,
    pub size: f64,
    pub job_id: Option<u64>,
    pub yaw: f64,
}

/// A box the camera may not enter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForbiddenZone {
    pub min: ScenePoint,
    pub max: ScenePoint,
}

impl From<WorldBox> for ForbiddenZone {
    fn from(b: WorldBox) -> Self {
        Self {
            min: b.min.into(),
            max: b.max.into(),
        }
    }
}

impl ForbiddenZone {
    pub fn contains(&self, p: ScenePoint) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}

/// Planes bounding the space the camera may move in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForbiddenVoid {
    pub floor: f64,
    pub roof: f64,
    pub min_x: f64,
    pub max_x: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl ForbiddenVoid {
    pub fn allows(&self, p: ScenePoint) -> bool {
        p.y >= self.floor
            && p.y <= self.roof
            && p.x >= self.min_x
            && p.x <= self.max_x
            && p.z >= self.min_z
            && p.z <= self.max_z
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scene {
    pub room: Option<Room>,
    pub racks: Vec<RackPlacement>,
    pub nodes: Vec<NodePlacement>,
    pub leds: Vec<LedPlacement>,
    /// CPU blocks grouped by color so each group can be drawn as one instanced mesh.
    pub cpus: IndexMap<Color, Vec<CpuPlacement>>,
    pub forbidden_zones: Vec<ForbiddenZone>,
    pub forbidden_void: Option<ForbiddenVoid>,
}

impl Scene {
    pub fn cpu_count(&self) -> usize {
        self.cpus.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.room.is_none() && self.racks.is_empty()
    }

    /// Camera positions outside every rack zone and inside the room void.
    pub fn camera_allowed(&self, p: ScenePoint) -> bool {
        self.forbidden_void.is_none_or(|v| v.allows(p))
            && !self.forbidden_zones.iter().any(|z| z.contains(p))
    }
}
