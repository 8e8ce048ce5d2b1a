//! 3D room scene.
//!
//! World space has Y up and the floor at `y = 0`. Grid columns run along X and grid rows along Z.
//! Even ranges face `-z`; odd ranges are turned around (yaw π) so neighbouring ranges share an
//! aisle. Everything attached to a rack is described in the rack's front view and turned into
//! world offsets by [`orient`].

mod session;

pub use session::{FrameLoop, FrameLoopState, SceneSession};

use crate::cores::assign_core_owners;
use crate::factor::{FactorPadding, best_factor};
use crate::model::{
    CpuPlacement, ForbiddenVoid, ForbiddenZone, LedPlacement, NodePlacement, RackPlacement, Room,
    RoomAxis, Scene, ScenePoint, Tiling,
};
use crate::rackmap::RoomGrid;
use rackwright_core::geom::{WorldBox, WorldVector, world_point, world_vector};
use rackwright_core::{
    AllocatedCpus, Diagnostics, LayoutConfig, NodeColors, RackNode, RackSet, SceneConfig,
    SlurmNodes,
};
use std::f64::consts::PI;

/// `+1` for even ranges, `-1` for odd ones.
pub fn temperature_coefficient(range_index: usize) -> f64 {
    if range_index % 2 == 0 { 1.0 } else { -1.0 }
}

/// World offset of a point given in a rack's front view, where `local.x` points to the viewer's
/// right, `local.y` up and `local.z` from the rack center toward the viewer. A `+1` rack faces
/// `-z`; a `-1` rack is the same rack turned half a turn around Y.
pub fn orient(coefficient: f64, local: WorldVector) -> WorldVector {
    world_vector(-local.x * coefficient, local.y, -local.z * coefficient)
}

fn axis(
    cells: usize,
    cell_size: f64,
    declared: Option<f64>,
    config: &SceneConfig,
) -> RoomAxis {
    let natural = cells as f64 * cell_size;
    match declared {
        Some(declared) if declared > natural => RoomAxis {
            size: declared,
            tiling: Tiling::Declared,
            texture_repeat: (declared / config.texture_size).ceil(),
            grid_offset: (declared - natural) / 2.0,
        },
        _ => RoomAxis {
            size: natural,
            tiling: Tiling::Units,
            texture_repeat: cells as f64 / config.cells_per_texture,
            grid_offset: 0.0,
        },
    }
}

pub fn build_room(grid: &RoomGrid, config: &SceneConfig) -> Room {
    let height = (grid.altitude * config.rack_unit_height).max(config.rack_height())
        + config.ceiling_clearance;
    Room {
        x: axis(grid.width, config.cell_width, config.room_width, config),
        z: axis(grid.height, config.cell_depth, config.room_depth, config),
        height,
        wall_texture_repeat: (height / config.texture_size).ceil(),
    }
}

pub fn forbidden_void(room: &Room, margin: f64) -> ForbiddenVoid {
    ForbiddenVoid {
        floor: margin,
        roof: room.height - margin,
        min_x: margin,
        max_x: room.x.size - margin,
        min_z: margin,
        max_z: room.z.size - margin,
    }
}

/// Scratch vectors the scene is assembled into. Reused between builds of one session.
#[derive(Debug, Default)]
pub(crate) struct ScenePools {
    scene: Scene,
}

impl ScenePools {
    pub(crate) fn reset(&mut self) {
        let scene = &mut self.scene;
        scene.room = None;
        scene.forbidden_void = None;
        scene.racks.clear();
        scene.nodes.clear();
        scene.leds.clear();
        scene.cpus.clear();
        scene.forbidden_zones.clear();
    }

    pub(crate) fn release(&mut self) {
        self.scene = Scene::default();
    }

    pub(crate) fn scene(&self) -> &Scene {
        &self.scene
    }
}

struct RackFrame<'a> {
    name: &'a str,
    base: ScenePoint,
    coefficient: f64,
    yaw: f64,
}

impl RackFrame<'_> {
    fn point(&self, right: f64, up: f64, out: f64) -> ScenePoint {
        let base = world_point(self.base.x, self.base.y, self.base.z);
        (base + orient(self.coefficient, world_vector(right, up, out))).into()
    }
}

#[allow(clippy::too_many_arguments)]
fn place_node(
    frame: &RackFrame<'_>,
    node: &RackNode,
    slurm_nodes: Option<&SlurmNodes>,
    allocations: &AllocatedCpus,
    config: &LayoutConfig,
    scene: &mut Scene,
    diag: &mut Diagnostics,
) {
    let cfg = &config.scene;
    let width = node.width * cfg.rack_width;
    let height = node.height * cfg.rack_unit_height;
    let depth = cfg.rack_depth * cfg.node_depth_ratio;
    let left = (node.posx - 0.5) * cfg.rack_width;
    let right_edge = left + width;
    let bottom = node.posy * cfg.rack_unit_height;
    let front = cfg.rack_depth / 2.0;

    let slurm = slurm_nodes.and_then(|nodes| nodes.get(&node.name));
    let colors = match slurm {
        Some(s) => config.colors.resolve_node_colors(s),
        None => NodeColors {
            occupancy: config.colors.occupancy.unknown,
            led: config.colors.led.unknown,
        },
    };

    scene.nodes.push(NodePlacement {
        name: node.name.clone(),
        rack: frame.name.to_string(),
        position: frame.point(left + width / 2.0, bottom + height / 2.0, front - depth / 2.0),
        size: ScenePoint {
            x: width,
            y: height,
            z: depth,
        },
        yaw: frame.yaw,
        colors,
    });

    let face_out = front + cfg.front_offset;
    scene.leds.push(LedPlacement {
        node: node.name.clone(),
        position: frame.point(left + cfg.led_size, bottom + height / 2.0, face_out),
        size: cfg.led_size,
        color: colors.led,
        yaw: frame.yaw,
    });

    let Some(s) = slurm else {
        return;
    };
    let area_left = left + 2.0 * cfg.led_size + cfg.cpu_padding;
    let area_right = right_edge - cfg.cpu_padding;
    let area_bottom = bottom + cfg.cpu_padding;
    let area_width = area_right - area_left;
    let area_height = height - 2.0 * cfg.cpu_padding;
    if area_width <= 0.0 || area_height <= 0.0 {
        return;
    }
    let Some(grid) = best_factor(area_width, area_height, s.cpus, FactorPadding::default()) else {
        return;
    };
    let tile = (area_width / f64::from(grid.cols)).min(area_height / f64::from(grid.rows));
    let node_allocs = allocations.get(&node.name).map_or(&[][..], Vec::as_slice);
    let owners = assign_core_owners(&node.name, s.cpus, node_allocs, diag);
    for (index, owner) in (0u32..).zip(owners) {
        let (col, row) = grid.cell(index);
        let right = area_right - (f64::from(col) + 0.5) * tile;
        let up = area_bottom + (f64::from(row) + 0.5) * tile;
        let color = owner.map_or(config.colors.idle_core, |job| config.colors.job_color(job));
        scene.cpus.entry(color).or_default().push(CpuPlacement {
            node: node.name.clone(),
            index,
            position: frame.point(right, up, face_out),
            size: tile,
            job_id: owner,
            yaw: frame.yaw,
        });
    }
}

pub(crate) fn build_into(
    pools: &mut ScenePools,
    grid: &RoomGrid,
    racks: &RackSet,
    slurm_nodes: Option<&SlurmNodes>,
    allocations: &AllocatedCpus,
    config: &LayoutConfig,
    diag: &mut Diagnostics,
) {
    pools.reset();
    let cfg = &config.scene;
    let scene = &mut pools.scene;

    let room = build_room(grid, cfg);
    let rack_height = (grid.altitude * cfg.rack_unit_height).max(cfg.rack_height());
    let margin = cfg.collision_margin;

    for cell in &grid.placements {
        let Some(rack) = racks
            .ranges
            .get(cell.range_index)
            .and_then(|range| range.racks.get(cell.rack_index))
        else {
            continue;
        };
        let coefficient = temperature_coefficient(cell.range_index);
        let yaw = if coefficient < 0.0 { PI } else { 0.0 };
        let base = ScenePoint {
            x: room.x.grid_offset + (cell.x as f64 + 0.5) * cfg.cell_width,
            y: 0.0,
            z: room.z.grid_offset + (cell.y as f64 + 0.5) * cfg.cell_depth,
        };
        scene.racks.push(RackPlacement {
            name: rack.name.clone(),
            range_index: cell.range_index,
            position: base,
            size: ScenePoint {
                x: cfg.rack_width,
                y: rack_height,
                z: cfg.rack_depth,
            },
            coefficient,
            yaw,
        });
        scene.forbidden_zones.push(
            WorldBox::new(
                world_point(
                    base.x - cfg.rack_width / 2.0 - margin,
                    0.0,
                    base.z - cfg.rack_depth / 2.0 - margin,
                ),
                world_point(
                    base.x + cfg.rack_width / 2.0 + margin,
                    rack_height + margin,
                    base.z + cfg.rack_depth / 2.0 + margin,
                ),
            )
            .into(),
        );

        let frame = RackFrame {
            name: &rack.name,
            base,
            coefficient,
            yaw,
        };
        for node in &rack.nodes {
            place_node(&frame, node, slurm_nodes, allocations, config, scene, diag);
        }
    }

    scene.forbidden_void = Some(forbidden_void(&room, margin));
    scene.room = Some(room);

    tracing::debug!(
        racks = scene.racks.len(),
        nodes = scene.nodes.len(),
        cpus = scene.cpu_count(),
        colors = scene.cpus.len(),
        "scene built"
    );
}

/// Builds a standalone scene without a session.
pub fn build_scene(
    grid: &RoomGrid,
    racks: &RackSet,
    slurm_nodes: Option<&SlurmNodes>,
    allocations: &AllocatedCpus,
    config: &LayoutConfig,
    diag: &mut Diagnostics,
) -> Scene {
    let mut pools = ScenePools::default();
    build_into(&mut pools, grid, racks, slurm_nodes, allocations, config, diag);
    pools.scene
}
