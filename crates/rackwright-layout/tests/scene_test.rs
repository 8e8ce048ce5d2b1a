use rackwright_core::{
    AllocatedCpus, CoreAllocation, Diagnostics, LayoutConfig, NodeState, Rack, RackNode,
    RackRange, RackSet, SlurmNode, SlurmNodes,
};
use rackwright_layout::model::{ScenePoint, Tiling};
use rackwright_layout::{FrameLoopState, SceneSession, build_scene, racks_to_grid};
use std::f64::consts::PI;

fn two_ranges() -> RackSet {
    let rack = |name: &str, range: &str, node: &str| Rack {
        name: name.to_string(),
        posx: 0,
        posy: 0,
        range: range.to_string(),
        nodes: vec![RackNode {
            name: node.to_string(),
            posx: 0.0,
            posy: 0.0,
            width: 1.0,
            height: 1.0,
        }],
    };
    RackSet {
        ranges: vec![
            RackRange {
                name: "R0".to_string(),
                racks: vec![rack("A", "R0", "cn001")],
            },
            RackRange {
                name: "R1".to_string(),
                racks: vec![rack("B", "R1", "cn002")],
            },
        ],
    }
}

fn scheduler() -> (SlurmNodes, AllocatedCpus) {
    let node = |name: &str, cpus: u32, state: &str, total_cpus: i64| SlurmNode {
        name: name.to_string(),
        cpus,
        state: NodeState::parse(state),
        reason: None,
        total_cpus,
    };
    let nodes: SlurmNodes = [node("cn001", 4, "IDLE", 0), node("cn002", 2, "ALLOCATED", -2)]
        .into_iter()
        .map(|n| (n.name.clone(), n))
        .collect();
    let mut allocations = AllocatedCpus::new();
    allocations.insert(
        "cn002".to_string(),
        vec![CoreAllocation {
            job_id: 9,
            cores: 2,
            layout: None,
        }],
    );
    (nodes, allocations)
}

#[test]
fn racks_alternate_orientation() {
    let config = LayoutConfig::default();
    let racks = two_ranges();
    let (nodes, allocations) = scheduler();
    let mut diag = Diagnostics::new();
    let grid = racks_to_grid(&racks, &config.room, &mut diag);
    let scene = build_scene(&grid, &racks, Some(&nodes), &allocations, &config, &mut diag);

    assert_eq!(scene.racks.len(), 2);
    let a = &scene.racks[0];
    let b = &scene.racks[1];
    assert_eq!((a.coefficient, a.yaw), (1.0, 0.0));
    assert_eq!((b.coefficient, b.yaw), (-1.0, PI));
    assert!(b.position.z > a.position.z);
    assert_eq!(a.position.y, 0.0);

    let led_a = scene.leds.iter().find(|l| l.node == "cn001").expect("led");
    let led_b = scene.leds.iter().find(|l| l.node == "cn002").expect("led");
    assert!(led_a.position.z < a.position.z);
    assert!(led_b.position.z > b.position.z);
    assert!(led_a.position.x > a.position.x);
    assert!(led_b.position.x < b.position.x);
}

#[test]
fn racks_sharing_a_name_across_ranges_keep_their_own_nodes() {
    let config = LayoutConfig::default();
    let mut racks = two_ranges();
    racks.ranges[1].racks[0].name = "A".to_string();
    let (nodes, allocations) = scheduler();
    let mut diag = Diagnostics::new();
    let grid = racks_to_grid(&racks, &config.room, &mut diag);
    let scene = build_scene(&grid, &racks, Some(&nodes), &allocations, &config, &mut diag);

    assert_eq!(scene.racks.len(), 2);
    let mut placed: Vec<&str> = scene.nodes.iter().map(|n| n.name.as_str()).collect();
    placed.sort_unstable();
    assert_eq!(placed, ["cn001", "cn002"]);
    let cn002 = scene.nodes.iter().find(|n| n.name == "cn002").expect("cn002");
    assert!(cn002.position.z > scene.racks[0].position.z);
}

#[test]
fn cpu_blocks_are_grouped_by_color() {
    let config = LayoutConfig::default();
    let racks = two_ranges();
    let (nodes, allocations) = scheduler();
    let mut diag = Diagnostics::new();
    let grid = racks_to_grid(&racks, &config.room, &mut diag);
    let scene = build_scene(&grid, &racks, Some(&nodes), &allocations, &config, &mut diag);

    assert_eq!(scene.cpu_count(), 6);
    assert_eq!(scene.cpus.len(), 2);
    assert_eq!(scene.cpus[&config.colors.idle_core].len(), 4);
    let busy = &scene.cpus[&config.colors.job_color(9)];
    assert_eq!(busy.len(), 2);
    assert!(busy.iter().all(|c| c.node == "cn002" && c.job_id == Some(9)));
    assert!(busy.iter().all(|c| c.size > 0.0));
}

#[test]
fn room_footprint_and_tiling() {
    let mut config = LayoutConfig::default();
    let racks = two_ranges();
    let grid = racks_to_grid(&racks, &config.room, &mut Diagnostics::new());
    let scene = build_scene(
        &grid,
        &racks,
        None,
        &AllocatedCpus::new(),
        &config,
        &mut Diagnostics::new(),
    );
    let room = scene.room.expect("room");
    assert_eq!(room.x.tiling, Tiling::Units);
    assert_eq!(room.x.texture_repeat, grid.width as f64);
    assert!((room.x.size - grid.width as f64 * config.scene.cell_width).abs() < 1e-9);
    assert!(room.height >= config.scene.rack_height() + config.scene.ceiling_clearance - 1e-9);

    config.scene.room_width = Some(10.0);
    config.scene.room_depth = Some(1.0);
    let scene = build_scene(
        &grid,
        &racks,
        None,
        &AllocatedCpus::new(),
        &config,
        &mut Diagnostics::new(),
    );
    let room = scene.room.expect("room");
    assert_eq!(room.x.tiling, Tiling::Declared);
    assert_eq!(room.x.size, 10.0);
    assert_eq!(room.x.texture_repeat, 10.0);
    assert!(room.x.grid_offset > 0.0);
    assert_eq!(room.z.tiling, Tiling::Units);
    assert!(scene.cpus.is_empty());
}

#[test]
fn camera_is_kept_out_of_racks_and_walls() {
    let config = LayoutConfig::default();
    let racks = two_ranges();
    let grid = racks_to_grid(&racks, &config.room, &mut Diagnostics::new());
    let scene = build_scene(
        &grid,
        &racks,
        None,
        &AllocatedCpus::new(),
        &config,
        &mut Diagnostics::new(),
    );

    assert_eq!(scene.forbidden_zones.len(), 2);
    let rack = scene.racks[0].position;
    assert!(!scene.camera_allowed(ScenePoint { y: 1.0, ..rack }));

    let aisle = ScenePoint {
        x: 1.5 * config.scene.cell_width,
        y: 1.5,
        z: 1.5 * config.scene.cell_depth,
    };
    assert!(scene.camera_allowed(aisle));
    assert!(!scene.camera_allowed(ScenePoint { y: 0.0, ..aisle }));
    assert!(!scene.camera_allowed(ScenePoint { x: 0.0, ..aisle }));
}

#[test]
fn session_lifecycle() {
    let config = LayoutConfig::default();
    let racks = two_ranges();
    let (nodes, allocations) = scheduler();
    let mut diag = Diagnostics::new();
    let grid = racks_to_grid(&racks, &config.room, &mut diag);

    let mut session = SceneSession::new();
    session.clean();
    session.cancel();
    assert!(!session.start());
    assert!(session.scene().is_none());

    let built = session.build(&grid, &racks, Some(&nodes), &allocations, &config, &mut diag);
    assert_eq!(built.racks.len(), 2);
    assert!(session.start());
    assert!(!session.start());

    let mut seen = Vec::new();
    for _ in 0..3 {
        assert!(session.tick(|scene, frame| seen.push((frame, scene.nodes.len()))));
    }
    assert_eq!(seen, vec![(0, 2), (1, 2), (2, 2)]);

    session.cancel();
    session.cancel();
    assert_eq!(session.frame_loop().state(), FrameLoopState::Cancelled);
    assert!(!session.tick(|_, _| panic!("cancelled loop must not render")));

    let rebuilt = session.build(&grid, &racks, None, &allocations, &config, &mut diag);
    assert_eq!(rebuilt.racks.len(), 2);
    assert!(rebuilt.cpus.is_empty());

    session.clean();
    session.clean();
    assert!(!session.is_built());
    assert!(session.scene().is_none());
    assert!(!session.start());
}
