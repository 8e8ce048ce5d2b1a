use rackwright::layout::{Cell, NodeCanvas, RackCanvas};
use rackwright::topology::NodeKind;
use rackwright::{ClusterInput, Engine, Error, LayoutConfig};
use serde_json::json;
use std::path::PathBuf;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn fixture() -> ClusterInput {
    let path = workspace_root()
        .join("fixtures")
        .join("cluster")
        .join("basic.json");
    let text = std::fs::read_to_string(&path).expect("fixture");
    serde_json::from_str(&text).expect("fixture json")
}

fn node<'a>(canvases: &'a [RackCanvas], name: &str) -> &'a NodeCanvas {
    canvases
        .iter()
        .flat_map(|c| c.nodes.iter())
        .find(|n| n.name == name)
        .expect("node on some canvas")
}

#[test]
fn fixture_refreshes_without_warnings() {
    let snapshot = Engine::default().refresh(&fixture()).expect("refresh ok");

    assert!(snapshot.warnings.is_empty(), "{:?}", snapshot.warnings);
    let names: Vec<&str> = snapshot.canvases.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["A01", "A02", "B01"]);
    assert_eq!(snapshot.grid.placements.len(), 3);
    assert_eq!(snapshot.grid.altitude, 5.0);
    assert_eq!(snapshot.scene.racks.len(), 3);
    assert_eq!(snapshot.scene.nodes.len(), 7);
}

#[test]
fn only_running_jobs_color_cores() {
    let config = LayoutConfig::default();
    let snapshot = Engine::new(config.clone()).refresh(&fixture()).expect("refresh ok");

    let idle = node(&snapshot.canvases, "cn001");
    assert_eq!(idle.cores.len(), 32);
    assert!(idle.cores.iter().all(|c| c.job_id.is_none()));
    assert_eq!(idle.colors.occupancy, config.colors.occupancy.idle);

    let pinned = node(&snapshot.canvases, "cn006");
    let owners: Vec<Option<u64>> = pinned.cores.iter().take(5).map(|c| c.job_id).collect();
    assert_eq!(owners, vec![Some(102), Some(102), Some(102), Some(102), None]);

    let full = node(&snapshot.canvases, "cn002");
    assert!(full.cores.iter().all(|c| c.job_id == Some(101)));
    assert_eq!(full.colors.occupancy, config.colors.occupancy.fully_allocated);

    let draining = node(&snapshot.canvases, "cn004");
    assert_eq!(draining.colors.occupancy, config.colors.occupancy.partially_allocated);
    assert_eq!(draining.colors.led, config.colors.led.not_responding);
}

#[test]
fn scene_and_topology_follow_the_fixture() {
    let snapshot = Engine::default().refresh(&fixture()).expect("refresh ok");

    let coefficients: Vec<(&str, f64)> = snapshot
        .scene
        .racks
        .iter()
        .map(|r| (r.name.as_str(), r.coefficient))
        .collect();
    assert_eq!(coefficients, vec![("A01", 1.0), ("A02", 1.0), ("B01", -1.0)]);
    assert_eq!(
        snapshot.scene.cpu_count(),
        32 + 32 + 16 + 16 + 64 + 32 + 48
    );

    let graph = snapshot.topology.expect("topology supplied");
    graph.validate().expect("no dangling links");
    assert_eq!(graph.count(NodeKind::Switch), 3);
    assert_eq!(graph.count(NodeKind::Nodeset), 2);
    assert_eq!(graph.count(NodeKind::Node), 7);
    assert!(graph.nodes.iter().any(|n| n.x != 0.0 || n.y != 0.0));
}

#[test]
fn snapshot_serializes_cells_and_colors() {
    let snapshot = Engine::default().refresh(&fixture()).expect("refresh ok");
    let value = serde_json::to_value(&snapshot).expect("serialize");

    let data = value["grid"]["data"].as_array().expect("cells");
    assert!(data.iter().any(|c| c == "A01"));
    assert_eq!(data[0], json!(1));
    assert!(value["scene"]["cpus"].as_object().is_some_and(|m| !m.is_empty()));
    assert_eq!(value["topology"]["nodes"][0]["kind"], json!("switch"));
}

#[test]
fn overrides_change_the_floor_plan() {
    let narrow = Engine::from_overrides(&json!({"room": {"path_width": 0}})).expect("config");
    let default = Engine::default();
    let input = fixture();

    let a = narrow.refresh(&input).expect("refresh ok");
    let b = default.refresh(&input).expect("refresh ok");
    assert_eq!(a.grid.width + 4, b.grid.width);
    assert!(a.grid.data.iter().filter(|c| **c == Cell::Empty).count() < b.grid.data.len());
}

#[test]
fn missing_sections_produce_empty_projections() {
    let snapshot = Engine::default()
        .refresh(&ClusterInput::default())
        .expect("refresh ok");
    assert!(snapshot.canvases.is_empty());
    assert!(snapshot.topology.is_none());
    assert!(snapshot.scene.racks.is_empty());
    assert!(snapshot.warnings.is_empty());
}

#[test]
fn errors_are_wrapped_by_layer() {
    let engine = Engine::default();
    let bad: ClusterInput = serde_json::from_value(json!({"racks": [1, 2]})).expect("input");
    assert!(matches!(engine.refresh(&bad), Err(Error::Core(_))));

    let data = engine.ingest(&fixture()).expect("ingest ok");
    let mut diag = rackwright::Diagnostics::new();
    assert!(engine.canvas(&data, "A02", &mut diag).is_ok());
    assert!(matches!(
        engine.canvas(&data, "Z99", &mut diag),
        Err(Error::Layout(_))
    ));

    let bad_config = Engine::from_overrides(&json!({"colors": {"jobs": ["#000000"]}}));
    assert!(matches!(bad_config, Err(Error::Core(_))));
}

#[test]
fn extreme_switch_levels_refresh() {
    let input: ClusterInput = serde_json::from_value(json!({
        "topology": {
            "core": {"level": 4294967295u64, "switches": []},
            "leaf": {"level": 0, "nodes": []}
        }
    }))
    .expect("input");
    let snapshot = Engine::default().refresh(&input).expect("refresh ok");
    let graph = snapshot.topology.expect("topology");
    let core = graph.find(NodeKind::Switch, "core").expect("core");
    assert_eq!(graph.nodes[core].group, u32::MAX);
    assert!(graph.nodes.iter().all(|n| n.x.is_finite() && n.y.is_finite()));
}

#[test]
fn flat_racks_may_omit_positions() {
    let input: ClusterInput = serde_json::from_value(json!({
        "racks": {
            "R1": {"range": "A"},
            "R2": {"range": "A", "posx": 1, "nodes": {}}
        }
    }))
    .expect("input");
    let snapshot = Engine::default().refresh(&input).expect("refresh ok");
    let names: Vec<&str> = snapshot.canvases.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["R1", "R2"]);
    assert_eq!(snapshot.grid.placements.len(), 2);
}
