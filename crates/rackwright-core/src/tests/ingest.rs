use crate::ingest::{allocated_cpus, decode_jobs, decode_nodes, decode_topology, normalize_racks};
use crate::*;
use serde_json::json;

#[test]
fn nested_racks_keep_range_order_and_sort_by_column() {
    let mut diag = Diagnostics::new();
    let racks = normalize_racks(
        &json!({
            "R1": {
                "A02": { "posx": 1, "posy": 0, "nodes": {} },
                "A01": { "posx": 0, "posy": 0, "nodes": {} }
            },
            "R0": {
                "B01": { "posx": 0, "posy": 1, "nodes": {} }
            }
        }),
        &mut diag,
    )
    .unwrap();

    let names: Vec<_> = racks.ranges.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["R1", "R0"]);
    let first: Vec<_> = racks.ranges[0].racks.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(first, ["A01", "A02"]);
    assert_eq!(racks.ranges[1].racks[0].range, "R0");
    assert!(diag.is_empty());
}

#[test]
fn flat_racks_group_by_range_field_or_posy() {
    let mut diag = Diagnostics::new();
    let racks = normalize_racks(
        &json!({
            "C01": { "posx": 0, "posy": 3, "nodes": [] },
            "A01": { "posx": 0, "posy": 1, "nodes": [] },
            "A02": { "posx": 1, "posy": 1, "nodes": [] },
            "X01": { "posx": 0, "posy": 9, "range": "lab", "nodes": [] }
        }),
        &mut diag,
    )
    .unwrap();

    let names: Vec<_> = racks.ranges.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["1", "3", "lab"]);
    assert_eq!(racks.ranges[0].racks.len(), 2);
    assert_eq!(racks.rack_count(), 4);
}

#[test]
fn flat_racks_without_position_keys_stay_flat() {
    let mut diag = Diagnostics::new();
    let racks = normalize_racks(
        &json!({
            "R1": { "range": "A" },
            "R2": { "range": "A", "posx": 1, "nodes": {} }
        }),
        &mut diag,
    )
    .unwrap();

    assert_eq!(racks.ranges.len(), 1);
    assert_eq!(racks.ranges[0].name, "A");
    let names: Vec<_> = racks.ranges[0].racks.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["R1", "R2"]);
    assert!(racks.rack("R1").unwrap().nodes.is_empty());

    // a range of bare racks is still nested
    let racks = normalize_racks(&json!({ "R0": { "A01": {}, "A02": { "posx": 1 } } }), &mut diag)
        .unwrap();
    assert_eq!(racks.ranges.len(), 1);
    assert_eq!(racks.ranges[0].name, "R0");
    assert_eq!(racks.rack_count(), 2);
    assert!(diag.is_empty());
}

#[test]
fn rack_nodes_accept_maps_lists_and_numeric_strings() {
    let mut diag = Diagnostics::new();
    let racks = normalize_racks(
        &json!({
            "R0": {
                "A01": {
                    "posx": 0, "posy": 0,
                    "nodes": {
                        "cn001": { "posx": "0", "posy": "2", "width": "0.5", "height": 1 },
                        "cn002": { "posx": 0.5, "posy": 2, "width": 0.5, "height": 2 }
                    }
                },
                "A02": {
                    "posx": 1, "posy": 0,
                    "nodes": [ { "name": "cn010", "posx": 0, "posy": 10, "width": 1, "height": 4 } ]
                }
            }
        }),
        &mut diag,
    )
    .unwrap();

    let a01 = racks.rack("A01").unwrap();
    assert_eq!(a01.nodes.len(), 2);
    assert_eq!(a01.nodes[0].posy, 2.0);
    assert_eq!(a01.nodes[0].width, 0.5);
    assert_eq!(racks.altitude(), 14.0);
    assert!(diag.is_empty());
}

#[test]
fn overlapping_and_degenerate_nodes_are_reported() {
    let mut diag = Diagnostics::new();
    let racks = normalize_racks(
        &json!({
            "A01": {
                "posx": 0, "posy": 0,
                "nodes": {
                    "cn001": { "posx": 0, "posy": 0, "width": 1, "height": 2 },
                    "cn002": { "posx": 0, "posy": 1, "width": 1, "height": 2 },
                    "cn003": { "posx": 0, "posy": 4, "width": 0, "height": 2 }
                }
            }
        }),
        &mut diag,
    )
    .unwrap();

    assert_eq!(racks.rack("A01").unwrap().nodes.len(), 2);
    assert_eq!(diag.count(WarningKind::OverlappingNodes), 1);
    assert_eq!(diag.count(WarningKind::Ignored), 1);
}

#[test]
fn non_object_racks_are_invalid_input() {
    let mut diag = Diagnostics::new();
    let err = normalize_racks(&json!(["A01"]), &mut diag).unwrap_err();
    assert!(matches!(err, Error::InvalidInput { what: "racks", .. }));

    let err = normalize_racks(&json!({ "R0": 3 }), &mut diag).unwrap_err();
    assert!(matches!(err, Error::InvalidInput { what: "racks", .. }));
}

#[test]
fn nodes_decode_states_and_report_unknown_ones() {
    let mut diag = Diagnostics::new();
    let nodes = decode_nodes(
        &json!({
            "cn001": { "cpus": 32, "state": "ALLOCATED", "total_cpus": -32 },
            "cn002": { "cpus": 32, "node_state": "DRAINED*", "reason": "disk" },
            "cn003": { "cpus": "16", "state": ["IDLE", "DRAIN"] },
            "cn004": { "cpus": 8, "state": "POWERING_UP" }
        }),
        &mut diag,
    )
    .unwrap();

    assert_eq!(nodes["cn001"].state, NodeState::new(StateKind::Allocated, false));
    assert_eq!(nodes["cn001"].total_cpus, -32);
    assert_eq!(nodes["cn002"].state, NodeState::new(StateKind::Drained, true));
    assert_eq!(nodes["cn002"].reason.as_deref(), Some("disk"));
    assert_eq!(nodes["cn003"].cpus, 16);
    assert_eq!(nodes["cn003"].state, NodeState::new(StateKind::Drained, false));
    assert!(nodes["cn004"].state.is_unknown());
    assert_eq!(diag.count(WarningKind::UnknownState), 1);
}

#[test]
fn only_running_jobs_contribute_allocations() {
    let mut diag = Diagnostics::new();
    let jobs = decode_jobs(
        &json!({
            "7": { "job_state": "COMPLETED", "cpus_allocated": { "nodeA": 4 } },
            "8": { "job_state": "RUNNING", "cpus_allocated": { "nodeB": 2 } }
        }),
        &mut diag,
    )
    .unwrap();
    let allocations = allocated_cpus(&jobs, None, &mut diag);

    assert!(!allocations.contains_key("nodeA"));
    assert_eq!(
        allocations["nodeB"],
        vec![CoreAllocation {
            job_id: 8,
            cores: 2,
            layout: None
        }]
    );
}

#[test]
fn allocations_keep_pinned_layouts_and_report_missing_nodes() {
    let mut diag = Diagnostics::new();
    let nodes = decode_nodes(
        &json!({ "cn001": { "cpus": 4, "state": "ALLOCATED", "total_cpus": -4 } }),
        &mut diag,
    )
    .unwrap();
    let jobs = decode_jobs(
        &json!({
            "11": {
                "job_state": "RUNNING",
                "cpus_allocated": { "cn001": 2, "ghost": 4 },
                "layout": { "cn001": [1, 3] }
            },
            "12": { "job_state": "running", "cpus_allocated": { "cn001": "3" } }
        }),
        &mut diag,
    )
    .unwrap();
    let allocations = allocated_cpus(&jobs, Some(&nodes), &mut diag);

    let on_cn001 = &allocations["cn001"];
    assert_eq!(on_cn001.len(), 2);
    assert_eq!(on_cn001[0].layout.as_deref(), Some(&[1, 3][..]));
    assert_eq!(on_cn001[1].cores, 3);
    assert!(!allocations.contains_key("ghost"));
    assert_eq!(diag.count(WarningKind::MissingNode), 1);
    assert_eq!(diag.count(WarningKind::OverAllocated), 1);
}

#[test]
fn jobs_with_unusable_ids_are_skipped() {
    let mut diag = Diagnostics::new();
    let jobs = decode_jobs(
        &json!({
            "abc": { "job_state": "RUNNING" },
            "x": { "job_id": 42, "job_state": "RUNNING" }
        }),
        &mut diag,
    )
    .unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, 42);
    assert_eq!(diag.count(WarningKind::Ignored), 1);
}

#[test]
fn topology_expands_nodesets_and_switch_lists() {
    let topology = decode_topology(&json!({
        "sw0": { "level": 0, "nodes": "cn[001-004]" },
        "sw1": { "level": 0, "nodes": ["cn[005-006]", "gpu1"] },
        "core": { "level": 1, "switches": "sw[0-1]" }
    }))
    .unwrap();

    assert_eq!(
        topology.switches["sw0"].nodes,
        ["cn001", "cn002", "cn003", "cn004"]
    );
    assert_eq!(topology.switches["sw0"].nodeset.as_deref(), Some("cn[001-004]"));
    assert_eq!(topology.switches["sw1"].nodes, ["cn005", "cn006", "gpu1"]);
    assert_eq!(topology.switches["core"].switches, ["sw0", "sw1"]);
    assert_eq!(topology.max_level(), Some(1));
    let levels: Vec<_> = topology.by_level().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(levels, ["sw0", "sw1", "core"]);
}

#[test]
fn malformed_topology_ranges_fail_with_a_labeled_error() {
    let err = decode_topology(&json!({ "sw0": { "level": 0, "nodes": "cn[001-" } })).unwrap_err();
    assert!(matches!(err, Error::NodesetSyntax { ref input, .. } if input == "cn[001-"));
    assert!(err.to_string().contains("cn[001-"));
}

#[test]
fn ingest_cross_checks_rack_nodes() {
    let input: ClusterInput = serde_json::from_value(json!({
        "racks": { "R0": { "A01": { "posx": 0, "posy": 0, "nodes": {
            "cn001": { "posx": 0, "posy": 0, "width": 1, "height": 1 },
            "cn002": { "posx": 0, "posy": 1, "width": 1, "height": 1 }
        } } } },
        "nodes": { "cn001": { "cpus": 4, "state": "IDLE" } }
    }))
    .unwrap();
    let data = ingest(&input).unwrap();

    assert!(data.has_nodes);
    assert_eq!(data.diagnostics.count(WarningKind::MissingNode), 1);
    assert!(data.topology.is_none());
    assert!(data.allocations.is_empty());
}
