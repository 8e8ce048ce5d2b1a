use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rackwright_core::{
    AllocatedCpus, CoreAllocation, Diagnostics, LayoutConfig, NodeState, Rack, RackNode,
    RackRange, RackSet, SlurmNode, SlurmNodes,
};
use rackwright_layout::{SceneSession, racks_to_grid};
use std::hint::black_box;
use std::time::Duration;

/// `ranges` ranges of `racks` racks, each rack holding 42 single-unit nodes of 64 cores.
fn room(ranges: usize, racks: usize) -> (RackSet, SlurmNodes, AllocatedCpus) {
    let mut set = RackSet::default();
    let mut nodes = SlurmNodes::new();
    let mut allocations = AllocatedCpus::new();
    for r in 0..ranges {
        let mut range = RackRange {
            name: format!("R{r}"),
            racks: Vec::with_capacity(racks),
        };
        for c in 0..racks {
            let rack_name = format!("R{r}C{c:02}");
            let mut rack = Rack {
                name: rack_name.clone(),
                posx: c as i64,
                posy: r as i64,
                range: range.name.clone(),
                nodes: Vec::with_capacity(42),
            };
            for u in 0..42 {
                let name = format!("{rack_name}n{u:02}");
                rack.nodes.push(RackNode {
                    name: name.clone(),
                    posx: 0.0,
                    posy: u as f64,
                    width: 1.0,
                    height: 1.0,
                });
                nodes.insert(
                    name.clone(),
                    SlurmNode {
                        name: name.clone(),
                        cpus: 64,
                        state: NodeState::parse("ALLOCATED"),
                        reason: None,
                        total_cpus: -32,
                    },
                );
                allocations.insert(
                    name,
                    vec![CoreAllocation {
                        job_id: (r * racks + c) as u64,
                        cores: 32,
                        layout: None,
                    }],
                );
            }
            range.racks.push(rack);
        }
        set.ranges.push(range);
    }
    (set, nodes, allocations)
}

fn bench_scene_build(c: &mut Criterion) {
    let config = LayoutConfig::default();
    let mut group = c.benchmark_group("scene_build");
    group.measurement_time(Duration::from_secs(5));

    for (ranges, racks) in [(2, 8), (6, 20)] {
        let (set, nodes, allocations) = room(ranges, racks);
        let grid = racks_to_grid(&set, &config.room, &mut Diagnostics::new());
        let mut session = SceneSession::new();
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{ranges}x{racks}")),
            &(ranges, racks),
            |b, _| {
                b.iter(|| {
                    let mut diag = Diagnostics::new();
                    let scene = session.build(
                        black_box(&grid),
                        &set,
                        Some(&nodes),
                        &allocations,
                        &config,
                        &mut diag,
                    );
                    black_box(scene.cpu_count());
                })
            },
        );
        session.clean();
    }
    group.finish();
}

criterion_group!(benches, bench_scene_build);
criterion_main!(benches);
