use crate::graph::{NodeKind, TopologyGraph};
use rackwright_core::TopologyConfig;
use std::f64::consts::TAU;

/// Ring a node starts on: the top switch level sits in the middle, compute nodes outermost.
/// `levels` holds the distinct switch levels, highest first, so sparse levels share no gaps.
fn tier(kind: NodeKind, level: Option<u32>, levels: &[u32]) -> usize {
    let switch_tiers = levels.len().max(1);
    match kind {
        NodeKind::Switch => {
            let level = level.unwrap_or(0);
            levels
                .iter()
                .position(|&l| l == level)
                .unwrap_or(switch_tiers - 1)
        }
        NodeKind::Nodeset => switch_tiers,
        NodeKind::Node => switch_tiers + 1,
    }
}

/// Places every node on concentric rings, one ring per tier, spread evenly in graph order.
/// Deterministic, so a force layout started from it is reproducible.
pub fn seed_positions(graph: &mut TopologyGraph, config: &TopologyConfig) {
    let mut levels: Vec<u32> = graph
        .nodes
        .iter()
        .filter(|n| n.kind == NodeKind::Switch)
        .map(|n| n.level.unwrap_or(0))
        .collect();
    levels.sort_unstable_by(|a, b| b.cmp(a));
    levels.dedup();

    let tiers: Vec<usize> = graph
        .nodes
        .iter()
        .map(|n| tier(n.kind, n.level, &levels))
        .collect();

    let mut per_tier = vec![0usize; levels.len().max(1) + 2];
    for &t in &tiers {
        per_tier[t] += 1;
    }

    let mut placed = vec![0usize; per_tier.len()];
    for (node, &t) in graph.nodes.iter_mut().zip(&tiers) {
        let count = per_tier[t];
        let radius = if t == 0 && count > 1 {
            config.ring_spacing / 2.0
        } else {
            t as f64 * config.ring_spacing
        };
        let angle = TAU * placed[t] as f64 / count as f64;
        node.x = radius * angle.cos();
        node.y = radius * angle.sin();
        placed[t] += 1;
    }
}
