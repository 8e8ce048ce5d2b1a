use crate::graph::{GraphNode, LinkClass, NodeKind, TopologyGraph};
use rackwright_core::nodeset;
use rackwright_core::{Diagnostics, SlurmNodes, Topology, TopologyConfig, WarningKind};
use rustc_hash::FxHashMap;

/// Flattens a switch hierarchy into a layered graph.
///
/// Switches are visited by ascending level, so a parent only ever links to switches that already
/// have an index. Leaf (level 0) switches get a nodeset node linking to their compute nodes; a
/// compute node attached to several leaves keeps a single graph node. When `slurm_nodes` is given,
/// members it does not know are left out.
pub fn build_topology_graph(
    topology: &Topology,
    slurm_nodes: Option<&SlurmNodes>,
    config: &TopologyConfig,
    diag: &mut Diagnostics,
) -> TopologyGraph {
    let mut graph = TopologyGraph::default();
    let mut switch_index: FxHashMap<&str, (usize, u32)> = FxHashMap::default();
    let mut node_index: FxHashMap<&str, usize> = FxHashMap::default();

    for switch in topology.by_level() {
        let radius = config.switch_radius + f64::from(switch.level) * config.switch_radius_step;
        let sw = graph.add_node(GraphNode::new(
            switch.id.clone(),
            NodeKind::Switch,
            Some(switch.level),
            radius,
        ));

        if switch.level == 0 {
            if !switch.nodes.is_empty() {
                let name = switch
                    .nodeset
                    .clone()
                    .unwrap_or_else(|| nodeset::fold(switch.nodes.iter().map(String::as_str)));
                let ns = graph.add_node(GraphNode::new(
                    name,
                    NodeKind::Nodeset,
                    None,
                    config.nodeset_radius,
                ));
                graph.add_link(sw, ns, config.nodeset_link_weight, LinkClass::SwitchNodeset);

                for member in &switch.nodes {
                    if slurm_nodes.is_some_and(|known| !known.contains_key(member)) {
                        diag.warn(
                            WarningKind::MissingNode,
                            member.clone(),
                            format!("switch {} lists a node the scheduler does not report", switch.id),
                        );
                        continue;
                    }
                    let idx = *node_index.entry(member.as_str()).or_insert_with(|| {
                        graph.add_node(GraphNode::new(
                            member.clone(),
                            NodeKind::Node,
                            None,
                            config.node_radius,
                        ))
                    });
                    graph.add_link(ns, idx, config.member_link_weight, LinkClass::NodesetNode);
                }
            }
        } else if !switch.nodes.is_empty() {
            diag.warn(
                WarningKind::Ignored,
                switch.id.clone(),
                format!(
                    "level {} switch lists {} nodes; only leaf switches hold nodes",
                    switch.level,
                    switch.nodes.len()
                ),
            );
        }

        for child in &switch.switches {
            match switch_index.get(child.as_str()) {
                Some(&(idx, level)) if level < switch.level => {
                    graph.add_link(sw, idx, config.switch_link_weight, LinkClass::SwitchSwitch);
                }
                _ => diag.warn(
                    WarningKind::MissingSwitch,
                    child.clone(),
                    format!(
                        "switch {} references a switch that is not defined below level {}",
                        switch.id, switch.level
                    ),
                ),
            }
        }

        switch_index.insert(switch.id.as_str(), (sw, switch.level));
    }

    tracing::debug!(
        switches = switch_index.len(),
        nodes = node_index.len(),
        links = graph.links.len(),
        "topology graph built"
    );
    graph
}
