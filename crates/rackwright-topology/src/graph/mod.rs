use crate::error::{Error, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A compute node.
    Node,
    /// The node group hanging off a leaf switch.
    Nodeset,
    Switch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub name: String,
    pub kind: NodeKind,
    /// Rendering group: compute node `1`, nodeset `2`, switch at level `L` is `L + 3` (saturating).
    pub group: u32,
    /// Switch level; `None` for nodes and nodesets.
    pub level: Option<u32>,
    pub radius: f64,
    /// Seed position, centered on the origin.
    pub x: f64,
    pub y: f64,
}

impl GraphNode {
    pub fn new(name: impl Into<String>, kind: NodeKind, level: Option<u32>, radius: f64) -> Self {
        let group = match kind {
            NodeKind::Node => 1,
            NodeKind::Nodeset => 2,
            NodeKind::Switch => level.unwrap_or(0).saturating_add(3),
        };
        Self {
            name: name.into(),
            kind,
            group,
            level,
            radius,
            x: 0.0,
            y: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkClass {
    SwitchSwitch,
    SwitchNodeset,
    NodesetNode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphLink {
    /// Index of the upper end (parent switch or nodeset).
    pub source: usize,
    pub target: usize,
    pub weight: f64,
    pub class: LinkClass,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopologyGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl TopologyGraph {
    pub fn add_node(&mut self, node: GraphNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn add_link(&mut self, source: usize, target: usize, weight: f64, class: LinkClass) {
        self.links.push(GraphLink {
            source,
            target,
            weight,
            class,
        });
    }

    pub fn find(&self, kind: NodeKind, name: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.kind == kind && n.name == name)
    }

    pub fn count(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind == kind).count()
    }

    /// Links leaving node `source`.
    pub fn links_from(&self, source: usize) -> impl Iterator<Item = &GraphLink> {
        self.links.iter().filter(move |l| l.source == source)
    }

    pub fn validate(&self) -> Result<()> {
        let len = self.nodes.len();
        for (link, l) in self.links.iter().enumerate() {
            for index in [l.source, l.target] {
                if index >= len {
                    return Err(Error::DanglingLink { link, index, len });
                }
            }
        }
        Ok(())
    }
}
