use crate::state::NodeState;
use indexmap::IndexMap;
use serde::Serialize;

/// A node as placed inside a rack.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RackNode {
    pub name: String,
    /// Left edge, as a fraction of the rack inside width.
    pub posx: f64,
    /// Bottom edge, in rack units counted from the rack base.
    pub posy: f64,
    /// Fraction of the rack inside width.
    pub width: f64,
    /// Rack units.
    pub height: f64,
}

impl RackNode {
    /// Highest rack unit touched by the node.
    pub fn top(&self) -> f64 {
        self.posy + self.height
    }

    pub fn overlaps(&self, other: &RackNode) -> bool {
        const EPS: f64 = 1e-9;
        self.posx + EPS < other.posx + other.width
            && other.posx + EPS < self.posx + self.width
            && self.posy + EPS < other.top()
            && other.posy + EPS < self.top()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rack {
    pub name: String,
    /// Column inside the room.
    pub posx: i64,
    pub posy: i64,
    /// Name of the range (row of racks) the rack belongs to.
    pub range: String,
    pub nodes: Vec<RackNode>,
}

impl Rack {
    pub fn altitude(&self) -> f64 {
        self.nodes.iter().map(RackNode::top).fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RackRange {
    pub name: String,
    pub racks: Vec<Rack>,
}

/// Racks normalized into ordered ranges.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RackSet {
    pub ranges: Vec<RackRange>,
}

impl RackSet {
    pub fn racks(&self) -> impl Iterator<Item = &Rack> {
        self.ranges.iter().flat_map(|r| r.racks.iter())
    }

    pub fn rack(&self, name: &str) -> Option<&Rack> {
        self.racks().find(|r| r.name == name)
    }

    pub fn rack_count(&self) -> usize {
        self.ranges.iter().map(|r| r.racks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rack_count() == 0
    }

    /// Maximum `posy + height` over every node of every rack.
    pub fn altitude(&self) -> f64 {
        self.racks().map(Rack::altitude).fold(0.0, f64::max)
    }
}

/// Compute-node state as reported by the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlurmNode {
    pub name: String,
    pub cpus: u32,
    pub state: NodeState,
    pub reason: Option<String>,
    /// Signed; `|total_cpus| == cpus` means every core is allocated.
    pub total_cpus: i64,
}

pub type SlurmNodes = IndexMap<String, SlurmNode>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Running,
    Pending,
    Completing,
    Completed,
    Cancelled,
    Failed,
    Other(String),
}

impl JobState {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "RUNNING" => Self::Running,
            "PENDING" => Self::Pending,
            "COMPLETING" => Self::Completing,
            "COMPLETED" => Self::Completed,
            "CANCELLED" => Self::Cancelled,
            "FAILED" => Self::Failed,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "RUNNING",
            Self::Pending => "PENDING",
            Self::Completing => "COMPLETING",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
            Self::Other(raw) => raw,
        }
    }
}

impl Serialize for JobState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub id: u64,
    pub state: JobState,
    /// Node name -> number of cores.
    pub cpus_allocated: IndexMap<String, u32>,
    /// Node name -> pinned physical core indices, when the scheduler reports them.
    pub layout: IndexMap<String, Vec<u32>>,
}

/// Cores claimed by one job on one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoreAllocation {
    pub job_id: u64,
    pub cores: u32,
    /// Exact core indices; `None` means cores are taken in index order.
    pub layout: Option<Vec<u32>>,
}

/// Node name -> allocations of running jobs, in job order.
pub type AllocatedCpus = IndexMap<String, Vec<CoreAllocation>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Switch {
    pub id: String,
    pub level: u32,
    /// Slurm-nodes directly attached (expanded).
    pub nodes: Vec<String>,
    /// Child switches (expanded).
    pub switches: Vec<String>,
    /// Compact nodeset expression of `nodes`, as reported.
    pub nodeset: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Topology {
    pub switches: IndexMap<String, Switch>,
}

impl Topology {
    /// Switches ordered by ascending level; input order is kept within a level.
    pub fn by_level(&self) -> Vec<&Switch> {
        let mut out: Vec<&Switch> = self.switches.values().collect();
        out.sort_by_key(|s| s.level);
        out
    }

    pub fn max_level(&self) -> Option<u32> {
        self.switches.values().map(|s| s.level).max()
    }
}
