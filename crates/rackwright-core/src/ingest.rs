//! Normalization of raw REST payloads into the typed model.
//!
//! Structural problems (a rack that is not an object, malformed nodeset syntax) are errors.
//! Inconsistent cross-references are recorded in [`Diagnostics`] and ingestion continues.

use crate::diagnostics::{Diagnostics, WarningKind};
use crate::error::{Error, Result};
use crate::model::{
    AllocatedCpus, CoreAllocation, Job, JobState, Rack, RackNode, RackRange, RackSet, SlurmNode,
    SlurmNodes, Switch, Topology,
};
use crate::nodeset;
use crate::state::NodeState;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Raw dashboard inputs, each optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClusterInput {
    #[serde(default)]
    pub racks: Option<Value>,
    #[serde(default)]
    pub nodes: Option<Value>,
    #[serde(default)]
    pub jobs: Option<Value>,
    #[serde(default)]
    pub topology: Option<Value>,
}

/// Everything one refresh needs, decoded.
#[derive(Debug, Clone, Default)]
pub struct ClusterData {
    pub racks: RackSet,
    pub nodes: SlurmNodes,
    /// `false` when the nodes response was absent; cross-reference checks are skipped then.
    pub has_nodes: bool,
    pub jobs: Vec<Job>,
    pub allocations: AllocatedCpus,
    pub topology: Option<Topology>,
    pub diagnostics: Diagnostics,
}

impl ClusterData {
    pub fn known_nodes(&self) -> Option<&SlurmNodes> {
        self.has_nodes.then_some(&self.nodes)
    }
}

pub fn ingest(input: &ClusterInput) -> Result<ClusterData> {
    let mut diag = Diagnostics::new();

    let racks = match &input.racks {
        Some(v) if !v.is_null() => normalize_racks(v, &mut diag)?,
        _ => RackSet::default(),
    };
    let (nodes, has_nodes) = match &input.nodes {
        Some(v) if !v.is_null() => (decode_nodes(v, &mut diag)?, true),
        _ => (SlurmNodes::new(), false),
    };
    let jobs = match &input.jobs {
        Some(v) if !v.is_null() => decode_jobs(v, &mut diag)?,
        _ => Vec::new(),
    };
    let topology = match &input.topology {
        Some(v) if !v.is_null() => Some(decode_topology(v)?),
        _ => None,
    };

    let known = has_nodes.then_some(&nodes);
    if let Some(known) = known {
        for rack in racks.racks() {
            for node in &rack.nodes {
                if !known.contains_key(&node.name) {
                    diag.warn(
                        WarningKind::MissingNode,
                        &node.name,
                        format!("node of rack `{}` is absent from the nodes response", rack.name),
                    );
                }
            }
        }
    }
    let allocations = allocated_cpus(&jobs, known, &mut diag);

    tracing::debug!(
        racks = racks.rack_count(),
        ranges = racks.ranges.len(),
        nodes = nodes.len(),
        jobs = jobs.len(),
        warnings = diag.len(),
        "ingested cluster data"
    );

    Ok(ClusterData {
        racks,
        nodes,
        has_nodes,
        jobs,
        allocations,
        topology,
        diagnostics: diag,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Int(i64),
    Float(f64),
    Text(String),
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f64, D::Error> {
    match Lenient::deserialize(d)? {
        Lenient::Int(v) => Ok(v as f64),
        Lenient::Float(v) => Ok(v),
        Lenient::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("expected a number, got `{s}`"))),
    }
}

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<i64, D::Error> {
    let v = lenient_f64(d)?;
    if v.fract() != 0.0 || !v.is_finite() {
        return Err(serde::de::Error::custom(format!("expected an integer, got {v}")));
    }
    Ok(v as i64)
}

fn lenient_u32<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<u32, D::Error> {
    let v = lenient_i64(d)?;
    u32::try_from(v).map_err(|_| serde::de::Error::custom(format!("{v} is out of range")))
}

fn one() -> f64 {
    1.0
}

#[derive(Deserialize)]
struct RawRackNode {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    posx: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    posy: f64,
    #[serde(default = "one", deserialize_with = "lenient_f64")]
    width: f64,
    #[serde(default = "one", deserialize_with = "lenient_f64")]
    height: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRackNodes {
    Map(IndexMap<String, RawRackNode>),
    List(Vec<RawRackNode>),
}

impl Default for RawRackNodes {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

#[derive(Deserialize)]
struct RawRack {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    posx: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    posy: i64,
    #[serde(default)]
    range: Option<Value>,
    #[serde(default)]
    nodes: RawRackNodes,
}

const RACK_KEYS: [&str; 5] = ["name", "range", "nodes", "posx", "posy"];

/// A range groups racks: an object of objects with none of the rack fields.
fn looks_like_range(value: &Value) -> bool {
    value.as_object().is_some_and(|o| {
        !RACK_KEYS.iter().any(|k| o.contains_key(*k)) && o.values().all(Value::is_object)
    })
}

/// Accepts either `{name: Rack}` or `{range: {name: Rack}}`.
pub fn normalize_racks(value: &Value, diag: &mut Diagnostics) -> Result<RackSet> {
    let Some(entries) = value.as_object() else {
        return Err(Error::invalid("racks", "expected an object keyed by rack or range name"));
    };
    if entries.is_empty() {
        return Ok(RackSet::default());
    }

    // All-empty entries read as default racks rather than empty ranges.
    let nested = entries.values().all(looks_like_range)
        && entries
            .values()
            .any(|v| v.as_object().is_some_and(|o| !o.is_empty()));
    if !nested {
        return normalize_flat_racks(entries, diag);
    }

    let mut ranges = Vec::new();
    for (range_name, racks) in entries {
        let Some(racks) = racks.as_object() else {
            return Err(Error::invalid(
                "racks",
                format!("range `{range_name}` is not an object"),
            ));
        };
        let mut out = Vec::with_capacity(racks.len());
        for (rack_key, raw) in racks {
            if !raw.is_object() {
                return Err(Error::invalid(
                    "racks",
                    format!("rack `{rack_key}` in range `{range_name}` is not an object"),
                ));
            }
            out.push(decode_rack(rack_key, raw, Some(range_name), diag)?);
        }
        sort_range(&mut out);
        ranges.push(RackRange {
            name: range_name.clone(),
            racks: out,
        });
    }
    Ok(RackSet { ranges })
}

fn normalize_flat_racks(entries: &Map<String, Value>, diag: &mut Diagnostics) -> Result<RackSet> {
    let mut ranges: IndexMap<String, (i64, Vec<Rack>)> = IndexMap::new();
    for (key, raw) in entries {
        let rack = decode_rack(key, raw, None, diag)?;
        let slot = ranges
            .entry(rack.range.clone())
            .or_insert((rack.posy, Vec::new()));
        slot.0 = slot.0.min(rack.posy);
        slot.1.push(rack);
    }
    // Stable: equal posy keeps first-appearance order.
    ranges.sort_by(|_, (a, _), _, (b, _)| a.cmp(b));
    Ok(RackSet {
        ranges: ranges
            .into_iter()
            .map(|(name, (_, mut racks))| {
                sort_range(&mut racks);
                RackRange { name, racks }
            })
            .collect(),
    })
}

fn sort_range(racks: &mut [Rack]) {
    racks.sort_by(|a, b| a.posx.cmp(&b.posx).then_with(|| a.name.cmp(&b.name)));
}

fn decode_rack(
    key: &str,
    raw: &Value,
    range: Option<&str>,
    diag: &mut Diagnostics,
) -> Result<Rack> {
    let parsed = RawRack::deserialize(raw).map_err(|err| {
        Error::invalid("racks", format!("rack `{key}`: {err}"))
    })?;
    let name = parsed.name.unwrap_or_else(|| key.to_string());
    let range = match range {
        Some(r) => r.to_string(),
        None => match parsed.range {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => parsed.posy.to_string(),
        },
    };

    let raw_nodes: Vec<(Option<String>, RawRackNode)> = match parsed.nodes {
        RawRackNodes::Map(map) => map.into_iter().map(|(k, n)| (Some(k), n)).collect(),
        RawRackNodes::List(list) => list.into_iter().map(|n| (None, n)).collect(),
    };
    let mut nodes: Vec<RackNode> = Vec::with_capacity(raw_nodes.len());
    for (map_key, n) in raw_nodes {
        let Some(node_name) = n.name.or(map_key) else {
            return Err(Error::invalid(
                "racks",
                format!("a node of rack `{name}` has no name"),
            ));
        };
        let finite = [n.posx, n.posy, n.width, n.height]
            .iter()
            .all(|v| v.is_finite());
        if !finite || n.width <= 0.0 || n.height <= 0.0 || n.posx < 0.0 || n.posy < 0.0 {
            diag.warn(
                WarningKind::Ignored,
                &node_name,
                format!("node of rack `{name}` has an invalid footprint and is not placed"),
            );
            continue;
        }
        let node = RackNode {
            name: node_name,
            posx: n.posx,
            posy: n.posy,
            width: n.width,
            height: n.height,
        };
        if let Some(other) = nodes.iter().find(|o| o.overlaps(&node)) {
            diag.warn(
                WarningKind::OverlappingNodes,
                &node.name,
                format!("footprint overlaps `{}` in rack `{name}`", other.name),
            );
        }
        nodes.push(node);
    }

    Ok(Rack {
        name,
        posx: parsed.posx,
        posy: parsed.posy,
        range,
        nodes,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawState {
    Text(String),
    Flags(Vec<String>),
}

#[derive(Deserialize)]
struct RawSlurmNode {
    #[serde(default, deserialize_with = "lenient_u32")]
    cpus: u32,
    #[serde(default, alias = "node_state")]
    state: Option<RawState>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    total_cpus: i64,
}

/// Decodes `{nodeName: SlurmNode}`. Unknown states are kept and reported, never rejected.
pub fn decode_nodes(value: &Value, diag: &mut Diagnostics) -> Result<SlurmNodes> {
    let Some(entries) = value.as_object() else {
        return Err(Error::invalid("nodes", "expected an object keyed by node name"));
    };
    let mut out = SlurmNodes::with_capacity(entries.len());
    for (name, raw) in entries {
        let parsed = RawSlurmNode::deserialize(raw)
            .map_err(|err| Error::invalid("nodes", format!("node `{name}`: {err}")))?;
        let state = match parsed.state {
            Some(RawState::Text(s)) => NodeState::parse(&s),
            Some(RawState::Flags(flags)) => NodeState::from_flags(&flags),
            None => NodeState::Unknown(String::new()),
        };
        if let NodeState::Unknown(raw_state) = &state {
            diag.warn(
                WarningKind::UnknownState,
                name,
                format!("unrecognized node state `{raw_state}`"),
            );
        }
        out.insert(
            name.clone(),
            SlurmNode {
                name: name.clone(),
                cpus: parsed.cpus,
                state,
                reason: parsed.reason.filter(|r| !r.trim().is_empty()),
                total_cpus: parsed.total_cpus,
            },
        );
    }
    Ok(out)
}

#[derive(Deserialize)]
struct RawJob {
    #[serde(default)]
    job_id: Option<Value>,
    #[serde(default)]
    job_state: Option<String>,
    #[serde(default)]
    cpus_allocated: Option<IndexMap<String, Value>>,
    #[serde(default)]
    layout: Option<IndexMap<String, Vec<u32>>>,
}

fn value_to_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Decodes `{jobId: Job}`. Jobs with an unusable id or core count are skipped with a warning.
pub fn decode_jobs(value: &Value, diag: &mut Diagnostics) -> Result<Vec<Job>> {
    let Some(entries) = value.as_object() else {
        return Err(Error::invalid("jobs", "expected an object keyed by job id"));
    };
    let mut out = Vec::with_capacity(entries.len());
    for (key, raw) in entries {
        let parsed = RawJob::deserialize(raw)
            .map_err(|err| Error::invalid("jobs", format!("job `{key}`: {err}")))?;
        let id = key
            .trim()
            .parse::<u64>()
            .ok()
            .or_else(|| parsed.job_id.as_ref().and_then(value_to_u64));
        let Some(id) = id else {
            diag.warn(WarningKind::Ignored, key, "job id is not a non-negative integer");
            continue;
        };

        let mut cpus_allocated = IndexMap::new();
        for (node, count) in parsed.cpus_allocated.unwrap_or_default() {
            match value_to_u64(&count).and_then(|c| u32::try_from(c).ok()) {
                Some(c) => {
                    cpus_allocated.insert(node, c);
                }
                None => diag.warn(
                    WarningKind::Ignored,
                    format!("job {id}"),
                    format!("core count `{count}` on `{node}` is not a valid integer"),
                ),
            }
        }

        out.push(Job {
            id,
            state: JobState::parse(parsed.job_state.as_deref().unwrap_or_default()),
            cpus_allocated,
            layout: parsed.layout.unwrap_or_default(),
        });
    }
    Ok(out)
}

/// Per-node core allocations of running jobs. Other job states never contribute.
pub fn allocated_cpus(
    jobs: &[Job],
    nodes: Option<&SlurmNodes>,
    diag: &mut Diagnostics,
) -> AllocatedCpus {
    let mut out = AllocatedCpus::new();
    for job in jobs.iter().filter(|j| j.state == JobState::Running) {
        for (node, &cores) in &job.cpus_allocated {
            if nodes.is_some_and(|n| !n.contains_key(node)) {
                diag.warn(
                    WarningKind::MissingNode,
                    node,
                    format!("job {} runs on a node absent from the nodes response", job.id),
                );
                continue;
            }
            out.entry(node.clone()).or_default().push(CoreAllocation {
                job_id: job.id,
                cores,
                layout: job.layout.get(node).cloned(),
            });
        }
    }

    if let Some(nodes) = nodes {
        for (name, allocs) in &out {
            let Some(node) = nodes.get(name) else {
                continue;
            };
            let total: u64 = allocs.iter().map(|a| u64::from(a.cores)).sum();
            if total > u64::from(node.cpus) {
                diag.warn(
                    WarningKind::OverAllocated,
                    name,
                    format!("{total} cores allocated on a node with {} cpus", node.cpus),
                );
            }
        }
    }
    out
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNames {
    One(String),
    Many(Vec<String>),
}

impl RawNames {
    fn exprs(&self) -> Vec<&str> {
        match self {
            Self::One(s) => vec![s.as_str()],
            Self::Many(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Deserialize)]
struct RawSwitch {
    #[serde(default, deserialize_with = "lenient_u32")]
    level: u32,
    #[serde(default)]
    nodes: Option<RawNames>,
    #[serde(default)]
    switches: Option<RawNames>,
}

/// Decodes `{switchId: {level, nodes, switches}}`, expanding nodeset expressions.
///
/// Malformed nodeset syntax is a data error and fails the whole topology.
pub fn decode_topology(value: &Value) -> Result<Topology> {
    let Some(entries) = value.as_object() else {
        return Err(Error::invalid("topology", "expected an object keyed by switch id"));
    };
    let mut switches = IndexMap::with_capacity(entries.len());
    for (id, raw) in entries {
        let parsed = RawSwitch::deserialize(raw)
            .map_err(|err| Error::invalid("topology", format!("switch `{id}`: {err}")))?;
        let node_exprs = parsed.nodes.as_ref().map(RawNames::exprs).unwrap_or_default();
        let switch_exprs = parsed
            .switches
            .as_ref()
            .map(RawNames::exprs)
            .unwrap_or_default();
        let nodes = nodeset::expand_all(node_exprs.iter().copied())?;
        let children = nodeset::expand_all(switch_exprs.iter().copied())?;
        let nodeset = (!node_exprs.is_empty())
            .then(|| node_exprs.join(","))
            .filter(|s| !s.trim().is_empty());
        switches.insert(
            id.clone(),
            Switch {
                id: id.clone(),
                level: parsed.level,
                nodes,
                switches: children,
                nodeset,
            },
        );
    }
    Ok(Topology { switches })
}
