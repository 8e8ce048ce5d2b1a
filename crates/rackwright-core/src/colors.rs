//! Node, LED and job colors.
//!
//! Resolution happens in two steps: the decoded [`NodeState`] plus the node's CPU counters select an
//! [`Occupancy`] and an [`LedStatus`] category, then a [`ColorScheme`] turns categories into colors.
//! Both steps are total.

use crate::model::SlurmNode;
use crate::state::{NodeState, StateKind};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let byte = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
                Some(Self::rgb(r, g, b))
            }
            6 => Some(Self::rgb(byte(0..2)?, byte(2..4)?, byte(4..6)?)),
            8 => Some(Self::rgba(byte(0..2)?, byte(2..4)?, byte(4..6)?, byte(6..8)?)),
            _ => None,
        }
    }

    /// CSS hex notation; the alpha byte is omitted when opaque.
    pub fn to_css(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_css())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Color::parse_hex(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid color `{raw}`, expected #rrggbb")))
    }
}

/// What the node body shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Occupancy {
    Idle,
    FullyAllocated,
    PartiallyAllocated,
    Reserved,
    Unavailable,
    Unknown,
}

/// What the node LED shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedStatus {
    Available,
    Completing,
    Reserved,
    Draining,
    Drained,
    Down,
    NotResponding,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeColors {
    pub occupancy: Color,
    pub led: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OccupancyColors {
    pub idle: Color,
    pub fully_allocated: Color,
    pub partially_allocated: Color,
    pub reserved: Color,
    pub unavailable: Color,
    pub unknown: Color,
}

impl Default for OccupancyColors {
    fn default() -> Self {
        Self {
            idle: Color::rgb(0xf2, 0xf2, 0xf2),
            fully_allocated: Color::rgb(0x3d, 0x6f, 0xb6),
            partially_allocated: Color::rgb(0x8f, 0xb7, 0xe6),
            reserved: Color::rgb(0xc9, 0xa7, 0xe4),
            unavailable: Color::rgb(0x55, 0x55, 0x55),
            unknown: Color::rgb(0xff, 0x00, 0xff),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedColors {
    pub available: Color,
    pub completing: Color,
    pub reserved: Color,
    pub draining: Color,
    pub drained: Color,
    pub down: Color,
    pub not_responding: Color,
    pub unknown: Color,
}

impl Default for LedColors {
    fn default() -> Self {
        Self {
            available: Color::rgb(0x2e, 0xcc, 0x40),
            completing: Color::rgb(0x39, 0xcc, 0xcc),
            reserved: Color::rgb(0xb1, 0x0d, 0xc9),
            draining: Color::rgb(0xff, 0x85, 0x1b),
            drained: Color::rgb(0xff, 0xdc, 0x00),
            down: Color::rgb(0xff, 0x41, 0x36),
            not_responding: Color::rgb(0xaa, 0xaa, 0xaa),
            unknown: Color::rgb(0xff, 0x00, 0xff),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorScheme {
    pub occupancy: OccupancyColors,
    pub led: LedColors,
    /// Cores not claimed by any running job.
    pub idle_core: Color,
    pub rack_border: Color,
    pub rack_body: Color,
    /// Per-job colors, indexed by `job_id % len`.
    pub jobs: Vec<Color>,
}

pub const MIN_JOB_PALETTE_LEN: usize = 8;

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            occupancy: OccupancyColors::default(),
            led: LedColors::default(),
            idle_core: Color::rgb(0xdd, 0xdd, 0xdd),
            rack_border: Color::rgb(0x33, 0x33, 0x33),
            rack_body: Color::rgb(0x1a, 0x1a, 0x1a),
            // Alternates hue families so neighbouring job ids stay distinguishable.
            jobs: vec![
                Color::rgb(0x1f, 0x77, 0xb4),
                Color::rgb(0xff, 0x7f, 0x0e),
                Color::rgb(0x2c, 0xa0, 0x2c),
                Color::rgb(0xd6, 0x27, 0x28),
                Color::rgb(0x94, 0x67, 0xbd),
                Color::rgb(0x8c, 0x56, 0x4b),
                Color::rgb(0xe3, 0x77, 0xc2),
                Color::rgb(0x7f, 0x7f, 0x7f),
                Color::rgb(0xbc, 0xbd, 0x22),
                Color::rgb(0x17, 0xbe, 0xcf),
                Color::rgb(0xae, 0xc7, 0xe8),
                Color::rgb(0xff, 0xbb, 0x78),
            ],
        }
    }
}

impl ColorScheme {
    pub fn occupancy_color(&self, occupancy: Occupancy) -> Color {
        let c = &self.occupancy;
        match occupancy {
            Occupancy::Idle => c.idle,
            Occupancy::FullyAllocated => c.fully_allocated,
            Occupancy::PartiallyAllocated => c.partially_allocated,
            Occupancy::Reserved => c.reserved,
            Occupancy::Unavailable => c.unavailable,
            Occupancy::Unknown => c.unknown,
        }
    }

    pub fn led_color(&self, status: LedStatus) -> Color {
        let c = &self.led;
        match status {
            LedStatus::Available => c.available,
            LedStatus::Completing => c.completing,
            LedStatus::Reserved => c.reserved,
            LedStatus::Draining => c.draining,
            LedStatus::Drained => c.drained,
            LedStatus::Down => c.down,
            LedStatus::NotResponding => c.not_responding,
            LedStatus::Unknown => c.unknown,
        }
    }

    pub fn resolve_node_colors(&self, node: &SlurmNode) -> NodeColors {
        let (occupancy, led) = classify(node);
        NodeColors {
            occupancy: self.occupancy_color(occupancy),
            led: self.led_color(led),
        }
    }

    /// `jobs[job_id % len]`. Wraparound is expected for large job ids.
    pub fn job_color(&self, job_id: u64) -> Color {
        if self.jobs.is_empty() {
            return self.idle_core;
        }
        let idx = (job_id % self.jobs.len() as u64) as usize;
        self.jobs[idx]
    }
}

/// `|total_cpus| == cpus`: every core of the node is claimed.
pub fn is_fully_allocated(node: &SlurmNode) -> bool {
    node.total_cpus.unsigned_abs() == u64::from(node.cpus)
}

/// Maps a node to its occupancy and LED categories.
pub fn classify(node: &SlurmNode) -> (Occupancy, LedStatus) {
    let (kind, flagged) = match &node.state {
        NodeState::Known { kind, flagged } => (*kind, *flagged),
        NodeState::Unknown(_) => return (Occupancy::Unknown, LedStatus::Unknown),
    };

    let busy = || {
        if is_fully_allocated(node) {
            Occupancy::FullyAllocated
        } else {
            Occupancy::PartiallyAllocated
        }
    };

    let (occupancy, led) = match kind {
        StateKind::Idle => (Occupancy::Idle, LedStatus::Available),
        StateKind::Allocated => (busy(), LedStatus::Available),
        StateKind::Completing => (busy(), LedStatus::Completing),
        StateKind::Reserved => (Occupancy::Reserved, LedStatus::Reserved),
        StateKind::Draining => (busy(), LedStatus::Draining),
        StateKind::Drained => (Occupancy::Unavailable, LedStatus::Drained),
        StateKind::Down => (Occupancy::Unavailable, LedStatus::Down),
    };

    // A down node is reported as down whether or not it answers.
    if flagged && kind != StateKind::Down {
        return (occupancy, LedStatus::NotResponding);
    }
    (occupancy, led)
}
