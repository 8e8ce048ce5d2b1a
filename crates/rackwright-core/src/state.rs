//! Slurm node states, decoded once at ingestion.

use serde::{Serialize, Serializer};

/// Base state of a compute node, without the "not responding" flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Idle,
    Allocated,
    Completing,
    Reserved,
    Draining,
    Drained,
    Down,
}

impl StateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Allocated => "ALLOCATED",
            Self::Completing => "COMPLETING",
            Self::Reserved => "RESERVED",
            Self::Draining => "DRAINING",
            Self::Drained => "DRAINED",
            Self::Down => "DOWN",
        }
    }

    /// States in which the node may hold running jobs.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Allocated | Self::Completing | Self::Draining)
    }

    fn from_token(token: &str) -> Option<Self> {
        let kind = match token {
            "IDLE" => Self::Idle,
            // Recent Slurm versions report partially allocated nodes as MIXED.
            "ALLOCATED" | "ALLOC" | "MIXED" => Self::Allocated,
            "COMPLETING" => Self::Completing,
            "RESERVED" => Self::Reserved,
            "DRAINING" => Self::Draining,
            "DRAINED" => Self::Drained,
            "DOWN" => Self::Down,
            _ => return None,
        };
        Some(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeState {
    Known {
        kind: StateKind,
        /// Trailing `*`: the node is not responding to the controller.
        flagged: bool,
    },
    /// A token outside the documented set. Kept verbatim for diagnostics.
    Unknown(String),
}

impl NodeState {
    pub fn new(kind: StateKind, flagged: bool) -> Self {
        Self::Known { kind, flagged }
    }

    /// Decodes a raw state token. Never fails: unseen tokens become [`NodeState::Unknown`].
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let upper = trimmed.to_ascii_uppercase();
        let (token, flagged) = match upper.strip_suffix('*') {
            Some(rest) => (rest.trim_end(), true),
            None => (upper.as_str(), false),
        };
        match StateKind::from_token(token) {
            Some(kind) => Self::Known { kind, flagged },
            None => Self::Unknown(trimmed.to_string()),
        }
    }

    /// Decodes the structured form reported by recent `slurmrestd` versions: a base state
    /// followed by flags, e.g. `["IDLE", "DRAIN"]` or `["MIXED", "NOT_RESPONDING"]`.
    pub fn from_flags<S: AsRef<str>>(tokens: &[S]) -> Self {
        let Some((base, flags)) = tokens.split_first() else {
            return Self::Unknown(String::new());
        };
        let (mut kind, mut flagged) = match Self::parse(base.as_ref()) {
            Self::Known { kind, flagged } => (kind, flagged),
            unknown @ Self::Unknown(_) => return unknown,
        };
        for flag in flags {
            match flag.as_ref().trim().to_ascii_uppercase().as_str() {
                "DRAIN" => {
                    kind = match kind {
                        StateKind::Idle => StateKind::Drained,
                        StateKind::Allocated | StateKind::Completing => StateKind::Draining,
                        other => other,
                    };
                }
                "NOT_RESPONDING" => flagged = true,
                "COMPLETING" if kind == StateKind::Allocated => kind = StateKind::Completing,
                "RESERVED" if kind == StateKind::Idle => kind = StateKind::Reserved,
                _ => {}
            }
        }
        Self::Known { kind, flagged }
    }

    pub fn kind(&self) -> Option<StateKind> {
        match self {
            Self::Known { kind, .. } => Some(*kind),
            Self::Unknown(_) => None,
        }
    }

    pub fn is_flagged(&self) -> bool {
        matches!(self, Self::Known { flagged: true, .. })
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Known { kind, flagged } => {
                f.write_str(kind.as_str())?;
                if *flagged {
                    f.write_str("*")?;
                }
                Ok(())
            }
            Self::Unknown(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for NodeState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
