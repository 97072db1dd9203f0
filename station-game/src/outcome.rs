//! Terminal game outcome.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::station::SystemType;

/// Result of a session. Leaves `InProgress` at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GameOutcome {
    #[default]
    InProgress,
    Won,
    /// A subsystem stayed down past its countdown.
    Lost { system: SystemType },
}

impl GameOutcome {
    #[must_use]
    pub const fn is_over(self) -> bool {
        !matches!(self, Self::InProgress)
    }

    /// Human-readable loss reason, e.g. `Life Support offline too long`.
    #[must_use]
    pub fn reason(self) -> Option<String> {
        match self {
            Self::Lost { system } => Some(format!("{system} offline too long")),
            Self::InProgress | Self::Won => None,
        }
    }

    /// Record a terminal outcome if none is set yet. Returns true on the
    /// transition.
    pub fn settle(&mut self, outcome: Self) -> bool {
        if self.is_over() || !outcome.is_over() {
            return false;
        }
        *self = outcome;
        true
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => f.write_str("in progress"),
            Self::Won => f.write_str("won"),
            Self::Lost { system } => write!(f, "lost: {system} offline too long"),
        }
    }
}
