//! Structured notifications emitted by the rule engine.
//!
//! The presentation layer drains these after every request and animates,
//! plays audio, or refreshes UI from them. The core never waits on them except
//! through the explicit presentation-complete acknowledgement on the session.

use serde::{Deserialize, Serialize};

use crate::data::{CardId, CardKind};
use crate::deck::DrawTrace;
use crate::module::ModuleId;
use crate::outcome::GameOutcome;
use crate::resources::ResourcePool;
use crate::station::SystemType;

/// Stable, deterministic identifier for a single notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId {
    /// One-based day counter when the event occurred.
    pub day: u32,
    /// Per-day sequence number (0-based) within the emitted event stream.
    pub seq: u32,
}

impl EventId {
    #[must_use]
    pub const fn new(day: u32, seq: u32) -> Self {
        Self { day, seq }
    }
}

/// Severity tier for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSeverity {
    Info,
    Warning,
    Critical,
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    ModuleHealthChanged {
        module: ModuleId,
        before: i32,
        after: i32,
        disabled: bool,
    },
    AggregateChanged {
        system: SystemType,
        current_hp: i32,
        max_hp: i32,
        dead: bool,
    },
    ResourcesChanged {
        resources: ResourcePool,
    },
    CrisisEntered {
        system: SystemType,
        turns_left: Option<u32>,
    },
    CrisisTicked {
        system: SystemType,
        turns_left: Option<u32>,
    },
    CrisisCleared {
        system: SystemType,
    },
    DayChanged {
        day: u32,
        draws_allowed: u32,
        event_chance: f32,
    },
    CardDrawn {
        card: CardId,
        kind: CardKind,
        trace: DrawTrace,
    },
    CardAddedToHand {
        card: CardId,
    },
    CardRemovedFromHand {
        card: CardId,
    },
    OverflowStarted {
        card: CardId,
    },
    OverflowResolved {
        kept: Option<CardId>,
        discarded: CardId,
    },
    TargetingStarted {
        card: CardId,
        valid_targets: Vec<ModuleId>,
    },
    TargetingCancelled {
        card: CardId,
    },
    CardResolved {
        card: CardId,
        target: Option<ModuleId>,
    },
    InputUnlocked,
    GameEnded {
        outcome: GameOutcome,
    },
}

impl EventKind {
    #[must_use]
    pub fn severity(&self) -> EventSeverity {
        match self {
            Self::CrisisEntered { .. } | Self::GameEnded { .. } => EventSeverity::Critical,
            Self::CrisisTicked { .. } | Self::OverflowStarted { .. } => EventSeverity::Warning,
            Self::AggregateChanged { dead: true, .. } => EventSeverity::Warning,
            _ => EventSeverity::Info,
        }
    }
}

/// Notification with its stable id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub id: EventId,
    pub severity: EventSeverity,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Ordered buffer of notifications awaiting the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    day: u32,
    next_seq: u32,
    pending: Vec<SimEvent>,
}

impl EventLog {
    #[must_use]
    pub fn new(day: u32) -> Self {
        Self {
            day,
            next_seq: 0,
            pending: Vec::new(),
        }
    }

    /// Start numbering a new day from zero.
    pub fn set_day(&mut self, day: u32) {
        if day != self.day {
            self.day = day;
            self.next_seq = 0;
        }
    }

    pub fn push(&mut self, kind: EventKind) {
        let id = EventId::new(self.day, self.next_seq);
        self.next_seq = self.next_seq.saturating_add(1);
        self.pending.push(SimEvent {
            id,
            severity: kind.severity(),
            kind,
        });
    }

    #[must_use]
    pub fn pending(&self) -> &[SimEvent] {
        &self.pending
    }

    /// Hand every pending notification to the caller.
    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.pending)
    }
}
