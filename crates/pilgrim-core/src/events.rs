use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::progression::Category;
use crate::timer::{Mode, Phase};

/// Every state change in the system produces an Event.
/// Consumers render from them; the runner forwards them over a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    PhaseCompleted {
        completed: Phase,
        next: Phase,
        session_count: u64,
        completed_focus_count: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    ModeChanged {
        mode: Mode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    Unlocked {
        category: Category,
        id: String,
        name: String,
        threshold: u64,
        at: DateTime<Utc>,
    },
    EnvironmentSelected {
        id: String,
        at: DateTime<Utc>,
    },
    AvatarSelected {
        id: String,
        at: DateTime<Utc>,
    },
    /// A Work phase finished and is waiting for a reflection.
    ReflectionPrompted {
        focus_count: u64,
        at: DateTime<Utc>,
    },
    ReflectionRecorded {
        focus_count: u64,
        at: DateTime<Utc>,
    },
    ReflectionDismissed {
        focus_count: u64,
        at: DateTime<Utc>,
    },
    /// A snapshot could not be written; in-memory state is still current.
    PersistenceFailed {
        message: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        phase_label: String,
        remaining_secs: u64,
        total_secs: u64,
        progress_pct: f64,
        is_running: bool,
        mode: Mode,
        session_count: u64,
        completed_focus_count: u64,
        active_environment_id: String,
        active_avatar_id: String,
        reflection_pending: bool,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TimerStarted { at, .. }
            | Event::TimerStopped { at, .. }
            | Event::PhaseCompleted { at, .. }
            | Event::TimerReset { at }
            | Event::ModeChanged { at, .. }
            | Event::Unlocked { at, .. }
            | Event::EnvironmentSelected { at, .. }
            | Event::AvatarSelected { at, .. }
            | Event::ReflectionPrompted { at, .. }
            | Event::ReflectionRecorded { at, .. }
            | Event::ReflectionDismissed { at, .. }
            | Event::PersistenceFailed { at, .. }
            | Event::StateSnapshot { at, .. } => *at,
        }
    }

    pub fn is_phase_completed(&self) -> bool {
        matches!(self, Event::PhaseCompleted { .. })
    }
}
