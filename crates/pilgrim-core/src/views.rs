//! Derived values for presentation.
//!
//! All of these are pure functions of the current state and are recomputed
//! on demand; none of them are stored.

use serde::{Deserialize, Serialize};

use crate::progression::{Category, ProgressState};
use crate::timer::{Phase, SessionState, LONG_REST_EVERY};

/// Start of the journey path, in percent of the scene width.
pub const TRAVELER_START_PCT: f64 = 10.0;
/// End of the journey path.
pub const TRAVELER_END_PCT: f64 = 85.0;
/// Focus phases needed to walk the whole path.
pub const JOURNEY_LENGTH: u64 = 20;

pub fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Work => "Focus Time",
        Phase::ShortRest => "Short Rest",
        Phase::LongRest => "Long Rest",
    }
}

/// `MM:SS`; minutes keep growing past 99.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// 0.0 ..= 100.0 elapsed share of the current phase.
pub fn phase_progress_pct(remaining_secs: u64, total_secs: u64) -> f64 {
    if total_secs == 0 {
        return 0.0;
    }
    let elapsed = total_secs.saturating_sub(remaining_secs);
    (elapsed as f64 / total_secs as f64 * 100.0).clamp(0.0, 100.0)
}

/// Horizontal position of the traveler after `completed_focus_count` focus phases.
pub fn traveler_position(completed_focus_count: u64) -> f64 {
    let step = (TRAVELER_END_PCT - TRAVELER_START_PCT) / JOURNEY_LENGTH as f64;
    (TRAVELER_START_PCT + completed_focus_count as f64 * step).min(TRAVELER_END_PCT)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelerPose {
    Walking,
    Resting,
    Celebrating,
}

pub fn traveler_pose(state: &SessionState) -> TravelerPose {
    if state.phase.is_rest() {
        return TravelerPose::Resting;
    }
    let count = state.completed_focus_count;
    if count > 0 && count % LONG_REST_EVERY == 0 {
        TravelerPose::Celebrating
    } else {
        TravelerPose::Walking
    }
}

/// Environment matching the local hour (0-23).
pub fn time_of_day_environment(hour: u32) -> &'static str {
    match hour {
        6..=11 => "desert",
        12..=17 => "mountain",
        18..=21 => "ocean",
        _ => "aurora",
    }
}

/// Time-of-day environment, only when the traveler has already unlocked it.
pub fn suggested_environment(hour: u32, progress: &ProgressState) -> Option<&'static str> {
    let id = time_of_day_environment(hour);
    progress
        .is_unlocked(Category::Environment, id)
        .then_some(id)
}
