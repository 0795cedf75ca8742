//! Phase state machine.
//!
//! The machine is tick-driven: it has no internal thread and never reads the
//! wall clock. Whoever owns it (usually the runner's [`Clock`]) calls
//! `tick()` once per second while it is running.
//!
//! ## State Transitions
//!
//! ```text
//! Work -> ShortRest -> Work -> ... -> Work -> LongRest -> Work
//!                  (every 4th completed Work phase)
//! ```
//!
//! A completed phase always leaves the machine stopped; the next phase must
//! be started explicitly.
//!
//! [`Clock`]: crate::runtime::Clock

use serde::{Deserialize, Serialize};

use super::durations::{DurationTables, Mode, Phase};
use crate::error::{CoreError, Result};

/// Long rest follows every Nth completed Work phase.
pub const LONG_REST_EVERY: u64 = 4;

/// Durable and live timer state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: Phase,
    pub remaining_seconds: u64,
    pub is_running: bool,
    /// Work and rest phases completed.
    pub session_count: u64,
    /// Work phases completed; drives unlocks.
    pub completed_focus_count: u64,
    pub mode: Mode,
}

/// Outcome of a finished phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseCompletion {
    pub completed: Phase,
    pub next: Phase,
    pub session_count: u64,
    pub completed_focus_count: u64,
}

impl PhaseCompletion {
    pub fn was_focus(&self) -> bool {
        self.completed == Phase::Work
    }
}

/// Rest kind that follows the Work phase which brought the focus count to `focus_count`.
pub fn rest_after_focus(focus_count: u64) -> Phase {
    if focus_count > 0 && focus_count % LONG_REST_EVERY == 0 {
        Phase::LongRest
    } else {
        Phase::ShortRest
    }
}

#[derive(Debug, Clone)]
pub struct PhaseMachine {
    tables: DurationTables,
    state: SessionState,
}

impl PhaseMachine {
    /// Fresh machine: Work phase, full duration, stopped, zero counters.
    pub fn new(tables: DurationTables, mode: Mode) -> Self {
        let remaining_seconds = tables.for_mode(mode).seconds(Phase::Work);
        Self {
            tables,
            state: SessionState {
                phase: Phase::Work,
                remaining_seconds,
                is_running: false,
                session_count: 0,
                completed_focus_count: 0,
                mode,
            },
        }
    }

    /// Rebuild from persisted pieces. The restored machine is always stopped.
    ///
    /// A remaining time of zero, or one longer than the phase itself, is
    /// replaced by the phase's full duration.
    pub fn restore(
        tables: DurationTables,
        mode: Mode,
        phase: Phase,
        remaining_seconds: u64,
        session_count: u64,
        completed_focus_count: u64,
    ) -> Self {
        let full = tables.for_mode(mode).seconds(phase);
        let remaining_seconds = if remaining_seconds == 0 || remaining_seconds > full {
            full
        } else {
            remaining_seconds
        };
        Self {
            tables,
            state: SessionState {
                phase,
                remaining_seconds,
                is_running: false,
                session_count,
                completed_focus_count,
                mode,
            },
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.state.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn tables(&self) -> &DurationTables {
        &self.tables
    }

    /// Full length of the current phase under the active table.
    pub fn total_seconds(&self) -> u64 {
        self.duration_of(self.state.phase)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Returns `Ok(false)` when already running.
    pub fn start(&mut self) -> Result<bool> {
        if self.state.is_running {
            return Ok(false);
        }
        if self.state.remaining_seconds == 0 {
            return Err(CoreError::invalid_transition(
                "start",
                "no time remaining in the current phase",
            ));
        }
        self.state.is_running = true;
        Ok(true)
    }

    /// Returns whether the machine was running.
    pub fn stop(&mut self) -> bool {
        std::mem::replace(&mut self.state.is_running, false)
    }

    /// Advance one second. Completes the phase when the countdown hits zero.
    pub fn tick(&mut self) -> Result<Option<PhaseCompletion>> {
        if !self.state.is_running {
            return Err(CoreError::invalid_transition("tick", "timer is not running"));
        }
        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);
        if self.state.remaining_seconds > 0 {
            return Ok(None);
        }
        self.state.is_running = false;
        Ok(Some(self.complete_phase()))
    }

    /// Finish the current phase immediately and line up the next one, stopped.
    pub fn complete_phase(&mut self) -> PhaseCompletion {
        let completed = self.state.phase;
        let next = if completed == Phase::Work {
            self.state.completed_focus_count += 1;
            rest_after_focus(self.state.completed_focus_count)
        } else {
            Phase::Work
        };
        self.state.session_count += 1;
        self.state.phase = next;
        self.state.remaining_seconds = self.duration_of(next);
        self.state.is_running = false;

        PhaseCompletion {
            completed,
            next,
            session_count: self.state.session_count,
            completed_focus_count: self.state.completed_focus_count,
        }
    }

    /// Back to a stopped, full-length Work phase. Counters are untouched.
    pub fn reset(&mut self) {
        self.state.is_running = false;
        self.state.phase = Phase::Work;
        self.state.remaining_seconds = self.duration_of(Phase::Work);
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.state.mode = mode;
        self.reset();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn duration_of(&self, phase: Phase) -> u64 {
        self.tables.for_mode(self.state.mode).seconds(phase)
    }
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new(DurationTables::default(), Mode::Standard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn accelerated() -> PhaseMachine {
        PhaseMachine::new(DurationTables::default(), Mode::Accelerated)
    }

    fn run_to_completion(m: &mut PhaseMachine) -> PhaseCompletion {
        m.start().unwrap();
        loop {
            if let Some(done) = m.tick().unwrap() {
                return done;
            }
        }
    }

    #[test]
    fn initial_state_is_stopped_work() {
        let m = PhaseMachine::default();
        let s = m.state();
        assert_eq!(s.phase, Phase::Work);
        assert_eq!(s.remaining_seconds, 1500);
        assert!(!s.is_running);
        assert_eq!(s.session_count, 0);
        assert_eq!(s.completed_focus_count, 0);
    }

    #[test]
    fn start_is_noop_when_running() {
        let mut m = PhaseMachine::default();
        assert!(m.start().unwrap());
        assert!(!m.start().unwrap());
        assert!(m.is_running());
    }

    #[test]
    fn stop_is_idempotent() {
        let mut m = PhaseMachine::default();
        m.start().unwrap();
        assert!(m.stop());
        assert!(!m.stop());
        assert!(!m.is_running());
    }

    #[test]
    fn tick_requires_running() {
        let mut m = PhaseMachine::default();
        let err = m.tick().unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { operation: "tick", .. }));
        assert_eq!(m.remaining_seconds(), 1500);
    }

    #[test]
    fn countdown_completes_and_stops() {
        let mut m = accelerated();
        m.start().unwrap();
        for expected in (1..5).rev() {
            assert_eq!(m.tick().unwrap(), None);
            assert_eq!(m.remaining_seconds(), expected);
        }
        let done = m.tick().unwrap().expect("phase should complete");
        assert_eq!(done.completed, Phase::Work);
        assert_eq!(done.next, Phase::ShortRest);
        assert!(!m.is_running());
        assert_eq!(m.phase(), Phase::ShortRest);
        assert_eq!(m.remaining_seconds(), 3);
    }

    #[test]
    fn rest_returns_to_work() {
        let mut m = accelerated();
        run_to_completion(&mut m);
        let done = run_to_completion(&mut m);
        assert_eq!(done.completed, Phase::ShortRest);
        assert_eq!(done.next, Phase::Work);
        assert_eq!(done.session_count, 2);
        assert_eq!(done.completed_focus_count, 1);
        assert_eq!(m.remaining_seconds(), 5);
    }

    #[test]
    fn every_fourth_focus_earns_long_rest() {
        let mut m = PhaseMachine::default();
        let mut rests = Vec::new();
        for _ in 0..8 {
            let done = m.complete_phase();
            assert!(done.was_focus());
            rests.push(done.next);
            m.complete_phase();
        }
        use Phase::*;
        assert_eq!(
            rests,
            vec![ShortRest, ShortRest, ShortRest, LongRest, ShortRest, ShortRest, ShortRest, LongRest]
        );
    }

    #[test]
    fn reset_keeps_counters() {
        let mut m = PhaseMachine::default();
        m.complete_phase();
        m.start().unwrap();
        m.reset();
        let s = m.state();
        assert_eq!(s.phase, Phase::Work);
        assert_eq!(s.remaining_seconds, 1500);
        assert!(!s.is_running);
        assert_eq!(s.session_count, 1);
        assert_eq!(s.completed_focus_count, 1);
    }

    #[test]
    fn set_mode_resets_to_accelerated_work() {
        let mut m = PhaseMachine::default();
        m.start().unwrap();
        m.tick().unwrap();
        m.set_mode(Mode::Accelerated);
        assert_eq!(m.remaining_seconds(), 5);
        assert!(!m.is_running());
        assert_eq!(m.phase(), Phase::Work);
        assert_eq!(m.mode(), Mode::Accelerated);
    }

    #[test]
    fn restore_clamps_remaining() {
        let tables = DurationTables::default();
        let m = PhaseMachine::restore(tables, Mode::Accelerated, Phase::LongRest, 0, 7, 4);
        assert_eq!(m.remaining_seconds(), 8);
        let m = PhaseMachine::restore(tables, Mode::Accelerated, Phase::LongRest, 99, 7, 4);
        assert_eq!(m.remaining_seconds(), 8);
        let m = PhaseMachine::restore(tables, Mode::Accelerated, Phase::LongRest, 2, 7, 4);
        assert_eq!(m.remaining_seconds(), 2);
        assert!(!m.is_running());
    }

    proptest! {
        #[test]
        fn remaining_never_increases_while_running(ticks in 1usize..40) {
            let mut m = accelerated();
            m.start().unwrap();
            let mut previous = m.remaining_seconds();
            for _ in 0..ticks {
                if !m.is_running() {
                    break;
                }
                let phase_before = m.phase();
                match m.tick().unwrap() {
                    None => {
                        prop_assert!(m.remaining_seconds() < previous);
                        prop_assert!(m.remaining_seconds() > 0);
                        prop_assert_eq!(m.phase(), phase_before);
                    }
                    Some(done) => {
                        prop_assert_eq!(previous, 1);
                        prop_assert_eq!(done.completed, phase_before);
                    }
                }
                previous = m.remaining_seconds();
            }
        }

        #[test]
        fn long_rest_only_on_multiples_of_four(focus in 1u64..200) {
            let rest = rest_after_focus(focus);
            prop_assert_eq!(rest == Phase::LongRest, focus % 4 == 0);
        }
    }
}
