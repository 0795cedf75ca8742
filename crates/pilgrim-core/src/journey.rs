//! The journey: one owned object holding every piece of mutable state.
//!
//! `Journey` wires the phase machine to the progression engine and the
//! journal. Each operation returns the events it produced and marks the
//! journey dirty when durable state changed. Persisting is the caller's
//! job: take the pending snapshot with [`Journey::take_save_request`] (async
//! writers) or call [`Journey::flush`] (synchronous callers).

use chrono::{DateTime, Utc};

use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::journal::{Journal, JournalEntry, Reflection};
use crate::progression::{Category, ProgressState, Progression, UnlockCatalog};
use crate::storage::{Config, Snapshot, SnapshotStore, TimerSnapshot};
use crate::timer::{DurationTables, Mode, PhaseCompletion, PhaseMachine, SessionState};
use crate::views;

#[derive(Debug, Clone)]
pub struct Journey {
    machine: PhaseMachine,
    progression: Progression,
    journal: Journal,
    dirty: bool,
}

impl Journey {
    /// First-run journey.
    pub fn new(tables: DurationTables, mode: Mode, catalog: UnlockCatalog) -> Self {
        Self {
            machine: PhaseMachine::new(tables, mode),
            progression: Progression::new(catalog),
            journal: Journal::new(),
            dirty: false,
        }
    }

    /// First-run journey using the durations, mode and catalog from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.duration_tables(),
            config.default_mode,
            config.catalog()?,
        ))
    }

    /// Rebuild from a persisted snapshot. The timer comes back stopped.
    pub fn from_snapshot(
        snapshot: Snapshot,
        tables: DurationTables,
        default_mode: Mode,
        catalog: UnlockCatalog,
    ) -> Self {
        let machine = match snapshot.timer {
            Some(t) => PhaseMachine::restore(
                tables,
                t.mode,
                t.phase,
                t.remaining_seconds,
                snapshot.session_count,
                snapshot.completed_focus_count,
            ),
            None => {
                let full = tables.for_mode(default_mode).work;
                PhaseMachine::restore(
                    tables,
                    default_mode,
                    crate::timer::Phase::Work,
                    full,
                    snapshot.session_count,
                    snapshot.completed_focus_count,
                )
            }
        };
        let progression = Progression::restore(catalog, snapshot.progress());
        let journal = Journal::restore(snapshot.journal_entries, snapshot.pending_reflection);
        Self {
            machine,
            progression,
            journal,
            dirty: false,
        }
    }

    /// Load from `store`, treating any failure or absent snapshot as first run.
    pub fn restore<S: SnapshotStore + ?Sized>(store: &S, config: &Config) -> Result<Self> {
        let catalog = config.catalog()?;
        let tables = config.duration_tables();
        match store.load() {
            Ok(Some(snapshot)) => {
                tracing::debug!(
                    focus = snapshot.completed_focus_count,
                    sessions = snapshot.session_count,
                    "restored journey"
                );
                Ok(Self::from_snapshot(snapshot, tables, config.default_mode, catalog))
            }
            Ok(None) => {
                tracing::info!("no saved journey, starting fresh");
                Ok(Self::new(tables, config.default_mode, catalog))
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not load saved journey, starting fresh");
                Ok(Self::new(tables, config.default_mode, catalog))
            }
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> &SessionState {
        self.machine.state()
    }

    pub fn progress(&self) -> &ProgressState {
        self.progression.state()
    }

    pub fn catalog(&self) -> &UnlockCatalog {
        self.progression.catalog()
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn is_running(&self) -> bool {
        self.machine.is_running()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Full durable record.
    pub fn snapshot(&self) -> Snapshot {
        let session = self.machine.state();
        let progress = self.progression.state();
        Snapshot {
            session_count: session.session_count,
            completed_focus_count: session.completed_focus_count,
            active_environment_id: progress.active_environment_id.clone(),
            active_avatar_id: progress.active_avatar_id.clone(),
            unlocked_environment_ids: progress.unlocked_environment_ids.clone(),
            unlocked_avatar_ids: progress.unlocked_avatar_ids.clone(),
            journal_entries: self.journal.entries().to_vec(),
            timer: Some(TimerSnapshot {
                phase: session.phase,
                remaining_seconds: session.remaining_seconds,
                mode: session.mode,
            }),
            pending_reflection: self.journal.pending().copied(),
        }
    }

    /// Read-only view for consumers.
    pub fn state_snapshot(&self) -> Event {
        let session = self.machine.state();
        let progress = self.progression.state();
        let total = self.machine.total_seconds();
        Event::StateSnapshot {
            phase: session.phase,
            phase_label: views::phase_label(session.phase).to_string(),
            remaining_secs: session.remaining_seconds,
            total_secs: total,
            progress_pct: views::phase_progress_pct(session.remaining_seconds, total),
            is_running: session.is_running,
            mode: session.mode,
            session_count: session.session_count,
            completed_focus_count: session.completed_focus_count,
            active_environment_id: progress.active_environment_id.clone(),
            active_avatar_id: progress.active_avatar_id.clone(),
            reflection_pending: self.journal.pending().is_some(),
            at: Utc::now(),
        }
    }

    // ── Timer commands ───────────────────────────────────────────────

    pub fn start(&mut self) -> Vec<Event> {
        match self.machine.start() {
            Ok(true) => vec![Event::TimerStarted {
                phase: self.machine.phase(),
                remaining_secs: self.machine.remaining_seconds(),
                at: Utc::now(),
            }],
            Ok(false) => Vec::new(),
            Err(e) => {
                tracing::debug!(error = %e, "start ignored");
                Vec::new()
            }
        }
    }

    pub fn stop(&mut self) -> Vec<Event> {
        if !self.machine.stop() {
            return Vec::new();
        }
        // The remaining time is durable; keep it across restarts.
        self.dirty = true;
        vec![Event::TimerStopped {
            phase: self.machine.phase(),
            remaining_secs: self.machine.remaining_seconds(),
            at: Utc::now(),
        }]
    }

    /// One second elapsed. Ticks that arrive while stopped are dropped.
    pub fn tick(&mut self) -> Vec<Event> {
        match self.machine.tick() {
            Ok(Some(completion)) => self.on_phase_completed(completion),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::debug!(error = %e, "tick ignored");
                Vec::new()
            }
        }
    }

    /// Finish the current phase now, as if its countdown had run out.
    pub fn complete_phase(&mut self) -> Vec<Event> {
        let completion = self.machine.complete_phase();
        self.on_phase_completed(completion)
    }

    pub fn reset(&mut self) -> Vec<Event> {
        self.machine.reset();
        self.dirty = true;
        vec![Event::TimerReset { at: Utc::now() }]
    }

    pub fn set_mode(&mut self, mode: Mode) -> Vec<Event> {
        self.machine.set_mode(mode);
        self.dirty = true;
        vec![Event::ModeChanged {
            mode,
            remaining_secs: self.machine.remaining_seconds(),
            at: Utc::now(),
        }]
    }

    // ── Progression commands ─────────────────────────────────────────

    pub fn select_environment(&mut self, id: &str) -> Result<Vec<Event>> {
        if !self.progression.select_environment(id)? {
            return Ok(Vec::new());
        }
        self.dirty = true;
        Ok(vec![Event::EnvironmentSelected {
            id: id.to_string(),
            at: Utc::now(),
        }])
    }

    pub fn select_avatar(&mut self, id: &str) -> Result<Vec<Event>> {
        if !self.progression.select_avatar(id)? {
            return Ok(Vec::new());
        }
        self.dirty = true;
        Ok(vec![Event::AvatarSelected {
            id: id.to_string(),
            at: Utc::now(),
        }])
    }

    pub fn select(&mut self, category: Category, id: &str) -> Result<Vec<Event>> {
        match category {
            Category::Environment => self.select_environment(id),
            Category::Avatar => self.select_avatar(id),
        }
    }

    // ── Journal commands ─────────────────────────────────────────────

    /// Journal the most recent, not yet journaled, Work completion.
    pub fn record_reflection(&mut self, reflection: Reflection) -> Result<(JournalEntry, Event)> {
        let progress = self.progression.state();
        let entry = self
            .journal
            .record(
                reflection,
                &progress.active_environment_id,
                &progress.active_avatar_id,
                Utc::now(),
            )?
            .clone();
        self.dirty = true;
        let event = Event::ReflectionRecorded {
            focus_count: entry.focus_count_at_creation,
            at: entry.timestamp,
        };
        Ok((entry, event))
    }

    pub fn dismiss_reflection(&mut self) -> Result<Event> {
        let pending = self.journal.dismiss()?;
        self.dirty = true;
        Ok(Event::ReflectionDismissed {
            focus_count: pending.focus_count,
            at: Utc::now(),
        })
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// The snapshot to write, if anything changed since the last request.
    pub fn take_save_request(&mut self) -> Option<Snapshot> {
        if !std::mem::replace(&mut self.dirty, false) {
            return None;
        }
        Some(self.snapshot())
    }

    /// A snapshot handed out by [`take_save_request`](Self::take_save_request)
    /// was never written; request another save.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Save now if dirty. On failure the journey stays dirty so the next
    /// flush retries.
    pub fn flush<S: SnapshotStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        let Some(snapshot) = self.take_save_request() else {
            return Ok(());
        };
        if let Err(e) = store.save(&snapshot) {
            self.dirty = true;
            tracing::warn!(error = %e, "journey not saved, keeping in-memory state");
            return Err(match e {
                e @ CoreError::PersistenceUnavailable { .. } => e,
                other => CoreError::persistence("save", other),
            });
        }
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn on_phase_completed(&mut self, completion: PhaseCompletion) -> Vec<Event> {
        let at = Utc::now();
        self.dirty = true;
        tracing::info!(
            completed = %completion.completed,
            next = %completion.next,
            focus = completion.completed_focus_count,
            sessions = completion.session_count,
            "phase completed"
        );

        let mut events = vec![Event::PhaseCompleted {
            completed: completion.completed,
            next: completion.next,
            session_count: completion.session_count,
            completed_focus_count: completion.completed_focus_count,
            at,
        }];

        if completion.was_focus() {
            for item in self.progression.check_unlocks(completion.completed_focus_count) {
                events.push(unlocked_event(item.category, &item.id, item.label(), item.threshold, at));
            }
            if self.journal.open_prompt(completion.completed_focus_count, at) {
                events.push(Event::ReflectionPrompted {
                    focus_count: completion.completed_focus_count,
                    at,
                });
            }
        }
        events
    }
}

fn unlocked_event(category: Category, id: &str, name: &str, threshold: u64, at: DateTime<Utc>) -> Event {
    Event::Unlocked {
        category,
        id: id.to_string(),
        name: name.to_string(),
        threshold,
        at,
    }
}

impl Default for Journey {
    fn default() -> Self {
        Self::new(DurationTables::default(), Mode::Standard, UnlockCatalog::journey())
    }
}
