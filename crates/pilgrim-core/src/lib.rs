//! # Pilgrim Core Library
//!
//! Business logic for Pilgrim, a journey-themed focus timer. Fixed-length
//! focus and rest phases move a traveler along a path; completed focus
//! phases unlock new environments and traveler variants, and each one can
//! be followed by a short journal reflection.
//!
//! ## Architecture
//!
//! - **Phase Machine**: tick-driven Work / ShortRest / LongRest state machine
//! - **Progression**: completion-count unlock catalog and cosmetic selection
//! - **Journal**: append-only reflections, one per completed focus phase
//! - **Storage**: snapshot persistence (SQLite key-value) and TOML configuration
//! - **Runtime**: tokio clock and a single-task runner that serialises all
//!   mutations and writes snapshots off the tick path
//!
//! ## Key Components
//!
//! - [`Journey`]: owns all mutable state and emits [`Event`]s
//! - [`SessionRunner`]: async driver for a [`Journey`]
//! - [`Database`]: default [`SnapshotStore`]
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod journal;
pub mod journey;
pub mod progression;
pub mod runtime;
pub mod storage;
pub mod timer;
pub mod views;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use journal::{Journal, JournalEntry, Mood, PendingReflection, Reflection};
pub use journey::Journey;
pub use progression::{Category, ProgressState, Progression, UnlockCatalog, UnlockItem};
pub use runtime::{Clock, ClockTick, RunnerHandle, RunnerTask, SessionRunner};
pub use storage::{Config, Database, MemoryStore, Snapshot, SnapshotStore, TimerSnapshot};
pub use timer::{DurationTable, DurationTables, Mode, Phase, PhaseMachine, SessionState};
