mod durations;
mod engine;

pub use durations::{DurationTable, DurationTables, Mode, Phase};
pub use engine::{rest_after_focus, PhaseCompletion, PhaseMachine, SessionState, LONG_REST_EVERY};
