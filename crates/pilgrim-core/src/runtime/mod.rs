//! Async driver: the 1 Hz clock and the task that owns a journey.

mod clock;
mod runner;

pub use clock::{Clock, ClockTick};
pub use runner::{RunnerHandle, RunnerTask, SessionRunner};
