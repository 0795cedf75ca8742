//! Cancellable repeating ticker.
//!
//! The clock runs as a tokio task that sends one [`ClockTick`] per period.
//! Each start gets a new generation number; ticks from an older generation
//! are stale and must be ignored by the receiver. `cancel` aborts the task
//! outright rather than pausing it, so a later `start` never inherits a
//! half-elapsed period or queued ticks.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    pub generation: u64,
}

#[derive(Debug)]
pub struct Clock {
    period: Duration,
    generation: u64,
    handle: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<ClockTick>,
}

impl Clock {
    pub fn new(period: Duration, tx: mpsc::UnboundedSender<ClockTick>) -> Self {
        Self {
            period,
            generation: 0,
            handle: None,
            tx,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Begin ticking. Returns `false` without spawning anything when a
    /// ticker is already active.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> bool {
        if self.is_active() {
            return false;
        }
        self.generation += 1;
        let generation = self.generation;
        let period = self.period;
        let tx = self.tx.clone();
        self.handle = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(ClockTick { generation }).is_err() {
                    break;
                }
            }
        }));
        true
    }

    /// Stop the ticker. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Whether `tick` came from the ticker that is running now.
    pub fn is_current(&self, tick: &ClockTick) -> bool {
        self.handle.is_some() && tick.generation == self.generation
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> (Clock, mpsc::UnboundedReceiver<ClockTick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Clock::new(Duration::from_secs(1), tx), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let (mut clock, mut rx) = clock();
        assert!(clock.start());
        let started = Instant::now();
        for _ in 0..3 {
            let tick = rx.recv().await.unwrap();
            assert!(clock.is_current(&tick));
        }
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_noop() {
        let (mut clock, mut rx) = clock();
        assert!(clock.start());
        assert!(!clock.start());
        time::sleep(Duration::from_millis(2500)).await;
        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_delivery() {
        let (mut clock, mut rx) = clock();
        clock.start();
        rx.recv().await.unwrap();
        clock.cancel();
        clock.cancel();
        assert!(!clock.is_active());
        time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_marks_old_ticks_stale() {
        let (mut clock, mut rx) = clock();
        clock.start();
        let old = rx.recv().await.unwrap();
        clock.cancel();
        assert!(!clock.is_current(&old));
        clock.start();
        assert!(!clock.is_current(&old));
        let fresh = rx.recv().await.unwrap();
        assert!(clock.is_current(&fresh));
        assert_eq!(fresh.generation, old.generation + 1);
    }
}
