//! Single-task event loop that owns a [`Journey`].
//!
//! Commands and clock ticks are serialised through one `tokio::select!`
//! loop, so no two operations ever touch the journey at once. The clock
//! runs exactly while the journey is running. Dirty snapshots are handed to
//! a writer task that saves on the blocking pool; the loop never waits for a
//! save. A failed save marks the journey dirty again.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::clock::{Clock, ClockTick};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::journal::{JournalEntry, Reflection};
use crate::journey::Journey;
use crate::storage::{Snapshot, SnapshotStore};
use crate::timer::Mode;

enum Command {
    Start,
    Stop,
    Reset,
    SetMode(Mode),
    SelectEnvironment(String, oneshot::Sender<Result<()>>),
    SelectAvatar(String, oneshot::Sender<Result<()>>),
    RecordReflection(Reflection, oneshot::Sender<Result<JournalEntry>>),
    DismissReflection(oneshot::Sender<Result<()>>),
    Snapshot(oneshot::Sender<Snapshot>),
    State(oneshot::Sender<Event>),
}

/// Cheap, cloneable front door to a running [`SessionRunner`].
#[derive(Clone)]
pub struct RunnerHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl RunnerHandle {
    fn send(&self, cmd: Command) -> Result<()> {
        self.tx.send(cmd).map_err(|_| runner_gone())
    }

    async fn ask<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx))?;
        rx.await.map_err(|_| runner_gone())
    }

    pub fn start(&self) -> Result<()> {
        self.send(Command::Start)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    pub fn reset(&self) -> Result<()> {
        self.send(Command::Reset)
    }

    pub fn set_mode(&self, mode: Mode) -> Result<()> {
        self.send(Command::SetMode(mode))
    }

    pub async fn select_environment(&self, id: impl Into<String>) -> Result<()> {
        let id = id.into();
        self.ask(|tx| Command::SelectEnvironment(id, tx)).await?
    }

    pub async fn select_avatar(&self, id: impl Into<String>) -> Result<()> {
        let id = id.into();
        self.ask(|tx| Command::SelectAvatar(id, tx)).await?
    }

    pub async fn record_reflection(&self, reflection: Reflection) -> Result<JournalEntry> {
        self.ask(|tx| Command::RecordReflection(reflection, tx)).await?
    }

    pub async fn dismiss_reflection(&self) -> Result<()> {
        self.ask(Command::DismissReflection).await?
    }

    pub async fn snapshot(&self) -> Result<Snapshot> {
        self.ask(Command::Snapshot).await
    }

    pub async fn state(&self) -> Result<Event> {
        self.ask(Command::State).await
    }
}

fn runner_gone() -> CoreError {
    CoreError::invalid_transition("runner", "session runner has shut down")
}

/// Join handle for the runner task; resolves to the final journey.
pub struct RunnerTask {
    task: JoinHandle<Journey>,
}

impl RunnerTask {
    /// Wait for the runner to finish (all handles dropped) and its writer to
    /// drain.
    pub async fn join(self) -> Result<Journey> {
        self.task
            .await
            .map_err(|e| CoreError::invalid_transition("runner", e.to_string()))
    }
}

pub struct SessionRunner;

impl SessionRunner {
    /// Move `journey` onto its own task.
    ///
    /// Returns a handle for issuing commands, the event stream, and the task.
    /// The runner exits once every [`RunnerHandle`] is dropped, after handing
    /// its last snapshot to the writer and waiting for the writer to finish.
    pub fn spawn<S>(
        journey: Journey,
        store: S,
        tick_period: Duration,
    ) -> (RunnerHandle, mpsc::UnboundedReceiver<Event>, RunnerTask)
    where
        S: SnapshotStore + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(journey, store, tick_period, cmd_rx, event_tx));
        (RunnerHandle { tx: cmd_tx }, event_rx, RunnerTask { task })
    }
}

async fn run<S>(
    mut journey: Journey,
    store: S,
    tick_period: Duration,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<Event>,
) -> Journey
where
    S: SnapshotStore + Send + 'static,
{
    let (tick_tx, mut ticks) = mpsc::unbounded_channel::<ClockTick>();
    let mut clock = Clock::new(tick_period, tick_tx);
    let (save_tx, save_rx) = mpsc::unbounded_channel::<Snapshot>();
    let (failed_tx, mut failed) = mpsc::unbounded_channel::<()>();
    let writer = spawn_writer(store, save_rx, events.clone(), failed_tx);

    loop {
        let produced = tokio::select! {
            biased;
            Some(()) = failed.recv() => {
                // Retried with the next save request, not immediately.
                journey.mark_dirty();
                continue;
            }
            cmd = commands.recv() => match cmd {
                Some(cmd) => handle(&mut journey, cmd),
                None => break,
            },
            Some(tick) = ticks.recv() => {
                if clock.is_current(&tick) {
                    journey.tick()
                } else {
                    Vec::new()
                }
            }
        };

        if journey.is_running() {
            clock.start();
        } else {
            clock.cancel();
        }

        for event in produced {
            let _ = events.send(event);
        }
        if let Some(snapshot) = journey.take_save_request() {
            let _ = save_tx.send(snapshot);
        }
    }

    clock.cancel();
    for event in journey.stop() {
        let _ = events.send(event);
    }
    tracing::debug!("runner stopping");
    while failed.try_recv().is_ok() {
        journey.mark_dirty();
    }
    if let Some(snapshot) = journey.take_save_request() {
        let _ = save_tx.send(snapshot);
    }
    drop(save_tx);
    if let Err(e) = writer.await {
        tracing::warn!(error = %e, "snapshot writer ended abnormally");
    }
    // The final write failed too; leave the journey dirty for the caller.
    while failed.try_recv().is_ok() {
        journey.mark_dirty();
    }
    journey
}

fn handle(journey: &mut Journey, cmd: Command) -> Vec<Event> {
    match cmd {
        Command::Start => journey.start(),
        Command::Stop => journey.stop(),
        Command::Reset => journey.reset(),
        Command::SetMode(mode) => journey.set_mode(mode),
        Command::SelectEnvironment(id, reply) => respond(journey.select_environment(&id), reply),
        Command::SelectAvatar(id, reply) => respond(journey.select_avatar(&id), reply),
        Command::RecordReflection(reflection, reply) => match journey.record_reflection(reflection) {
            Ok((entry, event)) => {
                let _ = reply.send(Ok(entry));
                vec![event]
            }
            Err(e) => {
                let _ = reply.send(Err(e));
                Vec::new()
            }
        },
        Command::DismissReflection(reply) => match journey.dismiss_reflection() {
            Ok(event) => {
                let _ = reply.send(Ok(()));
                vec![event]
            }
            Err(e) => {
                let _ = reply.send(Err(e));
                Vec::new()
            }
        },
        Command::Snapshot(reply) => {
            let _ = reply.send(journey.snapshot());
            Vec::new()
        }
        Command::State(reply) => {
            let _ = reply.send(journey.state_snapshot());
            Vec::new()
        }
    }
}

fn respond(result: Result<Vec<Event>>, reply: oneshot::Sender<Result<()>>) -> Vec<Event> {
    match result {
        Ok(events) => {
            let _ = reply.send(Ok(()));
            events
        }
        Err(e) => {
            let _ = reply.send(Err(e));
            Vec::new()
        }
    }
}

/// Saves snapshots in order, each on a short blocking task. Only the newest
/// queued snapshot is written; older ones are superseded. Every failed save
/// is reported to the run loop on `failed` and published as an event.
fn spawn_writer<S>(
    store: S,
    mut rx: mpsc::UnboundedReceiver<Snapshot>,
    events: mpsc::UnboundedSender<Event>,
    failed: mpsc::UnboundedSender<()>,
) -> JoinHandle<()>
where
    S: SnapshotStore + Send + 'static,
{
    let store = Arc::new(Mutex::new(store));
    tokio::spawn(async move {
        while let Some(mut snapshot) = rx.recv().await {
            while let Ok(newer) = rx.try_recv() {
                snapshot = newer;
            }
            let store = Arc::clone(&store);
            let result = tokio::task::spawn_blocking(move || {
                let store = store
                    .lock()
                    .map_err(|_| CoreError::persistence("save", "snapshot store lock poisoned"))?;
                store.save(&snapshot)
            })
            .await
            .unwrap_or_else(|e| Err(CoreError::persistence("save", e)));

            if let Err(e) = result {
                tracing::warn!(error = %e, "snapshot save failed");
                let _ = failed.send(());
                let _ = events.send(Event::PersistenceFailed {
                    message: e.to_string(),
                    at: Utc::now(),
                });
            }
        }
    })
}
