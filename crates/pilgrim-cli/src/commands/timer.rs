use std::future::Future;
use std::time::Duration;

use clap::Subcommand;
use pilgrim_core::views::{format_clock, phase_label};
use pilgrim_core::{Event, Mode, RunnerHandle, SessionRunner};
use tokio::sync::mpsc::UnboundedReceiver;

use super::{print_json, Session};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Print current timer state as JSON
    Status,
    /// Start the current phase and run the clock until it completes (Ctrl-C stops)
    Run {
        /// Don't draw the countdown on stderr
        #[arg(long)]
        quiet: bool,
    },
    /// Advance the current phase by a number of seconds
    Tick {
        #[arg(long, default_value = "1")]
        count: u64,
    },
    /// Finish the current phase now
    Complete,
    /// Back to a full-length, stopped focus phase
    Reset,
    /// Switch duration table (resets the current phase)
    Mode {
        /// standard or accelerated
        mode: Mode,
    },
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open()?;
    let journey = &mut session.journey;

    match action {
        TimerAction::Run { quiet } => return run_clock(session, quiet),
        TimerAction::Status => {
            print_json(&journey.state_snapshot())?;
        }
        TimerAction::Tick { count } => {
            let mut events = journey.start();
            for _ in 0..count {
                events.extend(journey.tick());
                if !journey.is_running() {
                    break;
                }
            }
            // A one-shot process can't keep the clock alive.
            events.extend(journey.stop());
            events.push(journey.state_snapshot());
            print_json(&events)?;
        }
        TimerAction::Complete => {
            let events = journey.complete_phase();
            print_json(&events)?;
        }
        TimerAction::Reset => {
            print_json(&journey.reset())?;
        }
        TimerAction::Mode { mode } => {
            print_json(&journey.set_mode(mode))?;
        }
    }

    session.close()
}

/// Drive the async runner in the foreground until the phase finishes.
fn run_clock(session: Session, quiet: bool) -> Result<(), Box<dyn std::error::Error>> {
    let Session { config, db, journey } = session;
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async move {
        let period = config.tick_period();
        let (handle, mut events, task) = SessionRunner::spawn(journey, db, period);
        let state = drive(&handle, &mut events, tokio::signal::ctrl_c(), period, quiet).await?;

        drop(handle);
        let journey = task.join().await?;
        // Anything emitted while stopping.
        while let Ok(ev) = events.try_recv() {
            println!("{}", serde_json::to_string(&ev)?);
        }
        if !quiet {
            eprintln!();
        }
        println!("{}", serde_json::to_string(&state)?);
        tracing::debug!(focus = journey.session().completed_focus_count, "clock stopped");
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

/// Start the timer and print events until the phase completes or
/// `shutdown` resolves, which stops the timer. Returns the final state.
async fn drive<F: Future>(
    handle: &RunnerHandle,
    events: &mut UnboundedReceiver<Event>,
    shutdown: F,
    period: Duration,
    quiet: bool,
) -> Result<Event, Box<dyn std::error::Error>> {
    tokio::pin!(shutdown);
    handle.start()?;

    let mut redraw = tokio::time::interval(period);
    loop {
        tokio::select! {
            ev = events.recv() => {
                let Some(ev) = ev else { break };
                if let Event::PersistenceFailed { message, .. } = &ev {
                    tracing::warn!(%message, "progress not saved");
                }
                if !quiet {
                    eprintln!();
                }
                println!("{}", serde_json::to_string(&ev)?);
                if ev.is_phase_completed() {
                    break;
                }
            }
            _ = redraw.tick(), if !quiet => {
                if let Event::StateSnapshot { phase, remaining_secs, .. } = handle.state().await? {
                    eprint!("\r{} {}", phase_label(phase), format_clock(remaining_secs));
                }
            }
            _ = &mut shutdown => {
                handle.stop()?;
                break;
            }
        }
    }

    Ok(handle.state().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilgrim_core::{DurationTables, Journey, MemoryStore, Phase, UnlockCatalog};

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_the_running_phase() {
        let (handle, mut events, task) =
            SessionRunner::spawn(Journey::default(), MemoryStore::new(), Duration::from_secs(1));
        let shutdown = tokio::time::sleep(Duration::from_millis(3500));

        let state = drive(&handle, &mut events, shutdown, Duration::from_secs(1), true)
            .await
            .unwrap();
        match state {
            Event::StateSnapshot { is_running, remaining_secs, .. } => {
                assert!(!is_running);
                assert_eq!(remaining_secs, 1500 - 3);
            }
            other => panic!("unexpected {other:?}"),
        }
        drop(handle);
        task.join().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn completion_ends_the_run() {
        let journey =
            Journey::new(DurationTables::default(), Mode::Accelerated, UnlockCatalog::journey());
        let (handle, mut events, task) =
            SessionRunner::spawn(journey, MemoryStore::new(), Duration::from_secs(1));

        let state = drive(&handle, &mut events, std::future::pending::<()>(), Duration::from_secs(1), true)
            .await
            .unwrap();
        match state {
            Event::StateSnapshot { phase, completed_focus_count, reflection_pending, .. } => {
                assert_eq!(phase, Phase::ShortRest);
                assert_eq!(completed_focus_count, 1);
                assert!(reflection_pending);
            }
            other => panic!("unexpected {other:?}"),
        }
        drop(handle);
        task.join().await.unwrap();
    }
}
