mod config;
pub mod database;
mod snapshot;

pub use config::{ClockConfig, Config, DurationsConfig};
pub use database::{Database, SNAPSHOT_KEY};
pub use snapshot::{Snapshot, TimerSnapshot};

use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{CoreError, Result};

/// Key-value persistence for the journey snapshot.
///
/// The core treats every implementation as fail-soft: a failed or empty
/// `load` means first run, a failed `save` leaves the in-memory state
/// authoritative.
pub trait SnapshotStore {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Snapshot>>;
    fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for &S {
    fn load(&self) -> Result<Option<Snapshot>> {
        (**self).load()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        (**self).save(snapshot)
    }
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for Box<S> {
    fn load(&self) -> Result<Option<Snapshot>> {
        (**self).load()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        (**self).save(snapshot)
    }
}

/// In-process store; can be told to fail to exercise degraded paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    snapshot: Option<Snapshot>,
    saves: usize,
    failing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::default();
        store.lock().snapshot = Some(snapshot);
        store
    }

    /// While failing, both `load` and `save` return `PersistenceUnavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    pub fn saved(&self) -> Option<Snapshot> {
        self.lock().snapshot.clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        // A poisoned lock still holds a consistent snapshot.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        let inner = self.lock();
        if inner.failing {
            return Err(CoreError::persistence("load", "memory store unavailable"));
        }
        Ok(inner.snapshot.clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let mut inner = self.lock();
        if inner.failing {
            return Err(CoreError::persistence("save", "memory store unavailable"));
        }
        inner.snapshot = Some(snapshot.clone());
        inner.saves += 1;
        Ok(())
    }
}

/// Returns the data directory.
///
/// `PILGRIM_DATA_DIR` wins when set; otherwise `~/.config/pilgrim`, or
/// `~/.config/pilgrim-dev` with `PILGRIM_ENV=dev`. The directory is created
/// if missing.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("PILGRIM_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("PILGRIM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pilgrim-dev")
            } else {
                base_dir.join("pilgrim")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
