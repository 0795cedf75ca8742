pub mod config;
pub mod journal;
pub mod progress;
pub mod timer;

use pilgrim_core::{Config, Database, Journey};
use serde::Serialize;

/// Everything a one-shot command needs: config, store and the restored journey.
pub struct Session {
    pub config: Config,
    pub db: Database,
    pub journey: Journey,
}

impl Session {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load_or_default();
        let db = Database::open()?;
        let journey = Journey::restore(&db, &config)?;
        Ok(Self { config, db, journey })
    }

    /// Persist whatever changed.
    pub fn close(mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.journey.flush(&self.db)?;
        Ok(())
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
