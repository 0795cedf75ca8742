use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of interval currently being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    ShortRest,
    LongRest,
}

impl Phase {
    pub fn is_rest(self) -> bool {
        !matches!(self, Phase::Work)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Work => "work",
            Phase::ShortRest => "short_rest",
            Phase::LongRest => "long_rest",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selects which duration table drives the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Standard,
    /// Seconds-long phases, for trying the journey out quickly.
    Accelerated,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Standard => f.write_str("standard"),
            Mode::Accelerated => f.write_str("accelerated"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "normal" => Ok(Mode::Standard),
            "accelerated" | "pilgrimage" => Ok(Mode::Accelerated),
            other => Err(format!("unknown mode '{other}' (expected standard or accelerated)")),
        }
    }
}

/// Phase durations in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationTable {
    pub work: u64,
    pub short_rest: u64,
    pub long_rest: u64,
}

impl DurationTable {
    pub const fn standard() -> Self {
        Self {
            work: 25 * 60,
            short_rest: 5 * 60,
            long_rest: 15 * 60,
        }
    }

    pub const fn accelerated() -> Self {
        Self {
            work: 5,
            short_rest: 3,
            long_rest: 8,
        }
    }

    pub fn seconds(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Work => self.work,
            Phase::ShortRest => self.short_rest,
            Phase::LongRest => self.long_rest,
        }
    }

    /// Name of the first zero-length phase, if any.
    pub fn zero_phase(&self) -> Option<Phase> {
        [Phase::Work, Phase::ShortRest, Phase::LongRest]
            .into_iter()
            .find(|p| self.seconds(*p) == 0)
    }
}

/// The two fixed tables, one per [`Mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationTables {
    pub standard: DurationTable,
    pub accelerated: DurationTable,
}

impl DurationTables {
    pub fn for_mode(&self, mode: Mode) -> &DurationTable {
        match mode {
            Mode::Standard => &self.standard,
            Mode::Accelerated => &self.accelerated,
        }
    }
}

impl Default for DurationTables {
    fn default() -> Self {
        Self {
            standard: DurationTable::standard(),
            accelerated: DurationTable::accelerated(),
        }
    }
}
