use crate::app_dirs::AppDirs;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Minimum bar width so empty attempt counts stay legible.
pub const MIN_BAR_PCT: u16 = 7;

/// Attempt numbers above this are only charted once they have a count.
const ALWAYS_SHOWN_ATTEMPTS: u32 = 10;

/// Cross-session statistics, persisted as a single JSON blob. Field names
/// stay camelCase for compatibility with records written by the web client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsRecord {
    pub played: u32,
    pub won: u32,
    pub streak: u32,
    pub max_streak: u32,
    pub distribution: BTreeMap<u32, u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_played: Option<DateTime<Local>>,
}

impl StatsRecord {
    pub fn record_outcome(&mut self, won: bool, attempt: u32) {
        self.played += 1;
        if won {
            self.won += 1;
            self.streak += 1;
            if self.streak > self.max_streak {
                self.max_streak = self.streak;
            }
            *self.distribution.entry(attempt).or_insert(0) += 1;
        } else {
            self.streak = 0;
        }
        self.last_played = Some(Local::now());
    }

    pub fn win_percentage(&self) -> u32 {
        if self.played == 0 {
            return 0;
        }
        ((self.won as f64 / self.played as f64) * 100.0).round() as u32
    }
}

pub trait StatsStore {
    fn load(&self) -> StatsRecord;
    fn save(&self, record: &StatsRecord) -> std::io::Result<()>;

    /// Read-modify-write; the browser-era contract assumes no concurrent
    /// writers for the session's lifetime.
    fn record_outcome(&self, won: bool, attempt: u32) -> std::io::Result<StatsRecord> {
        let mut record = self.load();
        record.record_outcome(won, attempt);
        self.save(&record)?;
        Ok(record)
    }
}

#[derive(Debug, Clone)]
pub struct FileStatsStore {
    path: PathBuf,
}

impl FileStatsStore {
    pub fn new() -> Self {
        let path = AppDirs::stats_path().unwrap_or_else(|| PathBuf::from("codebreaker_stats.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileStatsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsStore for FileStatsStore {
    fn load(&self) -> StatsRecord {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(record) = serde_json::from_slice::<StatsRecord>(&bytes) {
                return record;
            }
        }
        StatsRecord::default()
    }

    fn save(&self, record: &StatsRecord) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(record).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

/// One row of the guess-distribution chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistBar {
    pub attempt: u32,
    pub count: u32,
    /// Width relative to the largest observed count, floored at
    /// [`MIN_BAR_PCT`] for legibility.
    pub width_pct: u16,
}

/// Chart data for attempts 1..=max_attempts. For effectively unbounded games
/// only attempt numbers with recorded counts appear past the first ten.
pub fn distribution_bars(record: &StatsRecord, max_attempts: usize) -> Vec<DistBar> {
    let max_count = record.distribution.values().copied().max().unwrap_or(0).max(1);
    (1..=max_attempts as u32)
        .filter_map(|attempt| {
            let count = record.distribution.get(&attempt).copied().unwrap_or(0);
            if count == 0 && attempt > ALWAYS_SHOWN_ATTEMPTS {
                return None;
            }
            let pct = ((count as f64 / max_count as f64) * 100.0).round() as u16;
            Some(DistBar {
                attempt,
                count,
                width_pct: pct.max(MIN_BAR_PCT),
            })
        })
        .collect()
}
