use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One crew row lifted out of a posted leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardRecord {
    pub tag: String,
    pub name: String,
    #[serde(default)]
    pub level: u64,
    pub point: u64,
}

/// Running total for a single tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub name: String,
    pub total: u64,
}

impl RankingEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            total: 0,
        }
    }

    pub fn add(&mut self, point: u64) {
        self.total = self.total.saturating_add(point);
    }
}

/// tag -> running total
pub type RankingStore = BTreeMap<String, RankingEntry>;

/// `YYYY-MM-DD` -> the records of that day's (latest) ingestion
pub type DailyStore = BTreeMap<String, Vec<LeaderboardRecord>>;

/// A row in a sorted view of the ranking store; `rank` starts at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub tag: String,
    pub name: String,
    pub total: u64,
}

/// A fixed-size slice of the full board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: usize,
    pub entries: Vec<RankedEntry>,
}
