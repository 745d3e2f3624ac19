use chrono::{DateTime, FixedOffset};
use tracing::instrument;

use crate::board::models::{DailyStore, LeaderboardRecord, RankingEntry, RankingStore};
use crate::db::{Repository, StoreResult};
use crate::util::clock::date_key;

/// Result of a merged batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingestion {
    pub date: String,
    pub records: Vec<LeaderboardRecord>,
}

/// Folds `records` into both stores in memory.
///
/// The day's log entry is replaced outright; totals only ever grow. A tag seen for the first
/// time keeps the name it arrived with, later batches don't rename it.
pub fn merge(
    ranking: &mut RankingStore,
    daily: &mut DailyStore,
    records: &[LeaderboardRecord],
    date: String,
) {
    daily.insert(date, records.to_vec());

    for record in records {
        ranking
            .entry(record.tag.clone())
            .or_insert_with(|| RankingEntry::new(record.name.clone()))
            .add(record.point);
    }
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    repo: Repository,
}

impl Aggregator {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Loads both stores, merges the batch and writes both back once. An empty batch touches
    /// nothing and returns `None`.
    ///
    /// The two writes are independent; if the second fails the ranking file already holds the
    /// new totals.
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub async fn ingest(
        &self,
        records: Vec<LeaderboardRecord>,
        now: DateTime<FixedOffset>,
    ) -> StoreResult<Option<Ingestion>> {
        if records.is_empty() {
            tracing::debug!("empty batch, nothing to merge");
            return Ok(None);
        }

        let mut ranking: RankingStore = self.repo.load().await?;
        let mut daily: DailyStore = self.repo.load().await?;

        let date = date_key(now);
        merge(&mut ranking, &mut daily, &records, date.clone());

        self.repo.save(&ranking).await?;
        self.repo.save(&daily).await?;

        tracing::info!(%date, crews = ranking.len(), "leaderboard merged");
        Ok(Some(Ingestion { date, records }))
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::db::{Slot, StoreError};
    use crate::db::memory::MemoryStore;
    use crate::util::clock::Clock;
    use crate::util::clock::fixed::FixedClock;

    fn record(tag: &str, name: &str, point: u64) -> LeaderboardRecord {
        LeaderboardRecord {
            tag: tag.to_string(),
            name: name.to_string(),
            level: 1,
            point,
        }
    }

    fn aggregator() -> (Arc<MemoryStore>, Repository, Aggregator) {
        let store = Arc::new(MemoryStore::default());
        let repo = Repository::new(store.clone());
        (store, repo.clone(), Aggregator::new(repo))
    }

    #[test]
    fn test_merge_creates_and_accumulates() {
        let mut ranking = RankingStore::new();
        let mut daily = DailyStore::new();

        let batch = vec![record("ABC", "Alpha", 100), record("XYZ", "Zeta", 50)];
        merge(&mut ranking, &mut daily, &batch, "2024-05-01".into());
        merge(&mut ranking, &mut daily, &batch, "2024-05-02".into());

        assert_eq!(ranking["ABC"].total, 200);
        assert_eq!(ranking["XYZ"].total, 100);
        assert_eq!(daily.len(), 2);
    }

    #[test]
    fn test_merge_keeps_first_name() {
        let mut ranking = RankingStore::new();
        let mut daily = DailyStore::new();

        let batch = vec![record("ABC", "Alpha", 10), record("ABC", "Alpha Renamed", 5)];
        merge(&mut ranking, &mut daily, &batch, "2024-05-01".into());

        assert_eq!(ranking["ABC"].name, "Alpha");
        assert_eq!(ranking["ABC"].total, 15);
        assert_eq!(daily["2024-05-01"].len(), 2);
    }

    #[test]
    fn test_totals_never_decrease() {
        let mut ranking = RankingStore::new();
        let mut daily = DailyStore::new();
        let mut last = 0;

        for point in [0, 7, 0, u64::MAX, 3] {
            merge(
                &mut ranking,
                &mut daily,
                &[record("ABC", "Alpha", point)],
                "2024-05-01".into(),
            );

            let total = ranking["ABC"].total;
            assert!(total >= last);
            last = total;
        }

        assert_eq!(last, u64::MAX);
    }

    #[tokio::test]
    async fn test_two_days_accumulate() {
        let (_, repo, agg) = aggregator();
        let clock = FixedClock::at(2024, 5, 1, 20);

        agg.ingest(vec![record("ABC", "Alpha Team", 100)], clock.now())
            .await
            .unwrap();
        clock.advance_days(1);
        agg.ingest(vec![record("ABC", "Alpha Team", 100)], clock.now())
            .await
            .unwrap();

        let ranking: RankingStore = repo.load().await.unwrap();
        let daily: DailyStore = repo.load().await.unwrap();

        assert_eq!(ranking["ABC"].total, 200);
        assert_eq!(
            daily.keys().cloned().collect::<Vec<_>>(),
            vec!["2024-05-01".to_string(), "2024-05-02".to_string()]
        );
        assert!(daily.values().all(|day| day.len() == 1));
    }

    #[tokio::test]
    async fn test_same_day_replaces_log_but_adds_totals() {
        let (_, repo, agg) = aggregator();
        let clock = FixedClock::at(2024, 5, 1, 9);

        agg.ingest(
            vec![record("ABC", "Alpha", 10), record("XYZ", "Zeta", 20)],
            clock.now(),
        )
        .await
        .unwrap();
        let second = agg
            .ingest(vec![record("ABC", "Alpha", 5)], clock.now())
            .await
            .unwrap()
            .unwrap();

        let ranking: RankingStore = repo.load().await.unwrap();
        let daily: DailyStore = repo.load().await.unwrap();

        assert_eq!(second.date, "2024-05-01");
        assert_eq!(ranking["ABC"].total, 15);
        assert_eq!(ranking["XYZ"].total, 20);
        assert_eq!(daily["2024-05-01"], vec![record("ABC", "Alpha", 5)]);
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let (store, _, agg) = aggregator();
        let clock = FixedClock::at(2024, 5, 1, 9);

        assert!(agg.ingest(Vec::new(), clock.now()).await.unwrap().is_none());
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_single_write_per_store() {
        let (store, _, agg) = aggregator();
        let clock = FixedClock::at(2024, 5, 1, 9);

        let batch = (0..5).map(|i| record(&format!("T{i}"), "x", i)).collect();
        agg.ingest(batch, clock.now()).await.unwrap();

        assert_eq!(store.writes(), vec![Slot::Ranking, Slot::Daily]);
    }

    #[tokio::test]
    async fn test_malformed_ranking_aborts_without_writes() {
        let (store, _, agg) = aggregator();
        store.put(Slot::Ranking, b"[1, 2".to_vec());
        let clock = FixedClock::at(2024, 5, 1, 9);

        let res = agg.ingest(vec![record("ABC", "Alpha", 1)], clock.now()).await;

        assert!(res.is_err());
        assert!(store.writes().is_empty());
        assert!(store.get(Slot::Daily).is_none());
    }

    #[tokio::test]
    async fn test_malformed_daily_leaves_ranking_untouched() {
        let (store, repo, agg) = aggregator();
        let clock = FixedClock::at(2024, 5, 1, 9);

        agg.ingest(vec![record("ABC", "Alpha", 10)], clock.now())
            .await
            .unwrap();
        let ranking_before = store.get(Slot::Ranking).unwrap();
        let writes_before = store.writes().len();

        store.put(Slot::Daily, b"{\"2024-05-01\": [".to_vec());
        let res = agg.ingest(vec![record("ABC", "Alpha", 5)], clock.now()).await;

        assert!(matches!(
            res,
            Err(StoreError::Parse {
                slot: Slot::Daily,
                ..
            })
        ));
        assert_eq!(store.writes().len(), writes_before);
        assert_eq!(store.get(Slot::Ranking).unwrap(), ranking_before);
        assert_eq!(repo.load::<RankingStore>().await.unwrap()["ABC"].total, 10);
    }
}
