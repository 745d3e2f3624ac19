use tracing::instrument;

use super::{BoardError, BoardResult};
use crate::board::models::{Page, RankedEntry, RankingStore};
use crate::constants::{BOARD_PAGE_SIZE, RESET_CONFIRMATION, TOP_LIMIT};
use crate::db::Repository;

/// Every entry ranked by total, highest first; equal totals fall back to tag order.
pub fn ranked(ranking: &RankingStore) -> Vec<RankedEntry> {
    let mut rows: Vec<_> = ranking.iter().collect();
    rows.sort_by(|(tag_a, a), (tag_b, b)| b.total.cmp(&a.total).then_with(|| tag_a.cmp(tag_b)));

    rows.into_iter()
        .enumerate()
        .map(|(i, (tag, entry))| RankedEntry {
            rank: i + 1,
            tag: tag.clone(),
            name: entry.name.clone(),
            total: entry.total,
        })
        .collect()
}

/// Splits already-ranked rows into pages of `size`; the last page may be short but is never
/// empty.
pub fn paginate(rows: Vec<RankedEntry>, size: usize) -> Vec<Page> {
    rows.chunks(size.max(1))
        .enumerate()
        .map(|(i, chunk)| Page {
            number: i + 1,
            entries: chunk.to_vec(),
        })
        .collect()
}

/// Read-only views over the ranking store, plus the reset switch.
#[derive(Debug, Clone)]
pub struct Board {
    repo: Repository,
}

impl Board {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    async fn load_ranked(&self) -> BoardResult<Vec<RankedEntry>> {
        let ranking: RankingStore = self.repo.load().await?;
        if ranking.is_empty() {
            return Err(BoardError::NoData);
        }

        Ok(ranked(&ranking))
    }

    #[instrument(skip(self))]
    pub async fn top(&self) -> BoardResult<Vec<RankedEntry>> {
        let mut rows = self.load_ranked().await?;
        rows.truncate(TOP_LIMIT);

        Ok(rows)
    }

    #[instrument(skip(self))]
    pub async fn full_board(&self) -> BoardResult<Vec<Page>> {
        let rows = self.load_ranked().await?;
        tracing::debug!(entries = rows.len(), "paginating full board");

        Ok(paginate(rows, BOARD_PAGE_SIZE))
    }

    /// Wipes every total. Only the exact confirmation word goes through; the daily log is
    /// left alone either way.
    #[instrument(skip(self, confirm))]
    pub async fn reset(&self, confirm: &str) -> BoardResult<()> {
        if confirm != RESET_CONFIRMATION {
            tracing::info!("reset refused, confirmation missing");
            return Err(BoardError::ConfirmationRequired);
        }

        self.repo.save(&RankingStore::new()).await?;
        tracing::warn!("ranking store reset");

        Ok(())
    }
}
