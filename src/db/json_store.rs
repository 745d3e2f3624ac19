use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;

use super::{DocumentStore, Slot, StoreError, StoreResult};
use crate::util::env::Config;

/// One JSON file per slot.
///
/// Writes go to a `.tmp` sibling first and are renamed over the target, so a reader sees either
/// the old document or the new one.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    rank_file: PathBuf,
    daily_file: PathBuf,
}

impl JsonFileStore {
    pub fn new(rank_file: impl Into<PathBuf>, daily_file: impl Into<PathBuf>) -> Self {
        Self {
            rank_file: rank_file.into(),
            daily_file: daily_file.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.rank_file.clone(), config.daily_file.clone())
    }

    pub fn path(&self, slot: Slot) -> &Path {
        match slot {
            Slot::Ranking => &self.rank_file,
            Slot::Daily => &self.daily_file,
        }
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    #[instrument(skip(self), fields(path = ?self.path(slot)))]
    async fn read(&self, slot: Slot) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(self.path(slot)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { slot, source }),
        }
    }

    #[instrument(skip(self, contents), fields(path = ?self.path(slot)))]
    async fn write(&self, slot: Slot, contents: Vec<u8>) -> StoreResult<()> {
        let io = |source| StoreError::Io { slot, source };
        let path = self.path(slot);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(io)?;
        }

        let temp_path = temp_path(path);
        let mut temp_file = fs::File::create(&temp_path).await.map_err(io)?;
        temp_file.write_all(&contents).await.map_err(io)?;
        temp_file.sync_all().await.map_err(io)?;
        drop(temp_file);

        fs::rename(&temp_path, path).await.map_err(io)?;

        Ok(())
    }
}

/// `ranking.json` -> `ranking.json.tmp`, so two slots never share a temp file
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::board::models::{RankingEntry, RankingStore};
    use crate::db::Repository;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_absent_files_read_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("r.json"), dir.path().join("d.json"));

        assert!(store.read(Slot::Ranking).await.unwrap().is_none());
        assert!(store.read(Slot::Daily).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let rank_path = dir.path().join("nested").join("ranking.json");
        let store = JsonFileStore::new(rank_path.clone(), dir.path().join("daily.json"));

        store
            .write(Slot::Ranking, b"{\"long\": \"aaaaaaaaaaaaaaaa\"}".to_vec())
            .await
            .unwrap();
        store.write(Slot::Ranking, b"{}".to_vec()).await.unwrap();

        assert_eq!(std::fs::read(&rank_path).unwrap(), b"{}");
        assert!(!temp_path(&rank_path).exists());
        assert!(!dir.path().join("daily.json").exists());
    }

    #[tokio::test]
    async fn test_slots_sharing_a_stem_keep_separate_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let rank_path = dir.path().join("board.json");
        let daily_path = dir.path().join("board.tmp");
        let store = JsonFileStore::new(rank_path.clone(), daily_path.clone());

        store.write(Slot::Daily, b"{\"daily\": []}".to_vec()).await.unwrap();
        store.write(Slot::Ranking, b"{}".to_vec()).await.unwrap();

        assert_eq!(std::fs::read(&daily_path).unwrap(), b"{\"daily\": []}");
        assert_eq!(std::fs::read(&rank_path).unwrap(), b"{}");
        assert_eq!(temp_path(&rank_path), dir.path().join("board.json.tmp"));
    }

    #[tokio::test]
    async fn test_repository_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileStore::new(dir.path().join("r.json"), dir.path().join("d.json"));
        let repo = Repository::new(Arc::new(backend));

        let mut ranking = RankingStore::new();
        ranking.insert(
            "XYZ".to_string(),
            RankingEntry {
                name: "Zeta".to_string(),
                total: 42,
            },
        );

        repo.save(&ranking).await.unwrap();
        let reloaded: RankingStore = repo.load().await.unwrap();
        assert_eq!(reloaded, ranking);

        repo.save(&reloaded).await.unwrap();
        assert_eq!(repo.load::<RankingStore>().await.unwrap(), ranking);
    }

    #[tokio::test]
    async fn test_garbage_on_disk_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let rank_path = dir.path().join("r.json");
        std::fs::write(&rank_path, "not json").unwrap();

        let repo = Repository::new(Arc::new(JsonFileStore::new(
            rank_path.clone(),
            dir.path().join("d.json"),
        )));

        let err = repo.load::<RankingStore>().await.unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
        assert_eq!(std::fs::read_to_string(&rank_path).unwrap(), "not json");
    }
}
