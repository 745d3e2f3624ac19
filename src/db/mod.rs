use core::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::PrettyFormatter;
use thiserror::Error;
use tracing::instrument;

use crate::board::models::{DailyStore, RankingStore};

pub mod json_store;

#[cfg(test)]
pub mod memory;

/// The two independently persisted documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Ranking,
    Daily,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Ranking => write!(f, "ranking"),
            Slot::Daily => write!(f, "daily"),
        }
    }
}

/// Raw byte storage keyed by slot. Implementations replace a slot's content wholesale on
/// every write and report `None` for a slot that was never written.
#[async_trait]
pub trait DocumentStore: Send + Sync + fmt::Debug {
    async fn read(&self, slot: Slot) -> StoreResult<Option<Vec<u8>>>;
    async fn write(&self, slot: Slot, contents: Vec<u8>) -> StoreResult<()>;
}

/// A whole document living in a fixed slot; `Default` is what a missing slot loads as.
pub trait Document: Serialize + DeserializeOwned + Default + Send + Sync {
    const SLOT: Slot;
}

impl Document for RankingStore {
    const SLOT: Slot = Slot::Ranking;
}

impl Document for DailyStore {
    const SLOT: Slot = Slot::Daily;
}

/// Typed load/save over a [`DocumentStore`].
///
/// There is no locking here: two load/modify/save cycles that overlap end up last-writer-wins.
/// Callers are expected to go through the dispatcher, which handles one event at a time.
#[derive(Debug, Clone)]
pub struct Repository {
    backend: Arc<dyn DocumentStore>,
}

impl Repository {
    pub fn new(backend: Arc<dyn DocumentStore>) -> Self {
        Self { backend }
    }

    #[instrument(skip(self), fields(slot = %D::SLOT))]
    pub async fn load<D: Document>(&self) -> StoreResult<D> {
        match self.backend.read(D::SLOT).await? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
                slot: D::SLOT,
                source,
            }),
            None => {
                tracing::debug!("slot empty, using default document");
                Ok(D::default())
            }
        }
    }

    #[instrument(skip(self, document), fields(slot = %D::SLOT))]
    pub async fn save<D: Document>(&self, document: &D) -> StoreResult<()> {
        let bytes = to_pretty_json(document)?;
        tracing::debug!(bytes = bytes.len(), "writing document");

        self.backend.write(D::SLOT, bytes).await
    }
}

/// Four-space indented JSON with non-ASCII text left as-is, so the files stay hand-editable.
fn to_pretty_json<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;

    Ok(buf)
}

pub type StoreResult<T> = core::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("malformed {slot} document: {source}")]
    Parse {
        slot: Slot,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{slot} store I/O failure: {source}")]
    Io {
        slot: Slot,
        #[source]
        source: std::io::Error,
    },
}
