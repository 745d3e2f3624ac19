use std::sync::Arc;

use serde::Deserialize;
use tracing::instrument;

use crate::board::prelude::*;
use crate::board::render;
use crate::db::{DocumentStore, Repository};
use crate::util::clock::Clock;
use crate::util::env::Config;

pub mod dispatch;

/// A chat message as relayed by the host transport
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub channel_id: u64,
    pub is_admin: bool,
    #[serde(default)]
    pub is_bot: bool,
    pub content: String,
}

/// Who is invoking a command
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Invoker {
    pub is_admin: bool,
}

impl Invoker {
    fn require_admin(self) -> BoardResult<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(BoardError::MissingPermission)
        }
    }
}

/// Everything a handler needs, built once at startup.
#[derive(Debug, Clone)]
pub struct App {
    config: Arc<Config>,
    parser: LeaderboardParser,
    aggregator: Aggregator,
    board: Board,
    clock: Arc<dyn Clock>,
}

impl App {
    pub fn new(config: Config, store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        let repo = Repository::new(store);

        Self {
            config: Arc::new(config),
            parser: LeaderboardParser::new(),
            aggregator: Aggregator::new(repo.clone()),
            board: Board::new(repo),
            clock,
        }
    }

    /// Parses and merges a leaderboard post.
    ///
    /// Bot authors, non-admins, other channels and posts without any recognisable rows are all
    /// ignored without error; only a merged batch produces a reply.
    #[instrument(skip(self, message), fields(channel = message.channel_id))]
    pub async fn ingest(&self, message: &IncomingMessage) -> BoardResult<Option<Embed>> {
        if message.is_bot
            || !message.is_admin
            || !self.config.is_rank_channel(message.channel_id)
        {
            tracing::trace!(
                is_bot = message.is_bot,
                is_admin = message.is_admin,
                "message not eligible for ingestion"
            );
            return Ok(None);
        }

        let records = self.parser.parse(&message.content);
        let ingestion = self.aggregator.ingest(records, self.clock.now()).await?;

        Ok(ingestion.map(|Ingestion { date, records }| {
            tracing::debug!(%date, rows = records.len(), "replying to leaderboard post");
            render::ingestion(&records)
        }))
    }

    #[instrument(skip(self))]
    pub async fn top(&self, invoker: Invoker) -> BoardResult<Embed> {
        invoker.require_admin()?;
        let rows = self.board.top().await?;

        Ok(render::top(&rows))
    }

    #[instrument(skip(self))]
    pub async fn full_board(&self, invoker: Invoker) -> BoardResult<Vec<Embed>> {
        invoker.require_admin()?;
        let pages = self.board.full_board().await?;

        Ok(render::board(&pages))
    }

    #[instrument(skip(self, confirm))]
    pub async fn reset(&self, invoker: Invoker, confirm: &str) -> BoardResult<Embed> {
        invoker.require_admin()?;
        self.board.reset(confirm).await?;

        Ok(render::reset())
    }
}

#[cfg(test)]
pub mod test_support {
    use std::sync::Arc;

    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::util::clock::fixed::FixedClock;

    pub const RANK_CHANNEL: u64 = 4242;

    pub fn config() -> Config {
        Config::from_vars([
            ("DISCORD_TOKEN".to_string(), "bridge-secret".to_string()),
            ("RANK_CHANNEL_ID".to_string(), RANK_CHANNEL.to_string()),
        ])
        .unwrap()
    }

    pub fn app() -> (App, Arc<MemoryStore>, Arc<FixedClock>) {
        let store = Arc::new(MemoryStore::default());
        let clock = Arc::new(FixedClock::at(2024, 5, 1, 21));
        let app = App::new(config(), store.clone(), clock.clone());

        (app, store, clock)
    }

    pub fn post(content: &str) -> IncomingMessage {
        IncomingMessage {
            channel_id: RANK_CHANNEL,
            is_admin: true,
            is_bot: false,
            content: content.to_string(),
        }
    }
}
