use thiserror::Error;

use crate::db::StoreError;

pub mod aggregator;
pub mod models;
pub mod parser;
pub mod query;
pub mod render;

pub mod prelude {
    pub use crate::board::aggregator::{Aggregator, Ingestion};
    pub use crate::board::parser::LeaderboardParser;
    pub use crate::board::query::Board;
    pub use crate::board::render::Embed;
    pub use crate::board::{BoardError, BoardResult};
}

pub type BoardResult<T> = core::result::Result<T, BoardError>;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("ranking store is empty")]
    NoData,

    #[error("reset needs the exact confirmation word")]
    ConfirmationRequired,

    #[error("command is restricted to administrators")]
    MissingPermission,

    #[error(transparent)]
    Store(#[from] StoreError),
}
