use std::sync::Arc;

use thiserror::Error;

use crate::api::server::AppState;
use crate::app::App;
use crate::db::json_store::JsonFileStore;
use crate::util::clock::SystemClock;
use crate::util::env::{Config, EnvErr};
use crate::util::telemetry::{Telemetry, TelemetryErr};

mod api;
mod app;
mod board;
mod constants;
mod db;
mod util;

#[derive(Debug, Error)]
enum RunnerErr {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Env(#[from] EnvErr),

    #[error(transparent)]
    Telemetry(#[from] TelemetryErr),
}

type Result<T> = core::result::Result<T, RunnerErr>;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    let telemetry = Telemetry::new(&config)?.register()?;

    tracing::info!(?config, "starting crewrank");
    if config.rank_channel_id == 0 {
        tracing::warn!("RANK_CHANNEL_ID is unset, leaderboard posts will be ignored");
    }

    let port = config.server_api_port;
    let bridge_token = config.discord_token.clone();
    let store = Arc::new(JsonFileStore::from_config(&config));
    let app = App::new(config, store, Arc::new(SystemClock));

    let (dispatch, dispatcher) = app::dispatch::spawn(app);
    let state = Arc::new(AppState {
        dispatch,
        bridge_token,
    });

    let served = api::server::start_server(port, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = ?e, "failed to listen for ctrl-c");
        }
        tracing::info!("shutdown requested");
    })
    .await;

    // the router held the last dispatch handle, so the dispatcher drains and exits
    _ = dispatcher.await;

    telemetry.shutdown();
    Ok(served?)
}
