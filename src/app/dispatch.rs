use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::instrument;

use super::{App, IncomingMessage, Invoker};
use crate::board::prelude::{BoardResult, Embed};

type Reply<T> = oneshot::Sender<BoardResult<T>>;

/// Work for the dispatcher task; each event carries the channel its reply goes back on
#[derive(Debug)]
pub enum BotEvent {
    Message {
        message: IncomingMessage,
        reply: Reply<Option<Embed>>,
    },
    Top {
        invoker: Invoker,
        reply: Reply<Embed>,
    },
    FullBoard {
        invoker: Invoker,
        reply: Reply<Vec<Embed>>,
    },
    Reset {
        invoker: Invoker,
        confirm: String,
        reply: Reply<Embed>,
    },
}

/// Cloneable sender side of the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchHandle {
    tx: UnboundedSender<BotEvent>,
}

impl DispatchHandle {
    pub async fn ingest(
        &self,
        message: IncomingMessage,
    ) -> DispatchResult<BoardResult<Option<Embed>>> {
        self.request(|reply| BotEvent::Message { message, reply }).await
    }

    pub async fn top(&self, invoker: Invoker) -> DispatchResult<BoardResult<Embed>> {
        self.request(|reply| BotEvent::Top { invoker, reply }).await
    }

    pub async fn full_board(&self, invoker: Invoker) -> DispatchResult<BoardResult<Vec<Embed>>> {
        self.request(|reply| BotEvent::FullBoard { invoker, reply }).await
    }

    pub async fn reset(
        &self,
        invoker: Invoker,
        confirm: String,
    ) -> DispatchResult<BoardResult<Embed>> {
        self.request(|reply| BotEvent::Reset {
            invoker,
            confirm,
            reply,
        })
        .await
    }

    async fn request<T>(
        &self,
        event: impl FnOnce(Reply<T>) -> BotEvent,
    ) -> DispatchResult<BoardResult<T>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(event(reply_tx))
            .map_err(|_| DispatchError::Closed)?;

        Ok(reply_rx.await?)
    }
}

/// Starts the task that owns `app`.
///
/// Events are handled strictly one after another, which is the only thing keeping concurrent
/// bridge requests from interleaving their load/save cycles on the store.
pub fn spawn(app: App) -> (DispatchHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel::<BotEvent>();
    let handle = tokio::spawn(run(app, rx));

    (DispatchHandle { tx }, handle)
}

#[instrument(skip_all)]
async fn run(app: App, mut rx: UnboundedReceiver<BotEvent>) {
    tracing::debug!("dispatcher started");

    while let Some(event) = rx.recv().await {
        let delivered = match event {
            BotEvent::Message { message, reply } => reply.send(app.ingest(&message).await).is_ok(),
            BotEvent::Top { invoker, reply } => reply.send(app.top(invoker).await).is_ok(),
            BotEvent::FullBoard { invoker, reply } => {
                reply.send(app.full_board(invoker).await).is_ok()
            }
            BotEvent::Reset {
                invoker,
                confirm,
                reply,
            } => reply.send(app.reset(invoker, &confirm).await).is_ok(),
        };

        if !delivered {
            tracing::warn!("requester went away before its reply was ready");
        }
    }

    tracing::debug!("all dispatch handles dropped, dispatcher stopping");
}

pub type DispatchResult<T> = core::result::Result<T, DispatchError>;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dispatcher is not running")]
    Closed,

    #[error(transparent)]
    Dropped(#[from] oneshot::error::RecvError),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::app::test_support::*;
    use crate::board::BoardError;

    const ADMIN: Invoker = Invoker { is_admin: true };

    #[tokio::test]
    async fn test_round_trip_through_dispatcher() {
        let (app, _, _) = app();
        let (handle, _task) = spawn(app);

        let board = "Tên Crew\n1 [ABC] Alpha\n2 [XYZ] Zeta\nĐiểm\n30\n40";
        let reply = handle.ingest(post(board)).await.unwrap().unwrap();
        assert!(reply.is_some());

        let top = handle.top(ADMIN).await.unwrap().unwrap();
        assert!(top.description.starts_with("**1. [XYZ] Zeta**"));

        let err = handle
            .reset(ADMIN, "no".to_string())
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, BoardError::ConfirmationRequired));
    }

    #[tokio::test]
    async fn test_concurrent_ingestions_do_not_lose_points() {
        let (app, _, _) = app();
        let (handle, _task) = spawn(app);

        let board = "Tên Crew\n1 [ABC] Alpha\nĐiểm\n10";
        let (a, b, c) = tokio::join!(
            handle.ingest(post(board)),
            handle.ingest(post(board)),
            handle.ingest(post(board)),
        );

        for res in [a, b, c] {
            assert!(res.unwrap().unwrap().is_some());
        }

        let top = handle.top(ADMIN).await.unwrap().unwrap();
        assert_eq!(top.description, "**1. [ABC] Alpha** — **30** điểm\n");
    }

    #[tokio::test]
    async fn test_closed_dispatcher() {
        let (app, _, _) = app();
        let (handle, task) = spawn(app);
        task.abort();
        let _ = task.await;

        assert!(matches!(
            handle.top(ADMIN).await,
            Err(DispatchError::Closed)
        ));
    }
}
