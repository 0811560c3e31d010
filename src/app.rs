use crate::api::ActivityApi;
use crate::board::ActivityBoard;
use crate::models::{ClickTarget, Outcome};
use crate::view::BoardView;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info};

/// Host events the board listens for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    /// The signup form was submitted.
    Submit,
    /// A click landed somewhere inside the activity list.
    Click(ClickTarget),
}

pub async fn dispatch<A: ActivityApi, V: BoardView>(
    board: &ActivityBoard<A, V>,
    event: BoardEvent,
) -> Option<Outcome> {
    match event {
        BoardEvent::Submit => Some(board.submit_signup().await),
        BoardEvent::Click(target) => board.handle_click(&target).await,
    }
}

/// Starts the initial catalog load and handles events until the sender side
/// closes. The load and every event run on their own tasks, so nothing waits
/// behind an in-flight request and the last catalog to arrive is the one
/// rendered.
pub async fn run<A: ActivityApi, V: BoardView>(
    board: ActivityBoard<A, V>,
    mut events: mpsc::Receiver<BoardEvent>,
) {
    let mut handlers = JoinSet::new();
    let initial = board.clone();
    handlers.spawn(async move {
        initial.load_catalog().await;
        None
    });

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    break;
                };
                debug!(?event, "dispatching event");
                let board = board.clone();
                handlers.spawn(async move { dispatch(&board, event).await });
            }
            Some(done) = handlers.join_next(), if !handlers.is_empty() => reap(done),
        }
    }

    while let Some(done) = handlers.join_next().await {
        reap(done);
    }
    info!("event source closed");
}

fn reap(done: Result<Option<Outcome>, JoinError>) {
    match done {
        Ok(Some(outcome)) => debug!(?outcome, "event handled"),
        Ok(None) => {}
        Err(err) => error!("event handler failed: {err}"),
    }
}
