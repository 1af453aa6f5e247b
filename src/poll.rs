//! Live views: re-render on a timer, back off on failure, wake on refresh.

use std::{future::Future, time::Duration};

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::view::Refresh;

pub const PROFILE_POLL: Duration = Duration::from_secs(5);
/// While the account has no profile yet.
pub const PROFILE_CHECK_POLL: Duration = Duration::from_secs(3);
pub const MESSAGE_POLL: Duration = Duration::from_secs(5);
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Backoff {
        Backoff { base, max, current: base }
    }

    /// Takes effect from the next successful poll.
    pub fn rebase(&mut self, base: Duration) {
        self.base = base;
    }

    /// Delay before the next poll.
    pub fn next(&mut self, success: bool) -> Duration {
        self.current = if success {
            self.base
        } else {
            (self.current * 2).min(self.max)
        };
        self.current
    }
}

/// One rendering of a live view.
#[derive(Debug, Clone)]
pub struct Frame {
    pub html: String,
    pub ok: bool,
    /// Poll interval while things go well.
    pub every: Duration,
}

/// Sleeps for `delay`, returning early on a refresh that `wakes` accepts.
pub async fn wait(
    refresh: &mut broadcast::Receiver<Refresh>,
    delay: Duration,
    wakes: &impl Fn(&Refresh) -> bool,
) {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return,
            received = refresh.recv() => match received {
                Ok(notice) if wakes(&notice) => return,
                Ok(_) => {}
                // missed some, one of them may have been ours
                Err(RecvError::Lagged(_)) => return,
                Err(RecvError::Closed) => {
                    (&mut sleep).await;
                    return;
                }
            }
        }
    }
}

/// Drives a websocket until the client goes away. Frames are only sent when
/// the rendered html changed.
pub async fn live<R, F>(
    socket: WebSocket,
    mut refresh: broadcast::Receiver<Refresh>,
    wakes: impl Fn(&Refresh) -> bool,
    mut render: R,
) where
    R: FnMut() -> F,
    F: Future<Output = Frame>,
{
    let (mut sender, mut receiver) = socket.split();
    let mut backoff = Backoff::new(MESSAGE_POLL, MAX_BACKOFF);
    let mut last: Option<String> = None;

    loop {
        let frame = render().await;
        backoff.rebase(frame.every);
        let delay = backoff.next(frame.ok);
        if !frame.ok {
            warn!(retry_in = ?delay, "live view poll failed");
        }

        if last.as_ref() != Some(&frame.html) {
            if sender.send(Message::Text(frame.html.clone().into())).await.is_err() {
                break;
            }
            last = Some(frame.html);
        }

        let waiting = wait(&mut refresh, delay, &wakes);
        tokio::pin!(waiting);
        loop {
            tokio::select! {
                _ = &mut waiting => break,
                msg = receiver.next() => match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                        debug!("live view closed");
                        return;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}
