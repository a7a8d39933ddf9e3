//! Concurrent send/receive
//!
//! A transfer runs the send and receive invocations as two spawned tasks
//! joined by a [`pipe`]. Both share a child of the caller's token: when
//! either side fails it cancels that child so its sibling is killed
//! instead of blocking on a pipe end nobody services. Dropping the
//! transfer future cancels it as well.

use crate::dataset::Snapshot;
use crate::error::{Error, Result};
use crate::stream::{pipe, SendOptions};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

impl Snapshot {
    /// Stream this snapshot into a new snapshot named `target`.
    ///
    /// On failure the first real error wins: an invocation or stream
    /// error is preferred over the cancellation it caused on the other
    /// side, and the send side is preferred when both failed on their own.
    pub async fn transfer_to(
        &self,
        cancel: &CancellationToken,
        options: &SendOptions,
        target: &str,
    ) -> Result<Snapshot> {
        let scope = cancel.child_token();
        let _guard = scope.clone().drop_guard();
        let (writer, reader) = pipe(self.client().pipe_capacity());

        info!("Transferring {} to {}", self.name(), target);

        let sender = {
            let snapshot = self.clone();
            let options = options.clone();
            let scope = scope.clone();
            tokio::spawn(async move {
                let result = snapshot.send(&scope, &options, writer).await;
                if result.is_err() {
                    scope.cancel();
                }
                result
            })
        };

        let receiver = {
            let zfs = self.client().clone();
            let target = target.to_string();
            let scope = scope.clone();
            tokio::spawn(async move {
                let result = zfs.receive_snapshot(&scope, reader, &target).await;
                if result.is_err() {
                    scope.cancel();
                }
                result
            })
        };

        let (sent, received) = tokio::join!(sender, receiver);
        let sent = flatten(sent);
        let received = flatten(received);

        match (sent, received) {
            (Ok(()), Ok(snapshot)) => Ok(snapshot),
            (Err(e), Ok(_)) | (Ok(()), Err(e)) => {
                warn!("Transfer of {} to {} failed: {}", self.name(), target, e);
                Err(e)
            }
            (Err(send), Err(receive)) => {
                let e = if send.is_cancellation() && !receive.is_cancellation() {
                    receive
                } else {
                    send
                };
                warn!("Transfer of {} to {} failed: {}", self.name(), target, e);
                Err(e)
            }
        }
    }
}

fn flatten<T>(joined: std::result::Result<Result<T>, JoinError>) -> Result<T> {
    joined.map_err(|e| Error::Task(e.to_string()))?
}
