//! One side of a snapshot stream

use crate::command::{args, Invocation};
use crate::dataset::{Snapshot, Zfs};
use crate::error::Result;
use crate::stream::SendOptions;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::info;

impl Snapshot {
    /// Write this snapshot's stream to `sink`.
    ///
    /// The sink is shut down after the last byte and dropped on failure,
    /// so a reader on the other end always sees end-of-input.
    pub async fn send<W>(&self, cancel: &CancellationToken, options: &SendOptions, sink: W) -> Result<()>
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let invocation = Invocation::zfs(args::send(self.name(), options)).with_stdout(sink);
        self.client().run(cancel, invocation).await?;
        info!("Sent {}", self.name());
        Ok(())
    }
}

impl Zfs {
    /// Apply a stream read from `source` as snapshot `name` and return it
    pub async fn receive_snapshot<R>(&self, cancel: &CancellationToken, source: R, name: &str) -> Result<Snapshot>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let invocation = Invocation::zfs(args::receive(name)).with_stdin(source);
        self.run(cancel, invocation).await?;
        info!("Received {}", name);
        self.get_snapshot(cancel, name).await
    }
}
