//! Command Executor
//!
//! Spawns one external tool invocation, wires its standard streams, and
//! waits for it to exit while honouring cancellation and the configured
//! timeout.
//!
//! Standard input is fed from a separate task so a child that exits
//! without draining its input never blocks the caller. Standard output
//! and standard error are drained concurrently with the exit wait.

use crate::command::invocation::{CommandOutput, Input, Invocation, Output, Tool};
use crate::config::{ToolCommand, ZfsConfig};
use crate::domain::ports::{CommandLoggerRef, CommandRunner, NoopLogger};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Instrument};
use uuid::Uuid;

// =============================================================================
// Executor
// =============================================================================

/// Runs invocations as child processes
pub struct Executor {
    config: ZfsConfig,
    logger: CommandLoggerRef,
}

impl Executor {
    /// Create an executor that logs nowhere
    pub fn new(config: ZfsConfig) -> Self {
        Self::with_logger(config, Arc::new(NoopLogger))
    }

    /// Create an executor reporting every invocation to `logger`
    pub fn with_logger(config: ZfsConfig, logger: CommandLoggerRef) -> Self {
        Self { config, logger }
    }

    pub fn config(&self) -> &ZfsConfig {
        &self.config
    }

    fn tool(&self, tool: Tool) -> &ToolCommand {
        match tool {
            Tool::Zfs => &self.config.zfs,
            Tool::Zpool => &self.config.zpool,
        }
    }

    /// Run an invocation to completion
    pub async fn execute(
        &self,
        cancel: &CancellationToken,
        invocation: Invocation,
    ) -> Result<CommandOutput> {
        let tool = self.tool(invocation.tool);
        let program = tool.program.clone();
        let argv: Vec<String> = tool
            .prefix_args
            .iter()
            .chain(invocation.args.iter())
            .cloned()
            .collect();
        let command_line = format!("{} {}", program.display(), argv.join(" "));

        let id = Uuid::new_v4().to_string();
        let tag = format!("ID:{}", id);
        self.logger
            .log(&[tag.clone(), "START".to_string(), command_line.clone()]);
        let _finish = FinishLog {
            logger: &self.logger,
            tag,
        };

        let span = tracing::debug_span!("command", id = %id, tool = %invocation.tool);
        let result = async {
            debug!(command = %command_line, "starting");
            let result = self
                .spawn_and_wait(
                    cancel,
                    Command::new(&program),
                    &argv,
                    invocation.stdin,
                    invocation.stdout,
                    &command_line,
                )
                .await;
            match &result {
                Ok(_) => debug!("finished"),
                Err(e) => debug!(error = %e, "failed"),
            }
            result
        }
        .instrument(span)
        .await;

        result
    }

    async fn spawn_and_wait(
        &self,
        cancel: &CancellationToken,
        mut command: Command,
        argv: &[String],
        stdin: Input,
        stdout: Output,
        command_line: &str,
    ) -> Result<CommandOutput> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled {
                command: command_line.to_string(),
            });
        }

        let stdin_mode = match stdin {
            Input::Null => Stdio::null(),
            _ => Stdio::piped(),
        };

        command
            .args(argv)
            .stdin(stdin_mode)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| Error::Command {
            command: command_line.to_string(),
            stderr: String::new(),
            reason: format!("failed to spawn: {}", e),
        })?;

        let feeder = child
            .stdin
            .take()
            .map(|pipe| FeedTask(tokio::spawn(feed_stdin(stdin, pipe))));
        let child_stdout = child.stdout.take();
        let child_stderr = child.stderr.take();

        let timeout = self.config.command_timeout();
        let outcome = {
            let work = async {
                tokio::join!(
                    drain_stdout(child_stdout, stdout),
                    collect_stderr(child_stderr),
                    child.wait()
                )
            };
            let deadline = async {
                match timeout {
                    Some(after) => tokio::time::sleep(after).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                done = work => Outcome::Finished(done),
                _ = cancel.cancelled() => Outcome::Cancelled,
                _ = deadline => Outcome::TimedOut,
            }
        };

        let (stdout, stderr, status) = match outcome {
            Outcome::Finished(done) => done,
            Outcome::Cancelled => {
                terminate(&mut child).await;
                return Err(Error::Cancelled {
                    command: command_line.to_string(),
                });
            }
            Outcome::TimedOut => {
                terminate(&mut child).await;
                return Err(Error::Timeout {
                    command: command_line.to_string(),
                    after: timeout.unwrap_or_default(),
                });
            }
        };

        let status = status.map_err(|e| Error::Command {
            command: command_line.to_string(),
            stderr: String::new(),
            reason: format!("failed to wait: {}", e),
        })?;
        let stderr = String::from_utf8_lossy(&stderr.unwrap_or_default()).into_owned();
        let fed = match feeder {
            Some(task) => task.finish().await,
            None => Ok(()),
        };

        if !status.success() {
            return Err(Error::Command {
                command: command_line.to_string(),
                stderr,
                reason: status.to_string(),
            });
        }

        let stdout = stdout.map_err(|source| Error::Stream {
            command: command_line.to_string(),
            source,
        })?;

        if let Err(source) = fed {
            // the child exits once it has read what it needs
            if source.kind() != io::ErrorKind::BrokenPipe {
                return Err(Error::Stream {
                    command: command_line.to_string(),
                    source,
                });
            }
        }

        Ok(CommandOutput::new(
            String::from_utf8_lossy(&stdout).into_owned(),
        ))
    }
}

#[async_trait]
impl CommandRunner for Executor {
    async fn run(
        &self,
        cancel: &CancellationToken,
        invocation: Invocation,
    ) -> Result<CommandOutput> {
        self.execute(cancel, invocation).await
    }
}

// =============================================================================
// Stream Plumbing
// =============================================================================

/// Logs FINISH when an invocation ends, including when its future is dropped
struct FinishLog<'a> {
    logger: &'a CommandLoggerRef,
    tag: String,
}

impl Drop for FinishLog<'_> {
    fn drop(&mut self) {
        self.logger
            .log(&[std::mem::take(&mut self.tag), "FINISH".to_string()]);
    }
}

enum Outcome {
    Finished((io::Result<Vec<u8>>, io::Result<Vec<u8>>, io::Result<ExitStatus>)),
    Cancelled,
    TimedOut,
}

/// Background stdin writer, aborted when dropped
struct FeedTask(JoinHandle<io::Result<()>>);

impl FeedTask {
    /// Result of feeding, if feeding already ended; a still-running feeder
    /// is abandoned because the child no longer reads.
    async fn finish(mut self) -> io::Result<()> {
        if !self.0.is_finished() {
            return Ok(());
        }
        match (&mut self.0).await {
            Ok(result) => result,
            Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
        }
    }
}

impl Drop for FeedTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn feed_stdin(input: Input, mut pipe: ChildStdin) -> io::Result<()> {
    match input {
        Input::Null => {}
        Input::Bytes(bytes) => pipe.write_all(&bytes).await?,
        Input::Reader(mut reader) => {
            tokio::io::copy(&mut reader, &mut pipe).await?;
        }
    }
    pipe.shutdown().await
}

async fn drain_stdout(pipe: Option<ChildStdout>, output: Output) -> io::Result<Vec<u8>> {
    let Some(mut pipe) = pipe else {
        return Ok(Vec::new());
    };

    match output {
        Output::Capture => {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf).await?;
            Ok(buf)
        }
        Output::Sink(mut sink) => {
            tokio::io::copy(&mut pipe, &mut sink).await?;
            sink.shutdown().await?;
            Ok(Vec::new())
        }
    }
}

async fn collect_stderr(pipe: Option<ChildStderr>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

async fn terminate(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        warn!("Failed to kill child process: {}", e);
    }
    if let Err(e) = child.wait().await {
        warn!("Failed to reap child process: {}", e);
    }
}
