//! Scripted command runner for unit tests

use crate::command::{CommandOutput, Input, Invocation, Output, Tool};
use crate::dataset::info::PROPERTY_COLUMNS;
use crate::domain::ports::CommandRunner;
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// Canned outcome for one invocation
#[derive(Debug, Clone)]
pub enum Reply {
    /// Succeed with this captured output
    Stdout(String),
    /// Exit non-zero with this stderr, leaving stdin unread
    Fail(String),
    /// Write these bytes to the stdout sink, then close it
    Stream(Vec<u8>),
    /// Never finish on its own; only cancellation ends it
    Block,
}

/// One recorded invocation
#[derive(Debug, Clone)]
pub struct Call {
    pub tool: Tool,
    pub args: Vec<String>,
    /// Everything read from stdin, if stdin was not null
    pub stdin: Option<Vec<u8>>,
}

/// Runner that replays replies queued per tool and subcommand. A
/// subcommand without a queued reply succeeds with empty output.
#[derive(Default)]
pub struct FakeRunner {
    replies: Mutex<HashMap<(Tool, String), VecDeque<Reply>>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, tool: Tool, subcommand: &str, reply: Reply) {
        self.replies
            .lock()
            .entry((tool, subcommand.to_string()))
            .or_default()
            .push_back(reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call(&self, index: usize) -> Call {
        self.calls.lock()[index].clone()
    }

    /// First recorded call whose subcommand is `subcommand`
    pub fn find(&self, subcommand: &str) -> Option<Call> {
        self.calls
            .lock()
            .iter()
            .find(|call| call.args.first().map(String::as_str) == Some(subcommand))
            .cloned()
    }

    fn next_reply(&self, tool: Tool, args: &[String]) -> Option<Reply> {
        let subcommand = args.first()?.clone();
        self.replies
            .lock()
            .get_mut(&(tool, subcommand))
            .and_then(VecDeque::pop_front)
    }

    fn record(&self, tool: Tool, args: &[String]) -> usize {
        let mut calls = self.calls.lock();
        calls.push(Call {
            tool,
            args: args.to_vec(),
            stdin: None,
        });
        calls.len() - 1
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, cancel: &CancellationToken, invocation: Invocation) -> Result<CommandOutput> {
        let Invocation {
            tool,
            args,
            stdin,
            stdout,
        } = invocation;
        let command = format!("{} {}", tool, args.join(" "));
        let index = self.record(tool, &args);
        let reply = self.next_reply(tool, &args);

        if cancel.is_cancelled() {
            return Err(Error::Cancelled { command });
        }

        match reply {
            Some(Reply::Fail(stderr)) => {
                return Err(Error::Command {
                    command,
                    stderr,
                    reason: "exit status: 1".into(),
                })
            }
            Some(Reply::Block) => {
                cancel.cancelled().await;
                return Err(Error::Cancelled { command });
            }
            _ => {}
        }

        let input = match stdin {
            Input::Null => None,
            Input::Bytes(bytes) => Some(bytes),
            Input::Reader(mut reader) => {
                let mut buf = Vec::new();
                reader
                    .read_to_end(&mut buf)
                    .await
                    .map_err(|source| Error::Stream {
                        command: command.clone(),
                        source,
                    })?;
                Some(buf)
            }
        };
        self.calls.lock()[index].stdin = input;

        match (reply, stdout) {
            (Some(Reply::Stream(bytes)), Output::Sink(mut sink)) => {
                let written: std::io::Result<()> = async {
                    sink.write_all(&bytes).await?;
                    sink.shutdown().await
                }
                .await;
                written.map_err(|source| Error::Stream { command, source })?;
                Ok(CommandOutput::empty())
            }
            (Some(Reply::Stdout(text)), Output::Capture) => Ok(CommandOutput::new(text)),
            _ => Ok(CommandOutput::empty()),
        }
    }
}

/// One `list -Hp` line for a dataset with plausible attributes
pub fn info_line(name: &str) -> String {
    let mut fields = vec![name.to_string()];
    fields.extend(
        ["-", "98304", "1000000", "/mnt", "lz4", "-", "0", "24576", "0", "12800", "24576"]
            .iter()
            .map(|f| f.to_string()),
    );
    debug_assert_eq!(fields.len(), PROPERTY_COLUMNS.len());
    format!("{}\n", fields.join("\t"))
}
