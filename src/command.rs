//! The [`SerialCommand`] trait, the [`Command`] sum type, and the [`Context`]
//! commands receive when executed against a live channel.

use crate::commands::{Expect, Monitor, SendInput, Try};
use crate::dry_run::Transcript;
use crate::error::{Error, Result};
use crate::pattern::ExpectPattern;
use crate::session::SessionState;
use crate::stream_reader::StreamReader;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;
use tracing::{debug, info};

/// Write half of the byte channel.
pub type ChannelWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Execution context passed to [`SerialCommand::execute`].
///
/// Owns the channel writer, the stream reader and the session state for the
/// duration of one run.
pub struct Context {
    pub(crate) writer: ChannelWriter,
    pub(crate) stream: StreamReader,
    pub(crate) session: SessionState,
    pub(crate) receive_timeout: Duration,
}

impl Context {
    pub(crate) fn new(writer: ChannelWriter, stream: StreamReader, receive_timeout: Duration) -> Self {
        Self {
            writer,
            stream,
            session: SessionState::default(),
            receive_timeout,
        }
    }

    /// Write raw bytes to the channel.
    pub async fn write_to_channel(&mut self, data: &[u8]) -> Result<()> {
        self.writer
            .write_all(data)
            .await
            .map_err(|e| Error::channel("failed to send data", e))?;
        self.writer
            .flush()
            .await
            .map_err(|e| Error::channel("failed to flush channel", e))
    }

    /// The receive timeout applied to every expect.
    pub fn receive_timeout(&self) -> Duration {
        self.receive_timeout
    }

    /// Session state accumulated so far.
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Consume characters until `pattern` matches or the receive timeout elapses.
    ///
    /// Once matched, the rolling buffer and current line are consumed so a
    /// following expect does not match the same occurrence again.
    pub async fn wait_for_pattern(&mut self, pattern: &ExpectPattern, raw: &str) -> Result<()> {
        // A timeout too large to represent never expires.
        let deadline = Instant::now().checked_add(self.receive_timeout);
        while let Some(ch) = self.stream.next_char_before(deadline).await {
            if let Some(line) = self.session.push(ch) {
                debug!("RX: {line}");
            }
            if self.session.matches(pattern) {
                self.session.consume();
                return Ok(());
            }
        }
        Err(Error::ReceiveTimeout {
            pattern: raw.to_string(),
            timeout: self.receive_timeout,
        })
    }

    /// Log and count completed lines until `deadline` passes or `max_lines`
    /// lines have been seen. Returns the number of lines seen.
    pub async fn watch_lines(&mut self, deadline: Option<Instant>, max_lines: Option<u64>) -> u64 {
        let first = self.session.lines_seen();
        if max_lines == Some(0) {
            return 0;
        }
        while let Some(ch) = self.stream.next_char_before(deadline).await {
            if let Some(line) = self.session.push(ch) {
                info!("RX: {line}");
                let count = self.session.lines_seen() - first;
                if max_lines.is_some_and(|max| count >= max) {
                    break;
                }
            }
        }
        self.session.consume_rolling();
        self.session.lines_seen() - first
    }
}

/// A single serial-expect script command.
///
/// Implement this trait to add a new command kind. Then:
///
/// 1. Define `pub const NAME: &'static str` on your struct, the script
///    keyword used by the parser.
/// 2. Add a variant to [`Command`] and re-export the struct from
///    `src/commands/mod.rs`.
/// 3. Add one entry to the `REGISTRY` in [`crate::parser`]:
///    `(MyCmd::NAME, MyCmd::parse_command)`.
#[async_trait(?Send)]
pub trait SerialCommand: 'static {
    /// The command name, accessible at runtime.
    fn name(&self) -> &'static str;

    /// Parse this command from the argument string (everything after the
    /// command keyword on the script line).
    fn parse(args: &str) -> Result<Self, String>
    where
        Self: Sized;

    /// Parse and wrap this command. Used as the function-pointer type stored
    /// in the command registry.
    fn parse_command(args: &str) -> Result<Command, String>
    where
        Self: Sized + Into<Command>,
    {
        Ok(Self::parse(args)?.into())
    }

    /// Execute the command against the live channel.
    async fn execute(&self, ctx: &mut Context) -> Result<()>;

    /// Replay the command against a captured transcript instead of a channel.
    fn dry_run(&self, transcript: &mut Transcript) -> Result<()>;
}

/// One parsed instruction.
#[derive(Debug, Clone)]
pub enum Command {
    Send(SendInput),
    Expect(Expect),
    Monitor(Monitor),
    Try(Try),
}

impl Command {
    fn inner(&self) -> &dyn SerialCommand {
        match self {
            Self::Send(cmd) => cmd,
            Self::Expect(cmd) => cmd,
            Self::Monitor(cmd) => cmd,
            Self::Try(cmd) => cmd,
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner().name()
    }

    pub async fn execute(&self, ctx: &mut Context) -> Result<()> {
        self.inner().execute(ctx).await
    }

    pub fn dry_run(&self, transcript: &mut Transcript) -> Result<()> {
        self.inner().dry_run(transcript)
    }

    /// Whether this command is, or a try-block containing, a monitor.
    pub fn monitors(&self) -> bool {
        match self {
            Self::Monitor(_) => true,
            Self::Try(t) => t.main().iter().chain(t.except().unwrap_or_default()).any(Command::monitors),
            _ => false,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Send(cmd) => write!(f, "{} {}", SendInput::NAME, cmd.raw()),
            Self::Expect(cmd) => write!(f, "{} {}", Expect::NAME, cmd.raw()),
            Self::Monitor(cmd) if cmd.raw().is_empty() => f.write_str(Monitor::NAME),
            Self::Monitor(cmd) => write!(f, "{} {}", Monitor::NAME, cmd.raw()),
            Self::Try(cmd) => write!(f, "{} {}", Try::NAME, cmd.block().name),
        }
    }
}

impl From<SendInput> for Command {
    fn from(cmd: SendInput) -> Self {
        Self::Send(cmd)
    }
}

impl From<Expect> for Command {
    fn from(cmd: Expect) -> Self {
        Self::Expect(cmd)
    }
}

impl From<Monitor> for Command {
    fn from(cmd: Monitor) -> Self {
        Self::Monitor(cmd)
    }
}

impl From<Try> for Command {
    fn from(cmd: Try) -> Self {
        Self::Try(cmd)
    }
}
