use crate::channel::Link;
use crate::command::{Command, Context};
use crate::commands::INDEFINITE;
use crate::error::{Error, Result};
use std::time::Duration;
use tracing::info;

/// The engine that executes commands against one open channel
pub struct Engine {
    ctx: Context,
}

impl Engine {
    /// Create a new engine over an open link
    pub fn new(link: Link, receive_timeout: Duration) -> Self {
        Engine {
            ctx: Context::new(link.writer, link.stream, receive_timeout),
        }
    }

    /// Execute a sequence of commands, stopping at the first failure
    pub async fn execute(&mut self, commands: &[Command]) -> Result<()> {
        for (index, cmd) in commands.iter().enumerate() {
            info!("Executing command {}/{}: {cmd}", index + 1, commands.len());
            cmd.execute(&mut self.ctx).await.map_err(|e| Error::Command {
                index,
                command: cmd.to_string(),
                source: Box::new(e),
            })?;
        }
        Ok(())
    }

    /// Execute `commands` under the session bound.
    ///
    /// The bound is `script_timeout`. When any command is, or contains, a
    /// monitor it is extended by [`INDEFINITE`], so a bare `monitor` started
    /// within `script_timeout` stops on its own before the bound fires.
    pub async fn run(&mut self, commands: &[Command], script_timeout: Duration) -> Result<()> {
        let extended = commands.iter().any(Command::monitors);
        let limit = if extended {
            info!("Extended timeout for monitor commands");
            script_timeout.saturating_add(INDEFINITE)
        } else {
            script_timeout
        };

        match tokio::time::timeout(limit, self.execute(commands)).await {
            Ok(result) => result,
            Err(_) => Err(Error::ScriptTimeout {
                limit: script_timeout,
                extended,
            }),
        }
    }

    /// Session state accumulated so far
    pub fn context(&self) -> &Context {
        &self.ctx
    }
}
