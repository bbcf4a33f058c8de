//! [`Try`] command: runs a try-block from the configuration.
//!
//! Try commands are not written in script bodies; selecting a try-block by
//! name produces one. Its main and except scripts are parsed up front.

use crate::command::{Command, Context, SerialCommand};
use crate::config::TryBlock;
use crate::dry_run::Transcript;
use crate::error::{Error, FailureKind, Result};
use async_trait::async_trait;
use tracing::{info, warn};

/// Runs a main script, retrying once if configured, then falls back to an
/// except script. Fails whenever the main script never succeeded, even if the
/// except script did.
#[derive(Debug, Clone)]
pub struct Try {
    block: TryBlock,
    main: Vec<Command>,
    except: Option<Vec<Command>>,
}

impl Try {
    pub const NAME: &'static str = "try";

    pub fn new(block: TryBlock, main: Vec<Command>, except: Option<Vec<Command>>) -> Self {
        Self {
            block,
            main,
            except,
        }
    }

    pub fn block(&self) -> &TryBlock {
        &self.block
    }

    pub fn main(&self) -> &[Command] {
        &self.main
    }

    pub fn except(&self) -> Option<&[Command]> {
        self.except.as_deref()
    }

    fn attempts(&self) -> u32 {
        if self.block.retry { 2 } else { 1 }
    }

    async fn run_main(&self, ctx: &mut Context) -> Result<()> {
        for (index, cmd) in self.main.iter().enumerate() {
            cmd.execute(ctx).await.map_err(|e| Error::Command {
                index,
                command: cmd.to_string(),
                source: Box::new(e),
            })?;
        }
        Ok(())
    }

    async fn run_except(&self, commands: &[Command], ctx: &mut Context) {
        let name = self.block.except_script().unwrap_or_default();
        info!("TRY: Executing except script {name:?}");
        for cmd in commands {
            if let Err(e) = cmd.execute(ctx).await {
                warn!("TRY: Error in except script: {e}");
            }
        }
        info!("TRY: Except script {name:?} completed");
    }
}

#[async_trait(?Send)]
impl SerialCommand for Try {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(_args: &str) -> Result<Self, String> {
        Err("try blocks are selected by name, not written in scripts".to_string())
    }

    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        let script = &self.block.script;
        let attempts = self.attempts();
        info!(
            "TRY: Executing try block {:?} with script {script:?}",
            self.block.name
        );

        let mut attempt = 1;
        let last_error = loop {
            match self.run_main(ctx).await {
                Ok(()) => {
                    info!("TRY: Script {script:?} completed successfully");
                    return Ok(());
                }
                Err(e) if e.kind() == FailureKind::Channel => return Err(e),
                Err(e) => {
                    warn!("TRY: Script {script:?} failed: {e}");
                    if attempt >= attempts {
                        break e;
                    }
                }
            }
            attempt += 1;
            info!("TRY: Retrying script {script:?} (attempt {attempt}/{attempts})");
        };
        warn!("TRY: All attempts failed for script {script:?}");

        if let Some(except) = &self.except {
            self.run_except(except, ctx).await;
        }

        Err(Error::TryBlockFailed {
            name: self.block.name.clone(),
            except_ran: self.except.is_some(),
            source: Box::new(last_error),
        })
    }

    fn dry_run(&self, transcript: &mut Transcript) -> Result<()> {
        info!(
            "TRY BLOCK: {} (dry run - executing main script only)",
            self.block.name
        );
        for cmd in &self.main {
            match cmd {
                Command::Expect(expect) => {
                    if !expect.scan(transcript) {
                        warn!(
                            "PATTERN NOT FOUND (would trigger except): {}",
                            expect.raw()
                        );
                    }
                }
                other => other.dry_run(transcript)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;

    fn try_cmd(main: &str, except: Option<&str>, retry: bool) -> Try {
        let block = TryBlock {
            name: "guarded".into(),
            script: "main".into(),
            except: except.map(|_| "fallback".to_string()),
            retry,
        };
        Try::new(
            block,
            parse_str(main).unwrap(),
            except.map(|body| parse_str(body).unwrap()),
        )
    }

    #[test]
    fn test_attempts() {
        assert_eq!(try_cmd("send 'a'", None, false).attempts(), 1);
        assert_eq!(try_cmd("send 'a'", None, true).attempts(), 2);
    }

    #[test]
    fn test_parse_is_rejected() {
        assert!(Try::parse("guarded").is_err());
    }

    #[test]
    fn test_dry_run_tolerates_missing_pattern() {
        let cmd = try_cmd("send 'a'\nexpect 'never'\nexpect 'never either'", Some("send 'b'"), false);
        let mut transcript = Transcript::new("one\ntwo\n");
        cmd.dry_run(&mut transcript).unwrap();
        assert_eq!(transcript.outcomes().len(), 2);
        assert!(transcript.outcomes().iter().all(|o| !o.matched));
    }
}
