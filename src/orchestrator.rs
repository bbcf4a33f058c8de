//! Top-level session runs: configuration in, outcome out.

use crate::channel::Link;
use crate::command::Command;
use crate::config::{Config, Timeouts};
use crate::dry_run::{ExpectOutcome, Transcript, replay};
use crate::engine::Engine;
use crate::error::Result;
use crate::resolver::ScriptBook;
use std::path::PathBuf;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::info;

/// Where a session's commands go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Open the configured serial device.
    Live,
    /// Replay against a captured transcript file.
    DryRun(PathBuf),
}

/// What a successful session produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// Per-expect results of a dry run.
    DryRun(Vec<ExpectOutcome>),
}

/// Resolve `requested` against `config` and run the resulting commands.
pub async fn execute<S: AsRef<str>>(config: &Config, requested: &[S], mode: Mode) -> Result<Outcome> {
    let (commands, timeouts) = prepare(config, requested)?;

    match mode {
        Mode::DryRun(path) => {
            info!("Input file: {}", path.display());
            let mut transcript = Transcript::from_path(&path)?;
            replay(&commands, &mut transcript).map(Outcome::DryRun)
        }
        Mode::Live => {
            let link = Link::open(&config.serial)?;
            Engine::new(link, timeouts.receive)
                .run(&commands, timeouts.script)
                .await?;
            info!("All scripts completed successfully");
            Ok(Outcome::Completed)
        }
    }
}

/// Like [`execute`] in live mode, but over an already-open byte stream
/// instead of the configured serial device.
pub async fn execute_over<S, C>(config: &Config, requested: &[S], channel: C) -> Result<()>
where
    S: AsRef<str>,
    C: AsyncRead + AsyncWrite + Send + 'static,
{
    let (commands, timeouts) = prepare(config, requested)?;
    Engine::new(Link::from_stream(channel), timeouts.receive)
        .run(&commands, timeouts.script)
        .await
}

fn prepare<S: AsRef<str>>(config: &Config, requested: &[S]) -> Result<(Vec<Command>, Timeouts)> {
    let timeouts = config.timeouts()?;
    let book = ScriptBook::new(config)?;
    let units = book.resolve(requested)?;
    let names: Vec<_> = units.iter().map(|unit| unit.name()).collect();
    info!("Executing: {}", names.join(", "));
    info!("Script timeout: {:?}", timeouts.script);
    info!("Receive timeout: {:?}", timeouts.receive);

    let commands = book.compile(&units)?;
    info!("Total commands: {}", commands.len());
    Ok((commands, timeouts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use pretty_assertions::assert_eq;

    const CONFIG: &str = r#"
[[script]]
name = "boot"
body = """
send 'status'
expect 'ready'
"""
"#;

    #[tokio::test]
    async fn test_resolution_fails_before_channel_use() {
        let config: Config = CONFIG.parse().unwrap();
        let err = execute(&config, &["nope"], Mode::Live).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Resolution);
    }

    #[tokio::test]
    async fn test_dry_run_from_file() {
        let config: Config = CONFIG.parse().unwrap();
        let path = std::env::temp_dir().join(format!("serial-expect-orch-{}.txt", std::process::id()));
        std::fs::write(&path, "booting\nsystem ready\n").unwrap();

        let outcome = execute(&config, &["boot"], Mode::DryRun(path.clone())).await;
        let _ = std::fs::remove_file(&path);

        assert_eq!(
            outcome.unwrap(),
            Outcome::DryRun(vec![ExpectOutcome {
                pattern: "'ready'".into(),
                matched: true,
                cursor: 2,
            }])
        );
    }

    #[tokio::test]
    async fn test_missing_transcript_is_config_error() {
        let config: Config = CONFIG.parse().unwrap();
        let mode = Mode::DryRun(PathBuf::from("/nonexistent/serial-expect/transcript"));
        let err = execute(&config, &[] as &[&str], mode).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Config);
    }
}
