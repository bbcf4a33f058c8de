//! Dry runs: replaying a command sequence against a captured transcript.
//!
//! Nothing is written anywhere and no time passes; sends are only logged,
//! expects consume transcript lines from a cursor, and monitors show a short
//! preview. The same transcript and commands always give the same outcomes.

use crate::command::Command;
use crate::error::{Error, Result};
use std::path::Path;
use tracing::info;

/// The result of one expect during a dry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectOutcome {
    /// The pattern as written in the script.
    pub pattern: String,
    pub matched: bool,
    /// Transcript cursor after the expect finished.
    pub cursor: usize,
}

/// Captured serial output split into lines, with a read cursor.
#[derive(Debug, Clone)]
pub struct Transcript {
    lines: Vec<String>,
    cursor: usize,
    outcomes: Vec<ExpectOutcome>,
}

impl Transcript {
    pub fn new(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
            cursor: 0,
            outcomes: Vec::new(),
        }
    }

    /// Load a captured log. Invalid UTF-8 becomes U+FFFD, as on a live channel.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| Error::Config(format!("failed to read input file {}: {e}", path.display())))?;
        Ok(Self::new(&String::from_utf8_lossy(&bytes)))
    }

    /// Take the line under the cursor and advance.
    pub fn next_line(&mut self) -> Option<&str> {
        let line = self.lines.get(self.cursor)?;
        self.cursor += 1;
        Some(line)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn outcomes(&self) -> &[ExpectOutcome] {
        &self.outcomes
    }

    pub(crate) fn record(&mut self, pattern: &str, matched: bool) {
        self.outcomes.push(ExpectOutcome {
            pattern: pattern.to_string(),
            matched,
            cursor: self.cursor,
        });
    }
}

/// Replay `commands` against `transcript`.
///
/// A top-level expect that runs out of transcript fails the dry run; inside a
/// try-block the miss is only logged.
pub fn replay(commands: &[Command], transcript: &mut Transcript) -> Result<Vec<ExpectOutcome>> {
    info!("=== DRY RUN MODE ===");
    for (index, cmd) in commands.iter().enumerate() {
        info!("Command {}/{}: {cmd}", index + 1, commands.len());
        cmd.dry_run(transcript).map_err(|e| Error::Command {
            index,
            command: cmd.to_string(),
            source: Box::new(e),
        })?;
    }
    info!("=== DRY RUN COMPLETED ===");
    Ok(transcript.outcomes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::parser::parse_str;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_next_line_advances() {
        let mut transcript = Transcript::new("a\nb");
        assert_eq!(transcript.next_line(), Some("a"));
        assert_eq!(transcript.next_line(), Some("b"));
        assert_eq!(transcript.next_line(), None);
        assert_eq!(transcript.cursor(), 2);
    }

    #[test]
    fn test_replay_records_outcomes() {
        let commands = parse_str("send 'root'\nexpect 'password'\nsend 'secret'\nexpect \"#\"").unwrap();
        let mut transcript = Transcript::new("login: root\nPassword:\nwelcome\n# \n");
        let outcomes = replay(&commands, &mut transcript).unwrap();
        assert_eq!(
            outcomes,
            vec![
                ExpectOutcome {
                    pattern: "'password'".into(),
                    matched: true,
                    cursor: 2,
                },
                ExpectOutcome {
                    pattern: "\"#\"".into(),
                    matched: true,
                    cursor: 4,
                },
            ]
        );
    }

    #[test]
    fn test_from_path_tolerates_invalid_utf8() {
        let path = std::env::temp_dir().join(format!("serial-expect-noise-{}.log", std::process::id()));
        std::fs::write(&path, b"boot \xff\xfe garbage\nsystem ready\n").unwrap();
        let transcript = Transcript::from_path(&path);
        let _ = std::fs::remove_file(&path);

        let mut transcript = transcript.unwrap();
        assert_eq!(transcript.next_line(), Some("boot \u{fffd}\u{fffd} garbage"));

        let commands = parse_str("expect 'ready'").unwrap();
        let outcomes = replay(&commands, &mut transcript).unwrap();
        assert!(outcomes[0].matched);
    }

    #[test]
    fn test_replay_fails_on_exhaustion() {
        let commands = parse_str("expect 'ready'\nexpect 'never'").unwrap();
        let mut transcript = Transcript::new("ready\nother\n");
        let err = replay(&commands, &mut transcript).unwrap_err();
        assert_eq!(err.kind(), FailureKind::PatternNotFound);
        assert!(matches!(err, Error::Command { index: 1, .. }));
    }
}
