//! [`Expect`] command: blocks until a pattern matches the incoming data.
//!
//! Script syntax:
//! - `expect 'login:'`: case-insensitive, anywhere in the received data
//! - `expect "root@"`: case-sensitive prefix of the trimmed current line
//! - `expect /^\d+ packets/`: regular expression against the current line
//!
//! The wait is bounded by the session's receive timeout.

use crate::command::{Context, SerialCommand};
use crate::dry_run::Transcript;
use crate::error::{Error, Result};
use crate::pattern::ExpectPattern;
use async_trait::async_trait;
use tracing::info;

/// Blocks until `pattern` matches, or until the receive timeout elapses.
#[derive(Debug, Clone)]
pub struct Expect {
    raw: String,
    pub pattern: ExpectPattern,
}

impl Expect {
    pub const NAME: &'static str = "expect";

    /// The pattern as written in the script, delimiters included.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Consume transcript lines until one matches. Returns whether one did.
    pub(crate) fn scan(&self, transcript: &mut Transcript) -> bool {
        info!("EXPECT: {}", self.raw);
        while let Some(line) = transcript.next_line() {
            info!("RX: {line}");
            if self.pattern.matches_line(line) {
                info!("MATCHED: {}", self.raw);
                transcript.record(&self.raw, true);
                return true;
            }
        }
        transcript.record(&self.raw, false);
        false
    }
}

#[async_trait(?Send)]
impl SerialCommand for Expect {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self, String> {
        if args.is_empty() {
            return Err("missing pattern after 'expect'".to_string());
        }
        let pattern = ExpectPattern::compile(args)
            .map_err(|e| format!("invalid expect pattern {args:?}: {e}"))?;
        Ok(Self {
            raw: args.to_string(),
            pattern,
        })
    }

    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        info!("EXPECT: {}", self.raw);
        ctx.wait_for_pattern(&self.pattern, &self.raw).await?;
        info!("MATCHED: {}", self.raw);
        Ok(())
    }

    fn dry_run(&self, transcript: &mut Transcript) -> Result<()> {
        if self.scan(transcript) {
            Ok(())
        } else {
            Err(Error::PatternNotFound {
                pattern: self.raw.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::SerialCommand;
    use crate::pattern::MatchKind;

    #[test]
    fn test_parse_kinds() {
        assert_eq!(
            Expect::parse("'ok'").unwrap().pattern.kind(),
            MatchKind::CaseInsensitiveSubstring
        );
        assert_eq!(
            Expect::parse("\"# \"").unwrap().pattern.kind(),
            MatchKind::CaseSensitiveLinePrefix
        );
        assert_eq!(
            Expect::parse(r"/^\d+$/").unwrap().pattern.kind(),
            MatchKind::Regex
        );
    }

    #[test]
    fn test_parse_keeps_raw() {
        assert_eq!(Expect::parse("'Login: '").unwrap().raw(), "'Login: '");
    }

    #[test]
    fn test_parse_rejects_bad_patterns() {
        assert!(Expect::parse("no_quotes").is_err());
        assert!(Expect::parse("'").is_err());
        assert!(Expect::parse("/[/").is_err());
    }

    #[test]
    fn test_dry_run_advances_past_match() {
        let mut transcript = Transcript::new("boot\nlogin: \nshell\n");
        let cmd = Expect::parse("'LOGIN'").unwrap();
        cmd.dry_run(&mut transcript).unwrap();
        assert_eq!(transcript.next_line(), Some("shell"));
    }

    #[test]
    fn test_dry_run_exhaustion_fails() {
        let mut transcript = Transcript::new("boot\n");
        let err = Expect::parse("'login'").unwrap().dry_run(&mut transcript).unwrap_err();
        assert!(matches!(err, Error::PatternNotFound { .. }));
    }
}
