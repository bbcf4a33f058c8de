//! [`Monitor`] command: logs incoming lines for a while.
//!
//! Script syntax:
//! - `monitor`: until the session ends
//! - `monitor 2m30s`: for a duration
//! - `monitor 50`: until 50 lines have been received

use crate::command::{Context, SerialCommand};
use crate::dry_run::Transcript;
use crate::error::Result;
use crate::parser::parse_duration;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// How long an indefinite monitor runs. Finite so the session stays bounded.
pub const INDEFINITE: Duration = Duration::from_secs(24 * 60 * 60);

/// Lines a dry run shows for each monitor.
pub const DRY_RUN_PREVIEW_LINES: usize = 10;

/// When a monitor stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorBound {
    Indefinite,
    Duration(Duration),
    Lines(u64),
}

/// Logs every completed line until its [`MonitorBound`] is reached.
///
/// A monitor never fails: running out of time is how a timed monitor ends.
#[derive(Debug, Clone)]
pub struct Monitor {
    raw: String,
    pub bound: MonitorBound,
}

impl Monitor {
    pub const NAME: &'static str = "monitor";

    /// The parameter as written in the script; empty for a bare `monitor`.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

#[async_trait(?Send)]
impl SerialCommand for Monitor {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self, String> {
        let bound = if args.is_empty() {
            MonitorBound::Indefinite
        } else if let Ok(duration) = parse_duration(args) {
            MonitorBound::Duration(duration)
        } else if let Ok(lines) = args.parse::<u64>() {
            MonitorBound::Lines(lines)
        } else {
            return Err(format!(
                "invalid monitor parameter {args:?}: must be duration (e.g., 5m30s) or line count (e.g., 50)"
            ));
        };
        Ok(Self {
            raw: args.to_string(),
            bound,
        })
    }

    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        info!("MONITOR: Starting monitoring with parameter: {:?}", self.raw);
        let start = Instant::now();
        let (deadline, max_lines) = match self.bound {
            MonitorBound::Indefinite => {
                info!("MONITOR: Monitoring indefinitely (press Ctrl+C to stop)");
                (start.checked_add(INDEFINITE), None)
            }
            MonitorBound::Duration(duration) => {
                info!("MONITOR: Monitoring for {duration:?}");
                (start.checked_add(duration), None)
            }
            MonitorBound::Lines(lines) => {
                info!("MONITOR: Monitoring for {lines} lines");
                (None, Some(lines))
            }
        };

        let count = ctx.watch_lines(deadline, max_lines).await;
        match max_lines {
            Some(max) => info!("MONITOR: Reached {max} lines, stopping"),
            None => info!(
                "MONITOR: Duration {:?} elapsed, stopping (received {count} lines)",
                start.elapsed()
            ),
        }
        Ok(())
    }

    fn dry_run(&self, transcript: &mut Transcript) -> Result<()> {
        info!(
            "MONITOR: {} (dry run - showing next {DRY_RUN_PREVIEW_LINES} lines)",
            self.raw
        );
        for _ in 0..DRY_RUN_PREVIEW_LINES {
            let Some(line) = transcript.next_line() else {
                break;
            };
            info!("RX: {line}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::SerialCommand;

    #[test]
    fn test_parse_disambiguation() {
        assert_eq!(Monitor::parse("").unwrap().bound, MonitorBound::Indefinite);
        assert_eq!(
            Monitor::parse("2m30s").unwrap().bound,
            MonitorBound::Duration(Duration::from_secs(150))
        );
        assert_eq!(Monitor::parse("10").unwrap().bound, MonitorBound::Lines(10));
        assert_eq!(
            Monitor::parse("0").unwrap().bound,
            MonitorBound::Duration(Duration::ZERO)
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Monitor::parse("soon").is_err());
        assert!(Monitor::parse("-3").is_err());
        assert!(Monitor::parse("5 lines").is_err());
    }

    #[test]
    fn test_dry_run_previews_fixed_count() {
        let text: String = (1..=15).map(|i| format!("line {i}\n")).collect();
        let mut transcript = Transcript::new(&text);
        Monitor::parse("1h").unwrap().dry_run(&mut transcript).unwrap();
        assert_eq!(transcript.next_line(), Some("line 11"));
    }
}
