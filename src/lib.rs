//! # serial-expect
//!
//! An expect-style scripting engine for driving devices over a serial line.
//!
//! Scripts are sequences of `send`, `expect` and `monitor` commands kept in a
//! TOML configuration together with the serial settings, the timeouts and
//! optional try-blocks that retry a script and fall back to a recovery
//! script. Any script can also be replayed against a captured transcript
//! without touching a device.
//!
//! ## Quick start
//!
//! ```no_run
//! use serial_expect::{Config, Mode, execute};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_path("board.toml")?;
//!     execute(&config, &["login"], Mode::Live).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Parsing scripts
//!
//! Use [`parse_str`] to parse a script body into a `Vec<`[`Command`]`>`. Expect
//! patterns and monitor parameters are checked while parsing, so a script that
//! parses will not fail later on a malformed literal.
//!
//! ## Script syntax
//!
//! | Command | Description |
//! |---------|-------------|
//! | `send 'text'` | Send `text` followed by a carriage return |
//! | `send "a\r\n"` | Send with `\r` and `\n` escapes expanded, no terminator |
//! | `send raw text` | Send the rest of the line verbatim |
//! | `expect 'login'` | Wait for `login` anywhere in the received data, ignoring case |
//! | `expect "root@"` | Wait for a line starting with `root@` (case-sensitive, line trimmed) |
//! | `expect /\d+ packets/` | Wait for a line matching the regular expression |
//! | `monitor` | Log incoming lines until the session ends |
//! | `monitor 5m30s` | Log incoming lines for a duration |
//! | `monitor 50` | Log the next 50 incoming lines |
//!
//! Every `expect` is bounded by the receive timeout and the whole session by
//! the script timeout, which is extended when a monitor is involved.
//!
//! ## Testing without hardware
//!
//! [`execute_over`] runs against any `AsyncRead + AsyncWrite` stream, such as
//! one end of a [`tokio::io::duplex`] pair:
//!
//! ```no_run
//! use serial_expect::{Config, execute_over};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config: Config = r#"
//! [[script]]
//! body = "send 'ping'\nexpect 'pong'"
//! "#
//!     .parse()?;
//!
//!     let (ours, _device) = tokio::io::duplex(1024);
//!     execute_over(&config, &[] as &[&str], ours).await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod command;
pub mod commands;
pub mod config;
pub mod dry_run;
pub mod engine;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod parser;
pub mod pattern;
pub mod resolver;
pub mod session;
pub(crate) mod stream_reader;

pub use channel::Link;
pub use command::{Command, Context, SerialCommand};
pub use commands::{Expect, Monitor, MonitorBound, SendInput, Try};
pub use config::{Config, SerialConfig, Timeouts, TryBlock};
pub use dry_run::{ExpectOutcome, Transcript, replay};
pub use engine::Engine;
pub use error::{Error, FailureKind, Result};
pub use orchestrator::{Mode, Outcome, execute, execute_over};
pub use parser::{parse_duration, parse_str};
pub use pattern::{ExpectPattern, MatchKind};
pub use resolver::{ScriptBook, Unit};
pub use session::SessionState;
