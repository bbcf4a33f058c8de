//! [`SendInput`] command: writes bytes to the channel.
//!
//! Script syntax:
//! - `send 'text'`: `text` followed by a carriage return
//! - `send "text"`: `text` as-is, with `\r` and `\n` escapes expanded
//! - `send text`: the argument verbatim

use crate::command::{Context, SerialCommand};
use crate::dry_run::Transcript;
use crate::error::Result;
use crate::pattern::split_delimiters;
use async_trait::async_trait;
use tracing::info;

/// Writes its payload to the channel in one write.
#[derive(Debug, Clone)]
pub struct SendInput {
    raw: String,
    pub data: String,
}

impl SendInput {
    pub const NAME: &'static str = "send";

    /// Create a `SendInput` command from its script argument.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let data = format_payload(&raw);
        Self { raw, data }
    }

    /// The argument as written in the script.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Apply the quoting rules of `send` to its raw argument.
fn format_payload(raw: &str) -> String {
    match split_delimiters(raw) {
        Some((b'\'', text, b'\'')) => format!("{text}\r"),
        Some((b'"', text, b'"')) => text.replace("\\r", "\r").replace("\\n", "\n"),
        _ => raw.to_string(),
    }
}

#[async_trait(?Send)]
impl SerialCommand for SendInput {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &str) -> Result<Self, String> {
        if args.is_empty() {
            return Err("missing value after 'send'".to_string());
        }
        Ok(Self::new(args))
    }

    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        info!("TX: {:?}", self.data);
        ctx.write_to_channel(self.data.as_bytes()).await
    }

    fn dry_run(&self, _transcript: &mut Transcript) -> Result<()> {
        info!("TX: {:?}", self.data);
        Ok(())
    }
}
