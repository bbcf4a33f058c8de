//! Error types for serial-expect.
//!
//! Every failure a session can end with is an [`Error`]. Wrapping variants add
//! the failing command or script without hiding what went wrong underneath;
//! use [`Error::kind`] to classify a failure.

use std::borrow::Borrow;
use std::time::Duration;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

fn note(flag: impl Borrow<bool>, text: &'static str) -> &'static str {
    if *flag.borrow() { text } else { "" }
}

fn one_based(index: impl Borrow<usize>) -> usize {
    *index.borrow() + 1
}

/// The classification of a session failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Malformed script line, expect pattern or monitor parameter.
    Parse,
    /// Unknown script/try-block name or dangling try-block reference.
    Resolution,
    /// Unreadable or invalid configuration.
    Config,
    /// The byte channel could not be opened or written.
    Channel,
    /// An expect did not match within the receive timeout.
    ReceiveTimeout,
    /// The whole session ran past its bound.
    ScriptTimeout,
    /// Every attempt of a try-block's main script failed.
    TryBlockFailed,
    /// Dry run only: the transcript ran out before a pattern matched.
    PatternNotFound,
}

/// Any error a session might end with.
#[derive(Debug, Error)]
pub enum Error {
    /// A script line could not be parsed.
    #[error("invalid command on line {line}: {content}: {reason}")]
    Parse {
        /// 1-based line number within the script body.
        line: usize,
        /// The offending line, trimmed.
        content: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A script body failed to parse.
    #[error("failed to parse script {script:?}: {source}")]
    Script {
        /// Name of the script.
        script: String,
        /// The underlying parse error.
        #[source]
        source: Box<Error>,
    },

    /// A requested or referenced unit could not be resolved.
    #[error("{0}")]
    Resolution(String),

    /// Configuration problem.
    #[error("configuration error: {0}")]
    Config(String),

    /// The byte channel failed.
    #[error("channel error: {context}: {source}")]
    Channel {
        /// What was being done.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// No match within the receive timeout.
    #[error("receive timeout ({timeout:?}) waiting for pattern: {pattern}")]
    ReceiveTimeout {
        /// The raw pattern as written in the script.
        pattern: String,
        /// The receive timeout in effect.
        timeout: Duration,
    },

    /// The session-level bound elapsed.
    #[error("script timeout exceeded ({limit:?}{})", note(.extended, ", extended for monitor commands"))]
    ScriptTimeout {
        /// The bound that elapsed.
        limit: Duration,
        /// Whether the bound had been extended because of monitor commands.
        extended: bool,
    },

    /// All attempts of a try-block failed.
    #[error("try block {name:?} failed{}: {source}", note(.except_ran, " (except script ran)"))]
    TryBlockFailed {
        /// Try-block name.
        name: String,
        /// Whether an except script was executed.
        except_ran: bool,
        /// The error from the last main-script attempt.
        #[source]
        source: Box<Error>,
    },

    /// Dry run: the transcript was exhausted without a match.
    #[error("pattern not found in remaining input: {pattern}")]
    PatternNotFound {
        /// The raw pattern as written in the script.
        pattern: String,
    },

    /// A command of the flat command sequence failed.
    #[error("command {} ({command}) failed: {source}", one_based(.index))]
    Command {
        /// 0-based index within the executed sequence.
        index: usize,
        /// The command as written.
        command: String,
        /// What went wrong.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Classify this error, looking through wrapping variants.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Parse { .. } => FailureKind::Parse,
            Self::Script { source, .. } | Self::Command { source, .. } => source.kind(),
            Self::Resolution(_) => FailureKind::Resolution,
            Self::Config(_) => FailureKind::Config,
            Self::Channel { .. } => FailureKind::Channel,
            Self::ReceiveTimeout { .. } => FailureKind::ReceiveTimeout,
            Self::ScriptTimeout { .. } => FailureKind::ScriptTimeout,
            Self::TryBlockFailed { .. } => FailureKind::TryBlockFailed,
            Self::PatternNotFound { .. } => FailureKind::PatternNotFound,
        }
    }

    /// The error beneath any [`Error::Command`] / [`Error::Script`] wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Self::Script { source, .. } | Self::Command { source, .. } => source.root(),
            other => other,
        }
    }

    pub(crate) fn channel(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Channel {
            context: context.into(),
            source,
        }
    }
}

/// Why an expect pattern literal was rejected.
#[derive(Debug, Error)]
pub enum PatternError {
    /// Fewer than two characters, so no delimiter pair.
    #[error("pattern too short")]
    TooShort,

    /// First and last characters are not `'…'`, `"…"` or `/…/`.
    #[error("invalid pattern format, expected '...', \"...\" or /.../")]
    UnknownDelimiter,

    /// The `/…/` body is not a valid regular expression.
    #[error("invalid regex: {0}")]
    Regex(#[from] regex::Error),
}

/// A duration literal that could not be parsed.
#[derive(Debug, Error)]
#[error("invalid duration {0:?}")]
pub struct InvalidDuration(pub String);
