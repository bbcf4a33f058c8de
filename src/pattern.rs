//! Expect patterns.
//!
//! The delimiters around an `expect` argument select how it is matched:
//!
//! | Literal | Match |
//! |---------|-------|
//! | `'text'` | case-insensitive, anywhere in the data received so far |
//! | `"text"` | case-sensitive prefix of the current line (whitespace-trimmed) |
//! | `/regex/` | regular expression against the current line |

use crate::error::PatternError;
use regex::Regex;

/// How an [`ExpectPattern`] is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    CaseInsensitiveSubstring,
    CaseSensitiveLinePrefix,
    Regex,
}

#[derive(Debug, Clone)]
enum Matcher {
    /// Needle stored lower-cased.
    Substring(String),
    LinePrefix(String),
    Regex(Regex),
}

/// A compiled `expect` argument.
#[derive(Debug, Clone)]
pub struct ExpectPattern {
    text: String,
    matcher: Matcher,
}

impl ExpectPattern {
    /// Compile a delimited pattern literal such as `'login:'`, `"#"` or `/^\d+$/`.
    pub fn compile(raw: &str) -> Result<Self, PatternError> {
        let (open, text, close) = split_delimiters(raw).ok_or(PatternError::TooShort)?;
        let matcher = match (open, close) {
            (b'\'', b'\'') => Matcher::Substring(text.to_lowercase()),
            (b'"', b'"') => Matcher::LinePrefix(text.to_string()),
            (b'/', b'/') => Matcher::Regex(Regex::new(text)?),
            _ => return Err(PatternError::UnknownDelimiter),
        };
        Ok(Self {
            text: text.to_string(),
            matcher,
        })
    }

    pub fn kind(&self) -> MatchKind {
        match self.matcher {
            Matcher::Substring(_) => MatchKind::CaseInsensitiveSubstring,
            Matcher::LinePrefix(_) => MatchKind::CaseSensitiveLinePrefix,
            Matcher::Regex(_) => MatchKind::Regex,
        }
    }

    /// The pattern text with its delimiters stripped.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Evaluate against the data received so far and the line in progress.
    pub fn matches(&self, rolling: &str, current_line: &str) -> bool {
        match &self.matcher {
            Matcher::Substring(_) => self.matches_folded(&rolling.to_lowercase(), current_line),
            _ => self.matches_folded(rolling, current_line),
        }
    }

    /// Like [`matches`](Self::matches), but `folded` must already be lower-cased.
    pub(crate) fn matches_folded(&self, folded: &str, current_line: &str) -> bool {
        match &self.matcher {
            Matcher::Substring(needle) => folded.contains(needle.as_str()),
            Matcher::LinePrefix(prefix) => current_line.trim().starts_with(prefix.as_str()),
            Matcher::Regex(re) => re.is_match(current_line),
        }
    }

    /// Evaluate against one complete line, as dry runs do.
    pub fn matches_line(&self, line: &str) -> bool {
        self.matches(line, line)
    }
}

/// Split `raw` into its first byte, inner text and last byte.
///
/// Returns `None` when there are fewer than two bytes, or when the outer bytes
/// are not ASCII (and so cannot be delimiters).
pub(crate) fn split_delimiters(raw: &str) -> Option<(u8, &str, u8)> {
    let bytes = raw.as_bytes();
    if bytes.len() < 2 {
        return None;
    }
    let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
    if !first.is_ascii() || !last.is_ascii() {
        return Some((0, raw, 0));
    }
    Some((first, &raw[1..raw.len() - 1], last))
}
