use crate::pattern::ExpectPattern;

/// Once the rolling buffer grows past this many bytes it is cut back to
/// roughly half, keeping the most recent data.
const ROLLING_LIMIT: usize = 10_000;

/// Per-run state built from the characters the executor has consumed.
#[derive(Debug, Default)]
pub struct SessionState {
    rolling: String,
    /// Lower-cased shadow of `rolling` for case-insensitive matching.
    folded: String,
    line: String,
    lines_seen: u64,
}

impl SessionState {
    /// Append one character. Returns the completed line (without its line
    /// terminator) when `ch` is a newline.
    pub fn push(&mut self, ch: char) -> Option<String> {
        self.rolling.push(ch);
        self.folded.extend(ch.to_lowercase());
        if self.rolling.len() > ROLLING_LIMIT {
            trim_front(&mut self.rolling, ROLLING_LIMIT / 2);
            trim_front(&mut self.folded, ROLLING_LIMIT / 2);
        }

        if ch == '\n' {
            self.lines_seen += 1;
            let line = std::mem::take(&mut self.line);
            Some(line.trim_end_matches(['\r', '\n']).to_string())
        } else {
            self.line.push(ch);
            None
        }
    }

    pub fn matches(&self, pattern: &ExpectPattern) -> bool {
        pattern.matches_folded(&self.folded, &self.line)
    }

    /// Forget everything matched so far.
    pub fn consume(&mut self) {
        self.consume_rolling();
        self.line.clear();
    }

    pub(crate) fn consume_rolling(&mut self) {
        self.rolling.clear();
        self.folded.clear();
    }

    /// Data received since the last match.
    pub fn rolling(&self) -> &str {
        &self.rolling
    }

    /// The line in progress.
    pub fn current_line(&self) -> &str {
        &self.line
    }

    pub fn lines_seen(&self) -> u64 {
        self.lines_seen
    }
}

/// Drop bytes from the front of `s` so that at most about `keep` remain,
/// cutting on a character boundary.
fn trim_front(s: &mut String, keep: usize) {
    let mut cut = s.len().saturating_sub(keep);
    while !s.is_char_boundary(cut) {
        cut += 1;
    }
    s.drain(..cut);
}
